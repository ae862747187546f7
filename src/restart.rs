//! Restarting the router through its CLI.

use std::io;
use std::process::Stdio;
use std::time::Duration;

use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;

/// Upper bound on how long `ccr restart` may take.
pub const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_secs(30);

/// Failure classes for a restart attempt.
///
/// `Display` is the message shown to the user.
#[derive(Debug, Error)]
pub enum RestartError {
    #[error("Command '{program}' not found. Install it with `npm install -g @musistudio/claude-code-router`")]
    CommandNotFound { program: String },

    #[error("Restart timed out after {}s", .duration.as_secs())]
    TimedOut { duration: Duration },

    #[error("Restart failed ({}): {}", exit_label(.code), .stderr.trim())]
    Failed { code: Option<i32>, stderr: String },

    #[error("Failed to run '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

fn exit_label(code: &Option<i32>) -> String {
    match *code {
        Some(code) => format!("exit code {}", code),
        None => "terminated by signal".to_string(),
    }
}

/// Output captured from a successful restart.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RestartReport {
    pub stdout: String,
    pub stderr: String,
}

impl RestartReport {
    pub fn message(&self) -> String {
        let out = self.stdout.trim();
        if out.is_empty() {
            "Router restarted".to_string()
        } else {
            format!("Router restarted: {}", out)
        }
    }
}

/// Exit status `cmd.exe` reports when it cannot resolve a command.
const CMD_NOT_FOUND_EXIT: i32 = 9009;

/// Runs the router's restart command.
#[derive(Debug, Clone)]
pub struct RouterProcess {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl RouterProcess {
    /// `ccr restart` with the default timeout.
    ///
    /// On Windows npm installs `ccr` as a `.cmd` shim, which only resolves
    /// through `cmd /C`.
    pub fn new() -> Self {
        if cfg!(windows) {
            Self::with_command("cmd", ["/C", "ccr", "restart"])
        } else {
            Self::with_command("ccr", ["restart"])
        }
    }

    pub fn with_command<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            timeout: DEFAULT_RESTART_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Human-readable form of the command line.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Run the command in the current directory and wait for it.
    ///
    /// The child is killed if the timeout fires.
    pub async fn restart(&self) -> Result<RestartReport, RestartError> {
        tracing::info!(command = %self.command_line(), "Restarting router");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let output = match timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| self.spawn_error(e))?,
            Err(_) => {
                tracing::warn!(command = %self.command_line(), "Router restart timed out");
                return Err(RestartError::TimedOut {
                    duration: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if cfg!(windows) && output.status.code() == Some(CMD_NOT_FOUND_EXIT) {
            return Err(RestartError::CommandNotFound {
                program: self.invoked_program().to_string(),
            });
        }
        if !output.status.success() {
            tracing::warn!(status = ?output.status.code(), stderr = %stderr.trim(), "Router restart failed");
            return Err(RestartError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        tracing::info!("Router restarted");
        Ok(RestartReport { stdout, stderr })
    }

    /// The program behind a leading `cmd /C`, or the program itself.
    fn invoked_program(&self) -> &str {
        match self.args.as_slice() {
            [flag, program, ..]
                if self.program.eq_ignore_ascii_case("cmd") && flag.eq_ignore_ascii_case("/C") =>
            {
                program.as_str()
            }
            _ => self.program.as_str(),
        }
    }

    fn spawn_error(&self, source: io::Error) -> RestartError {
        if source.kind() == io::ErrorKind::NotFound {
            RestartError::CommandNotFound {
                program: self.program.clone(),
            }
        } else {
            RestartError::Spawn {
                program: self.program.clone(),
                source,
            }
        }
    }
}

impl Default for RouterProcess {
    fn default() -> Self {
        Self::new()
    }
}
