//! Location of the router configuration and the companion settings file.
//!
//! Resolution never touches the filesystem.

use std::path::{Path, PathBuf};

/// User-supplied path overrides. Empty strings count as unset.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub config_file: Option<String>,
    pub settings_file: Option<String>,
}

/// Resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    /// Router configuration (`config.json`).
    pub config_file: PathBuf,
    /// Claude settings file; only its location and existence matter here.
    pub settings_file: PathBuf,
}

impl ConfigPaths {
    /// Resolves both paths against the current user's home directory.
    pub fn resolve(overrides: &PathOverrides) -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::resolve_with_home(overrides, &home)
    }

    /// Resolves both paths against an explicit home directory.
    pub fn resolve_with_home(overrides: &PathOverrides, home: &Path) -> Self {
        let config_file = resolve_one(overrides.config_file.as_deref(), home, || {
            home.join(".claude-code-router").join("config.json")
        });
        let settings_file = resolve_one(overrides.settings_file.as_deref(), home, || {
            home.join(".claude").join("settings.json")
        });
        Self {
            config_file,
            settings_file,
        }
    }

    /// Paths for a config file at an explicit location, with the default
    /// settings file.
    pub fn for_config_file(path: impl Into<PathBuf>) -> Self {
        let mut paths = Self::resolve(&PathOverrides::default());
        paths.config_file = path.into();
        paths
    }

    pub fn settings_file_exists(&self) -> bool {
        self.settings_file.is_file()
    }
}

fn resolve_one(value: Option<&str>, home: &Path, default: impl FnOnce() -> PathBuf) -> PathBuf {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(v) => expand_home(v, home),
        None => default(),
    }
}

fn expand_home(value: &str, home: &Path) -> PathBuf {
    if value == "~" {
        return home.to_path_buf();
    }
    match value
        .strip_prefix("~/")
        .or_else(|| value.strip_prefix("~\\"))
    {
        Some(rest) => home.join(rest),
        None => PathBuf::from(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn home() -> PathBuf {
        PathBuf::from("/home/tester")
    }

    #[test]
    fn defaults_live_under_home() {
        let paths = ConfigPaths::resolve_with_home(&PathOverrides::default(), &home());
        assert_eq!(
            paths.config_file,
            PathBuf::from("/home/tester/.claude-code-router/config.json")
        );
        assert_eq!(
            paths.settings_file,
            PathBuf::from("/home/tester/.claude/settings.json")
        );
    }

    #[test]
    fn overrides_win() {
        let overrides = PathOverrides {
            config_file: Some("/etc/ccr/config.json".into()),
            settings_file: Some("~/custom/settings.json".into()),
        };
        let paths = ConfigPaths::resolve_with_home(&overrides, &home());
        assert_eq!(paths.config_file, PathBuf::from("/etc/ccr/config.json"));
        assert_eq!(
            paths.settings_file,
            PathBuf::from("/home/tester/custom/settings.json")
        );
    }

    #[test]
    fn blank_override_falls_back() {
        let overrides = PathOverrides {
            config_file: Some("   ".into()),
            settings_file: None,
        };
        let paths = ConfigPaths::resolve_with_home(&overrides, &home());
        assert!(paths.config_file.ends_with(".claude-code-router/config.json"));
    }

    #[test]
    fn resolution_does_not_create_files() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let paths = ConfigPaths::resolve_with_home(&PathOverrides::default(), temp_dir.path());
        assert!(!paths.config_file.exists());
        assert!(!paths.settings_file_exists());
        assert!(!temp_dir.path().join(".claude-code-router").exists());
    }
}
