//! Command-line surface.
//!
//! Every mutating subcommand loads the document, applies one store
//! operation and saves it straight away.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use crate::config::{
    ConfigPaths, ConfigStore, LogLevel, ModelRef, PathOverrides, Provider, ProviderTransformer,
    RouterSlot, SettingsUpdate, TransformerConfig,
};
use crate::models::ModelFetcher;
use crate::restart::RouterProcess;

/// Edit the claude-code-router configuration and restart the router.
#[derive(Parser, Debug)]
#[command(name = "ccr-manager")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Router config file (default: ~/.claude-code-router/config.json).
    #[arg(long = "config", env = "CCR_CONFIG_PATH", value_name = "PATH", global = true)]
    pub config: Option<String>,

    /// Claude settings file (default: ~/.claude/settings.json).
    #[arg(long = "settings", env = "CCR_SETTINGS_PATH", value_name = "PATH", global = true)]
    pub settings: Option<String>,

    /// Timeout for model listing requests, in seconds.
    #[arg(long, env = "CCR_FETCH_TIMEOUT_SECS", default_value_t = 5, global = true)]
    pub fetch_timeout_secs: u64,

    /// Timeout for `ccr restart`, in seconds.
    #[arg(long, env = "CCR_RESTART_TIMEOUT_SECS", default_value_t = 30, global = true)]
    pub restart_timeout_secs: u64,

    /// Increase log verbosity (-v info, -vv debug).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the whole configuration.
    Show,
    /// Print the resolved file locations.
    Paths,
    /// Manage providers.
    Provider {
        #[command(subcommand)]
        action: ProviderCommand,
    },
    /// Manage router slot assignments.
    Router {
        #[command(subcommand)]
        action: RouterCommand,
    },
    /// Manage the global transformer list.
    Transformer {
        #[command(subcommand)]
        action: TransformerCommand,
    },
    /// Show or change scalar settings.
    Settings(SettingsArgs),
    /// Restart the router (`ccr restart`).
    Restart,
}

#[derive(Subcommand, Debug)]
pub enum ProviderCommand {
    /// List providers with their index.
    List,
    /// Add a provider.
    Add(ProviderArgs),
    /// Replace fields of the provider at INDEX.
    Update {
        index: usize,
        #[command(flatten)]
        changes: ProviderUpdateArgs,
    },
    /// Remove a provider by name.
    Remove { name: String },
    /// List the models a provider serves.
    Models {
        name: String,
        /// Append the fetched models to the provider's model list.
        #[arg(long)]
        merge: bool,
    },
}

#[derive(clap::Args, Debug)]
pub struct ProviderArgs {
    pub name: String,
    #[arg(long)]
    pub api_base_url: String,
    #[arg(long, default_value = "")]
    pub api_key: String,
    /// Models listing path, relative to the base URL's origin.
    #[arg(long)]
    pub models_endpoint: Option<String>,
    /// Model names (repeatable or comma-separated).
    #[arg(long = "model", value_delimiter = ',')]
    pub models: Vec<String>,
    /// Transformer block as JSON.
    #[arg(long)]
    pub transformer: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ProviderUpdateArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub api_base_url: Option<String>,
    #[arg(long)]
    pub api_key: Option<String>,
    /// Empty string clears the override.
    #[arg(long)]
    pub models_endpoint: Option<String>,
    /// Replaces the model list.
    #[arg(long = "model", value_delimiter = ',')]
    pub models: Option<Vec<String>>,
    /// Transformer block as JSON; `null` clears it.
    #[arg(long)]
    pub transformer: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum RouterCommand {
    /// Print every slot.
    Show,
    /// Assign `provider,model` to SLOT, or clear it when MODEL is omitted.
    Set { slot: String, model: Option<String> },
    /// Set the long-context token threshold.
    Threshold { value: u64 },
}

#[derive(Subcommand, Debug)]
pub enum TransformerCommand {
    /// List transformers with their index.
    List,
    /// Append a transformer.
    Add {
        path: String,
        /// Options object as JSON.
        #[arg(long)]
        options: Option<String>,
    },
    /// Replace the transformer at INDEX.
    Update {
        index: usize,
        path: String,
        #[arg(long)]
        options: Option<String>,
    },
    /// Remove the transformer at INDEX.
    Remove { index: usize },
}

#[derive(clap::Args, Debug)]
pub struct SettingsArgs {
    #[arg(long)]
    pub log: Option<bool>,
    #[arg(long)]
    pub log_level: Option<LogLevel>,
    #[arg(long)]
    pub host: Option<String>,
    #[arg(long)]
    pub port: Option<u16>,
    #[arg(long)]
    pub api_key: Option<String>,
    #[arg(long)]
    pub api_timeout_ms: Option<u64>,
    /// Empty string clears it.
    #[arg(long)]
    pub proxy_url: Option<String>,
    /// Empty string clears it.
    #[arg(long)]
    pub claude_path: Option<String>,
    /// Empty string clears it.
    #[arg(long)]
    pub custom_router_path: Option<String>,
}

impl From<SettingsArgs> for SettingsUpdate {
    fn from(args: SettingsArgs) -> Self {
        Self {
            log: args.log,
            log_level: args.log_level,
            host: args.host,
            port: args.port,
            api_key: args.api_key,
            api_timeout_ms: args.api_timeout_ms,
            proxy_url: args.proxy_url,
            claude_path: args.claude_path,
            custom_router_path: args.custom_router_path,
        }
    }
}

impl Cli {
    pub fn paths(&self) -> ConfigPaths {
        ConfigPaths::resolve(&PathOverrides {
            config_file: self.config.clone(),
            settings_file: self.settings.clone(),
        })
    }
}

/// Execute a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let paths = cli.paths();
    let fetcher = ModelFetcher::with_timeout(Duration::from_secs(cli.fetch_timeout_secs));
    let process = RouterProcess::new().timeout(Duration::from_secs(cli.restart_timeout_secs));

    if matches!(cli.command, Commands::Paths) {
        print_paths(&paths);
        return Ok(());
    }
    if matches!(cli.command, Commands::Restart) {
        let report = process.restart().await?;
        println!("{}", report.message());
        return Ok(());
    }

    let config_path = paths.config_file.display().to_string();
    let mut store = ConfigStore::new(paths);
    store
        .load()
        .with_context(|| format!("Failed to load {}", config_path))?;

    match cli.command {
        Commands::Show => {
            let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
            print!("{}", config.to_json_pretty()?);
        }
        Commands::Provider { action } => run_provider(&mut store, &fetcher, action).await?,
        Commands::Router { action } => run_router(&mut store, action)?,
        Commands::Transformer { action } => run_transformer(&mut store, action)?,
        Commands::Settings(args) => {
            let update = SettingsUpdate::from(args);
            if update.is_empty() {
                print_settings(&store)?;
            } else {
                store.update_settings(update)?;
                store.save()?;
            }
        }
        Commands::Paths | Commands::Restart => {}
    }

    Ok(())
}

async fn run_provider(
    store: &mut ConfigStore,
    fetcher: &ModelFetcher,
    action: ProviderCommand,
) -> Result<()> {
    match action {
        ProviderCommand::List => {
            let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
            for (index, provider) in config.providers.iter().enumerate() {
                println!(
                    "{}: {} {} [{}]",
                    index,
                    provider.name,
                    provider.api_base_url,
                    provider.models.join(", ")
                );
            }
        }
        ProviderCommand::Add(args) => {
            let provider = Provider {
                name: args.name,
                api_base_url: args.api_base_url,
                api_key: args.api_key,
                models_endpoint: args.models_endpoint.filter(|e| !e.is_empty()),
                models: args.models,
                transformer: args
                    .transformer
                    .as_deref()
                    .map(parse_transformer)
                    .transpose()?
                    .flatten(),
            };
            let name = provider.name.clone();
            store.add_provider(provider)?;
            store.save()?;
            println!("Added provider '{}'", name);
        }
        ProviderCommand::Update { index, changes } => {
            let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
            let Some(current) = config.providers.get(index) else {
                bail!("No provider at index {}", index);
            };
            let provider = apply_provider_changes(current.clone(), changes)?;
            store.update_provider(index, provider)?;
            store.save()?;
        }
        ProviderCommand::Remove { name } => {
            if store.remove_provider(&name)? {
                store.save()?;
                println!("Removed provider '{}'", name);
            } else {
                eprintln!("No provider named '{}'", name);
            }
        }
        ProviderCommand::Models { name, merge } => {
            let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
            let provider = config
                .provider(&name)
                .ok_or_else(|| anyhow!("No provider named '{}'", name))?;
            let models = fetcher.fetch_for(provider).await?;

            for model in &models {
                println!("{}", model);
            }
            if merge {
                let added = store.merge_provider_models(&name, &models)?.unwrap_or(0);
                store.save()?;
                println!("Added {} model(s) to '{}'", added, name);
            }
        }
    }
    Ok(())
}

fn apply_provider_changes(mut provider: Provider, changes: ProviderUpdateArgs) -> Result<Provider> {
    if let Some(name) = changes.name {
        provider.name = name;
    }
    if let Some(url) = changes.api_base_url {
        provider.api_base_url = url;
    }
    if let Some(key) = changes.api_key {
        provider.api_key = key;
    }
    if let Some(endpoint) = changes.models_endpoint {
        provider.models_endpoint = Some(endpoint).filter(|e| !e.is_empty());
    }
    if let Some(models) = changes.models {
        provider.models = models;
    }
    if let Some(raw) = changes.transformer {
        provider.transformer = parse_transformer(&raw)?;
    }
    Ok(provider)
}

fn run_router(store: &mut ConfigStore, action: RouterCommand) -> Result<()> {
    match action {
        RouterCommand::Show => {
            let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
            for slot in RouterSlot::all() {
                let value = config
                    .router
                    .slot(*slot)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                println!("{}: {}", slot, value);
            }
            println!("longContextThreshold: {}", config.router.long_context_threshold);
        }
        RouterCommand::Set { slot, model } => {
            let Some(slot) = RouterSlot::parse(&slot) else {
                eprintln!("Unknown router slot '{}', nothing changed", slot);
                return Ok(());
            };
            let model = model
                .filter(|m| !m.is_empty())
                .map(|m| m.parse::<ModelRef>())
                .transpose()?;
            store.update_router_slot(slot, model)?;
            store.save()?;
        }
        RouterCommand::Threshold { value } => {
            store.set_long_context_threshold(value)?;
            store.save()?;
        }
    }
    Ok(())
}

fn run_transformer(store: &mut ConfigStore, action: TransformerCommand) -> Result<()> {
    match action {
        TransformerCommand::List => {
            let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
            for (index, transformer) in config.transformers.iter().enumerate() {
                match &transformer.options {
                    Some(options) => println!(
                        "{}: {} {}",
                        index,
                        transformer.path,
                        Value::Object(options.clone())
                    ),
                    None => println!("{}: {}", index, transformer.path),
                }
            }
        }
        TransformerCommand::Add { path, options } => {
            let transformer = TransformerConfig {
                path,
                options: options.as_deref().map(parse_options).transpose()?,
            };
            store.add_transformer(transformer)?;
            store.save()?;
        }
        TransformerCommand::Update {
            index,
            path,
            options,
        } => {
            let transformer = TransformerConfig {
                path,
                options: options.as_deref().map(parse_options).transpose()?,
            };
            if !store.update_transformer(index, transformer)? {
                bail!("No transformer at index {}", index);
            }
            store.save()?;
        }
        TransformerCommand::Remove { index } => {
            if store.remove_transformer(index)?.is_none() {
                bail!("No transformer at index {}", index);
            }
            store.save()?;
        }
    }
    Ok(())
}

fn parse_transformer(raw: &str) -> Result<Option<ProviderTransformer>> {
    serde_json::from_str(raw).context("Invalid transformer JSON")
}

fn parse_options(raw: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(raw).context("Transformer options must be a JSON object")
}

fn print_paths(paths: &ConfigPaths) {
    println!(
        "config: {} ({})",
        paths.config_file.display(),
        exists_label(paths.config_file.is_file())
    );
    println!(
        "settings: {} ({})",
        paths.settings_file.display(),
        exists_label(paths.settings_file_exists())
    );
}

fn exists_label(exists: bool) -> &'static str {
    if exists {
        "exists"
    } else {
        "missing"
    }
}

fn print_settings(store: &ConfigStore) -> Result<()> {
    let config = store.current().ok_or_else(|| anyhow!("No configuration loaded"))?;
    println!("LOG: {}", config.log);
    println!("LOG_LEVEL: {}", config.log_level);
    println!("HOST: {}", config.host);
    println!("PORT: {}", config.port);
    println!("APIKEY: {}", mask(&config.api_key));
    println!("API_TIMEOUT_MS: {}", config.api_timeout_ms);
    println!("PROXY_URL: {}", config.proxy_url.as_deref().unwrap_or(""));
    println!("CLAUDE_PATH: {}", config.claude_path.as_deref().unwrap_or(""));
    println!(
        "CUSTOM_ROUTER_PATH: {}",
        config.custom_router_path.as_deref().unwrap_or("")
    );
    Ok(())
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        ""
    } else {
        "••••••••"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_provider_add() {
        let cli = Cli::try_parse_from([
            "ccr-manager",
            "provider",
            "add",
            "deepseek",
            "--api-base-url",
            "https://api.deepseek.com/chat/completions",
            "--api-key",
            "sk-1",
            "--model",
            "deepseek-chat,deepseek-reasoner",
        ])
        .unwrap();

        match cli.command {
            Commands::Provider {
                action: ProviderCommand::Add(args),
            } => {
                assert_eq!(args.name, "deepseek");
                assert_eq!(args.models, vec!["deepseek-chat", "deepseek-reasoner"]);
                assert!(args.transformer.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn parses_settings_flags() {
        let cli = Cli::try_parse_from([
            "ccr-manager",
            "settings",
            "--log",
            "true",
            "--log-level",
            "warn",
            "--port",
            "4000",
        ])
        .unwrap();

        let Commands::Settings(args) = cli.command else {
            panic!("expected settings command");
        };
        let update = SettingsUpdate::from(args);
        assert_eq!(update.log, Some(true));
        assert_eq!(update.log_level, Some(LogLevel::Warn));
        assert_eq!(update.port, Some(4000));
        assert!(update.host.is_none());
    }

    #[test]
    fn rejects_unknown_log_level() {
        let result = Cli::try_parse_from(["ccr-manager", "settings", "--log-level", "loud"]);
        assert!(result.is_err());
    }

    #[test]
    fn provider_update_keeps_unspecified_fields() {
        let mut current = Provider::new("a", "https://a.example.com");
        current.api_key = "old".into();
        current.models = vec!["m1".into()];

        let changes = ProviderUpdateArgs {
            name: None,
            api_base_url: None,
            api_key: Some("new".into()),
            models_endpoint: None,
            models: None,
            transformer: Some(r#"{"use":["openrouter"]}"#.into()),
        };
        let updated = apply_provider_changes(current, changes).unwrap();

        assert_eq!(updated.name, "a");
        assert_eq!(updated.api_key, "new");
        assert_eq!(updated.models, vec!["m1"]);
        assert_eq!(updated.transformer.unwrap().uses.len(), 1);
    }

    #[test]
    fn null_transformer_clears_block() {
        assert!(parse_transformer("null").unwrap().is_none());
        assert!(parse_transformer("[1]").is_err());
    }
}
