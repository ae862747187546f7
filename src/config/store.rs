//! Configuration store.
//!
//! Owns the loaded router configuration and every mutation of it. The store
//! is constructed once and passed by reference to whoever edits the
//! document; nothing else holds a copy that can be written back.
//!
//! Mutations only change the in-memory document. Callers persist with
//! [`ConfigStore::save`] after each mutation.

use thiserror::Error;

use crate::config::loader::ConfigError;
use crate::config::model_ref::{ModelRef, ModelRefError, RouterSlot, MODEL_REF_SEPARATOR};
use crate::config::paths::ConfigPaths;
use crate::config::transformer::TransformerConfig;
use crate::config::types::{Config, LogLevel, Provider};

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("No configuration loaded")]
    NotLoaded,

    #[error("Provider '{name}' already exists")]
    DuplicateProvider { name: String },

    #[error("Invalid provider: {reason}")]
    InvalidProvider { reason: String },

    #[error(transparent)]
    InvalidModelRef(#[from] ModelRefError),
}

/// Load state of the document.
#[derive(Debug, Clone, PartialEq)]
enum DocumentState {
    Unloaded,
    Loaded(Config),
}

/// Partial update of the scalar settings. `None` leaves a field unchanged.
///
/// For the optional path/URL settings, `Some(String::new())` clears the field.
#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub log: Option<bool>,
    pub log_level: Option<LogLevel>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub api_key: Option<String>,
    pub api_timeout_ms: Option<u64>,
    pub proxy_url: Option<String>,
    pub claude_path: Option<String>,
    pub custom_router_path: Option<String>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        self.log.is_none()
            && self.log_level.is_none()
            && self.host.is_none()
            && self.port.is_none()
            && self.api_key.is_none()
            && self.api_timeout_ms.is_none()
            && self.proxy_url.is_none()
            && self.claude_path.is_none()
            && self.custom_router_path.is_none()
    }

    fn apply(self, config: &mut Config) {
        if let Some(log) = self.log {
            config.log = log;
        }
        if let Some(level) = self.log_level {
            config.log_level = level;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(key) = self.api_key {
            config.api_key = key;
        }
        if let Some(ms) = self.api_timeout_ms {
            config.api_timeout_ms = ms.to_string();
        }
        if let Some(url) = self.proxy_url {
            config.proxy_url = non_empty(url);
        }
        if let Some(path) = self.claude_path {
            config.claude_path = non_empty(path);
        }
        if let Some(path) = self.custom_router_path {
            config.custom_router_path = non_empty(path);
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Single authority for reading, mutating and persisting the configuration.
#[derive(Debug)]
pub struct ConfigStore {
    paths: ConfigPaths,
    state: DocumentState,
}

impl ConfigStore {
    /// Create an unloaded store for the given paths.
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            state: DocumentState::Unloaded,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self.state, DocumentState::Loaded(_))
    }

    /// The current document, if loaded.
    pub fn current(&self) -> Option<&Config> {
        match &self.state {
            DocumentState::Loaded(config) => Some(config),
            DocumentState::Unloaded => None,
        }
    }

    /// Load (or reload) the document from disk.
    ///
    /// A missing file is replaced by the default document, which is written
    /// to disk before this returns. On any error the previous state is kept.
    pub fn load(&mut self) -> Result<&Config, StoreError> {
        let path = &self.paths.config_file;
        let config = match Config::load_from(path)? {
            Some(config) => {
                tracing::debug!(path = %path.display(), "Loaded router config");
                config
            }
            None => {
                let config = Config::default();
                config.save_to(path)?;
                tracing::info!(path = %path.display(), "Created default router config");
                config
            }
        };

        self.state = DocumentState::Loaded(config);
        self.document()
    }

    /// Write the whole document back to disk.
    pub fn save(&self) -> Result<(), StoreError> {
        let config = self.document()?;
        config.save_to(&self.paths.config_file)?;
        tracing::debug!(path = %self.paths.config_file.display(), "Saved router config");
        Ok(())
    }

    /// Append a provider. Names must be unique (exact, case-sensitive).
    pub fn add_provider(&mut self, provider: Provider) -> Result<(), StoreError> {
        validate_provider(&provider)?;
        let config = self.document_mut()?;

        if config.provider_index(&provider.name).is_some() {
            return Err(StoreError::DuplicateProvider {
                name: provider.name,
            });
        }

        tracing::info!(provider = %provider.name, "Provider added");
        config.providers.push(provider);
        Ok(())
    }

    /// Replace the provider at `index`.
    ///
    /// Returns `Ok(false)` if `index` is out of range. Renaming onto the name
    /// of a different provider is rejected.
    pub fn update_provider(&mut self, index: usize, provider: Provider) -> Result<bool, StoreError> {
        validate_provider(&provider)?;
        let config = self.document_mut()?;

        if index >= config.providers.len() {
            return Ok(false);
        }

        let collides = config
            .providers
            .iter()
            .enumerate()
            .any(|(i, p)| i != index && p.name == provider.name);
        if collides {
            return Err(StoreError::DuplicateProvider {
                name: provider.name,
            });
        }

        tracing::info!(index, provider = %provider.name, "Provider updated");
        config.providers[index] = provider;
        Ok(true)
    }

    /// Remove every provider named exactly `name`. Returns whether any was removed.
    pub fn remove_provider(&mut self, name: &str) -> Result<bool, StoreError> {
        let config = self.document_mut()?;
        let before = config.providers.len();
        config.providers.retain(|p| p.name != name);
        let removed = config.providers.len() != before;

        if removed {
            tracing::info!(provider = %name, "Provider removed");
        }
        Ok(removed)
    }

    /// Append fetched model names the provider does not list yet.
    ///
    /// Returns the number of models added, or `Ok(None)` if no provider is
    /// named `name`.
    pub fn merge_provider_models(
        &mut self,
        name: &str,
        models: &[String],
    ) -> Result<Option<usize>, StoreError> {
        let config = self.document_mut()?;
        let Some(provider) = config.providers.iter_mut().find(|p| p.name == name) else {
            return Ok(None);
        };

        let mut added = 0;
        for model in models {
            if model.is_empty() || provider.models.contains(model) {
                continue;
            }
            if model.contains(MODEL_REF_SEPARATOR) {
                tracing::warn!(provider = %name, model = %model, "Skipping model name containing ','");
                continue;
            }
            provider.models.push(model.clone());
            added += 1;
        }

        tracing::debug!(provider = %name, added, "Merged fetched models");
        Ok(Some(added))
    }

    /// Set one router slot. `None` clears it.
    pub fn update_router_slot(
        &mut self,
        slot: RouterSlot,
        model: Option<ModelRef>,
    ) -> Result<(), StoreError> {
        let config = self.document_mut()?;
        if let Some(model_ref) = &model {
            model_ref.validate()?;
        }
        tracing::info!(
            slot = %slot,
            model = %model.as_ref().map(ToString::to_string).unwrap_or_default(),
            "Router slot updated"
        );
        *config.router.slot_mut(slot) = model;
        Ok(())
    }

    pub fn set_long_context_threshold(&mut self, threshold: u64) -> Result<(), StoreError> {
        self.document_mut()?.router.long_context_threshold = threshold;
        Ok(())
    }

    pub fn add_transformer(&mut self, transformer: TransformerConfig) -> Result<(), StoreError> {
        let config = self.document_mut()?;
        tracing::info!(path = %transformer.path, "Transformer added");
        config.transformers.push(transformer);
        Ok(())
    }

    /// Replace the transformer at `index`. Returns `Ok(false)` if out of range.
    pub fn update_transformer(
        &mut self,
        index: usize,
        transformer: TransformerConfig,
    ) -> Result<bool, StoreError> {
        let config = self.document_mut()?;
        match config.transformers.get_mut(index) {
            Some(slot) => {
                *slot = transformer;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the transformer at `index`; later entries shift down.
    pub fn remove_transformer(
        &mut self,
        index: usize,
    ) -> Result<Option<TransformerConfig>, StoreError> {
        let config = self.document_mut()?;
        if index >= config.transformers.len() {
            return Ok(None);
        }
        let removed = config.transformers.remove(index);
        tracing::info!(index, path = %removed.path, "Transformer removed");
        Ok(Some(removed))
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<(), StoreError> {
        let config = self.document_mut()?;
        update.apply(config);
        Ok(())
    }

    /// Every configured `provider,model` pair, for slot pickers.
    pub fn model_refs(&self) -> Result<Vec<ModelRef>, StoreError> {
        Ok(self.document()?.model_refs())
    }

    fn document(&self) -> Result<&Config, StoreError> {
        self.current().ok_or(StoreError::NotLoaded)
    }

    fn document_mut(&mut self) -> Result<&mut Config, StoreError> {
        match &mut self.state {
            DocumentState::Loaded(config) => Ok(config),
            DocumentState::Unloaded => Err(StoreError::NotLoaded),
        }
    }
}

/// Presence checks only; the router validates the rest.
fn validate_provider(provider: &Provider) -> Result<(), StoreError> {
    if provider.name.trim().is_empty() {
        return Err(StoreError::InvalidProvider {
            reason: "name is empty".to_string(),
        });
    }
    if provider.name.contains(MODEL_REF_SEPARATOR) {
        return Err(StoreError::InvalidProvider {
            reason: format!(
                "name '{}' must not contain '{}'",
                provider.name, MODEL_REF_SEPARATOR
            ),
        });
    }
    if provider.api_base_url.trim().is_empty() {
        return Err(StoreError::InvalidProvider {
            reason: format!("provider '{}' has no api_base_url", provider.name),
        });
    }
    if let Some(model) = provider
        .models
        .iter()
        .find(|model| model.contains(MODEL_REF_SEPARATOR))
    {
        return Err(StoreError::InvalidProvider {
            reason: format!(
                "model '{}' of provider '{}' must not contain '{}'",
                model, provider.name, MODEL_REF_SEPARATOR
            ),
        });
    }
    Ok(())
}
