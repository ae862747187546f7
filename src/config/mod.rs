mod loader;
mod model_ref;
mod paths;
mod store;
mod transformer;
mod types;

pub use loader::ConfigError;
pub use model_ref::{ModelRef, ModelRefError, RouterSlot, MODEL_REF_SEPARATOR};
pub use paths::{ConfigPaths, PathOverrides};
pub use store::{ConfigStore, SettingsUpdate, StoreError};
pub use transformer::{ProviderTransformer, TransformerConfig, TransformerScope, TransformerUse};
pub use types::{Config, LogLevel, Provider, RouterConfig};
