use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};

use crate::config::model_ref::{slot_value, ModelRef, RouterSlot};
use crate::config::transformer::{ProviderTransformer, TransformerConfig};

/// Root configuration document of the router.
///
/// Fields are serialized in declaration order; keys this crate does not
/// model are kept in `extra` and written after the known ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Enable router logging.
    #[serde(rename = "LOG", default)]
    pub log: bool,
    #[serde(rename = "LOG_LEVEL", default)]
    pub log_level: LogLevel,
    /// Path to the `claude` executable the router launches.
    #[serde(rename = "CLAUDE_PATH", default, skip_serializing_if = "Option::is_none")]
    pub claude_path: Option<String>,
    #[serde(rename = "HOST", default = "default_host")]
    pub host: String,
    #[serde(rename = "PORT", default = "default_port")]
    pub port: u16,
    /// Key clients must present to the router.
    #[serde(rename = "APIKEY", default)]
    pub api_key: String,
    /// Upstream request timeout in milliseconds, stored as a string.
    #[serde(
        rename = "API_TIMEOUT_MS",
        default = "default_api_timeout_ms",
        deserialize_with = "string_or_number"
    )]
    pub api_timeout_ms: String,
    #[serde(rename = "PROXY_URL", default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    #[serde(default)]
    pub transformers: Vec<TransformerConfig>,
    #[serde(rename = "Providers", default)]
    pub providers: Vec<Provider>,
    /// Status line layout. Never interpreted here.
    #[serde(rename = "StatusLine", default, skip_serializing_if = "Option::is_none")]
    pub status_line: Option<Value>,
    #[serde(rename = "Router", default)]
    pub router: RouterConfig,
    /// Script that overrides the router's built-in model selection.
    #[serde(
        rename = "CUSTOM_ROUTER_PATH",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub custom_router_path: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Router log level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(format!(
                "unknown log level '{}' (expected debug, info, warn or error)",
                other
            )),
        }
    }
}

/// Upstream model-serving endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    /// Unique key within the document (e.g., "openrouter", "deepseek").
    pub name: String,
    /// Base URL requests are sent to (e.g., "https://api.deepseek.com/chat/completions").
    pub api_base_url: String,
    /// Stored in plaintext, as the router expects.
    #[serde(default)]
    pub api_key: String,
    /// Path used instead of `v1/models` when listing models.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub models_endpoint: Option<String>,
    #[serde(default)]
    pub models: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformer: Option<ProviderTransformer>,
}

impl Provider {
    pub fn new(name: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            api_base_url: api_base_url.into(),
            api_key: String::new(),
            models_endpoint: None,
            models: Vec::new(),
            transformer: None,
        }
    }

    /// Model references for every model this provider lists. Names that
    /// cannot be joined into a valid reference are skipped.
    pub fn model_refs(&self) -> impl Iterator<Item = ModelRef> + '_ {
        self.models
            .iter()
            .filter_map(move |model| ModelRef::try_new(self.name.clone(), model.clone()).ok())
    }
}

/// Router slot assignments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default, with = "slot_value")]
    pub default: Option<ModelRef>,
    #[serde(default, with = "slot_value")]
    pub background: Option<ModelRef>,
    #[serde(default, with = "slot_value")]
    pub think: Option<ModelRef>,
    #[serde(rename = "longContext", default, with = "slot_value")]
    pub long_context: Option<ModelRef>,
    /// Token count above which `longContext` is used instead of `default`.
    #[serde(rename = "longContextThreshold", default = "default_long_context_threshold")]
    pub long_context_threshold: u64,
    #[serde(rename = "webSearch", default, with = "slot_value")]
    pub web_search: Option<ModelRef>,
    #[serde(default, with = "slot_value")]
    pub image: Option<ModelRef>,
}

impl RouterConfig {
    pub fn slot(&self, slot: RouterSlot) -> Option<&ModelRef> {
        self.slot_entry(slot).as_ref()
    }

    pub fn slot_mut(&mut self, slot: RouterSlot) -> &mut Option<ModelRef> {
        match slot {
            RouterSlot::Default => &mut self.default,
            RouterSlot::Background => &mut self.background,
            RouterSlot::Think => &mut self.think,
            RouterSlot::LongContext => &mut self.long_context,
            RouterSlot::WebSearch => &mut self.web_search,
            RouterSlot::Image => &mut self.image,
        }
    }

    fn slot_entry(&self, slot: RouterSlot) -> &Option<ModelRef> {
        match slot {
            RouterSlot::Default => &self.default,
            RouterSlot::Background => &self.background,
            RouterSlot::Think => &self.think,
            RouterSlot::LongContext => &self.long_context,
            RouterSlot::WebSearch => &self.web_search,
            RouterSlot::Image => &self.image,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3456
}

fn default_api_timeout_ms() -> String {
    "600000".to_string()
}

fn default_long_context_threshold() -> u64 {
    60000
}

fn default_status_line() -> Value {
    json!({
        "enabled": false,
        "currentStyle": "default",
        "default": { "modules": [] },
        "powerline": { "modules": [] }
    })
}

/// Accepts `"600000"` or `600000`; older router files use either.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number, found {}",
            other
        ))),
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            default: None,
            background: None,
            think: None,
            long_context: None,
            long_context_threshold: default_long_context_threshold(),
            web_search: None,
            image: None,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log: false,
            log_level: LogLevel::Debug,
            claude_path: None,
            host: default_host(),
            port: default_port(),
            api_key: String::new(),
            api_timeout_ms: default_api_timeout_ms(),
            proxy_url: None,
            transformers: Vec::new(),
            providers: Vec::new(),
            status_line: Some(default_status_line()),
            router: RouterConfig::default(),
            custom_router_path: None,
            extra: Map::new(),
        }
    }
}

impl Config {
    /// Position of the provider named exactly `name`.
    pub fn provider_index(&self, name: &str) -> Option<usize> {
        self.providers.iter().position(|p| p.name == name)
    }

    pub fn provider(&self, name: &str) -> Option<&Provider> {
        self.providers.iter().find(|p| p.name == name)
    }

    /// Every configured `provider,model` pair in document order.
    pub fn model_refs(&self) -> Vec<ModelRef> {
        self.providers.iter().flat_map(Provider::model_refs).collect()
    }
}
