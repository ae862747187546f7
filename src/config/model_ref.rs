//! Model references and router slots.
//!
//! The router file stores a model selection as a single `provider,model`
//! string. Inside the crate it is always a [`ModelRef`]; the joined form only
//! exists on the wire.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Separator between provider and model name in a model reference.
pub const MODEL_REF_SEPARATOR: char = ',';

/// Errors produced when parsing a `provider,model` string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelRefError {
    #[error("Model reference '{value}' is missing the ',' separator")]
    MissingSeparator { value: String },

    #[error("Model reference '{value}' has an empty provider or model name")]
    EmptyPart { value: String },

    #[error("Model reference '{value}' contains more than one ','")]
    ExtraSeparator { value: String },
}

/// A provider/model pair selected for a router slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ModelRef {
    pub provider: String,
    pub model: String,
}

impl ModelRef {
    /// Unchecked constructor. Use [`ModelRef::try_new`] for names that come
    /// from outside the crate.
    pub fn new(provider: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            model: model.into(),
        }
    }

    pub fn try_new(
        provider: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, ModelRefError> {
        let model_ref = Self::new(provider, model);
        model_ref.validate()?;
        Ok(model_ref)
    }

    /// Both parts must be non-empty and free of the separator, otherwise the
    /// joined form would not parse back.
    pub fn validate(&self) -> Result<(), ModelRefError> {
        if self.provider.contains(MODEL_REF_SEPARATOR) || self.model.contains(MODEL_REF_SEPARATOR) {
            return Err(ModelRefError::ExtraSeparator {
                value: self.to_string(),
            });
        }
        if self.provider.is_empty() || self.model.is_empty() {
            return Err(ModelRefError::EmptyPart {
                value: self.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for ModelRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.provider, MODEL_REF_SEPARATOR, self.model)
    }
}

impl FromStr for ModelRef {
    type Err = ModelRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (provider, model) =
            s.split_once(MODEL_REF_SEPARATOR)
                .ok_or_else(|| ModelRefError::MissingSeparator {
                    value: s.to_string(),
                })?;

        Self::try_new(provider, model)
    }
}

/// Serde adapter for router slot values: `""` on the wire is an unset slot.
pub(crate) mod slot_value {
    use serde::{Deserialize, Deserializer, Serializer};

    use super::ModelRef;

    pub fn serialize<S>(value: &Option<ModelRef>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(model_ref) => {
                model_ref.validate().map_err(serde::ser::Error::custom)?;
                serializer.collect_str(model_ref)
            }
            None => serializer.serialize_str(""),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<ModelRef>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        if raw.is_empty() {
            return Ok(None);
        }
        raw.parse().map(Some).map_err(serde::de::Error::custom)
    }
}

/// One of the six named routing purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterSlot {
    Default,
    Background,
    Think,
    LongContext,
    WebSearch,
    Image,
}

impl RouterSlot {
    /// Key used in the router file. Do not rename.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Background => "background",
            Self::Think => "think",
            Self::LongContext => "longContext",
            Self::WebSearch => "webSearch",
            Self::Image => "image",
        }
    }

    /// All slots in display order.
    pub fn all() -> &'static [RouterSlot] {
        &[
            Self::Default,
            Self::Background,
            Self::Think,
            Self::LongContext,
            Self::WebSearch,
            Self::Image,
        ]
    }

    /// Parse from a file key. Unknown names return `None`.
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().copied().find(|slot| slot.as_str() == s)
    }
}

impl fmt::Display for RouterSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
