//! Transformer blocks.
//!
//! A provider's `transformer` object is a `use` list plus any number of
//! extra keys, each naming a model and holding its own `use` list:
//!
//! ```json
//! "transformer": {
//!   "use": ["openrouter", ["maxtoken", { "max_tokens": 16384 }]],
//!   "deepseek-chat": { "use": ["tooluse"] }
//! }
//! ```
//!
//! [`ProviderTransformer`] keeps the two halves apart instead of treating the
//! object as a loose map.

use std::fmt;
use std::marker::PhantomData;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

const USE_KEY: &str = "use";

/// One entry of a `use` list: a bare plugin name or a `[name, options]` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TransformerUse {
    Named(String),
    Configured(String, Value),
}

impl TransformerUse {
    pub fn name(&self) -> &str {
        match self {
            Self::Named(name) | Self::Configured(name, _) => name,
        }
    }
}

/// A `use` list applying to one model of a provider.
///
/// Keys other than `use` are kept verbatim in `extra`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformerScope {
    pub uses: Vec<TransformerUse>,
    pub extra: Vec<(String, Value)>,
    use_position: Option<usize>,
}

impl TransformerScope {
    pub fn new(uses: Vec<TransformerUse>) -> Self {
        Self {
            uses,
            ..Self::default()
        }
    }
}

/// Per-provider transformer block.
///
/// `model_scopes` keeps file order. The `use` key is written back where it
/// was read, and left out if it was absent and is still empty.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProviderTransformer {
    pub uses: Vec<TransformerUse>,
    pub model_scopes: Vec<(String, TransformerScope)>,
    use_position: Option<usize>,
}

impl ProviderTransformer {
    pub fn new(uses: Vec<TransformerUse>) -> Self {
        Self {
            uses,
            ..Self::default()
        }
    }

    /// Scope for a specific model, if one is configured.
    pub fn scope_for(&self, model: &str) -> Option<&TransformerScope> {
        self.model_scopes
            .iter()
            .find(|(name, _)| name == model)
            .map(|(_, scope)| scope)
    }
}

/// An object holding an optional `use` list among other keys.
struct UseBlock<T> {
    uses: Vec<TransformerUse>,
    use_position: Option<usize>,
    entries: Vec<(String, T)>,
}

impl<T> UseBlock<T> {
    fn deserialize<'de, D>(deserializer: D, expecting: &'static str) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de>,
    {
        deserializer.deserialize_map(UseBlockVisitor {
            expecting,
            marker: PhantomData,
        })
    }
}

struct UseBlockVisitor<T> {
    expecting: &'static str,
    marker: PhantomData<T>,
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for UseBlockVisitor<T> {
    type Value = UseBlock<T>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.expecting)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut block = UseBlock {
            uses: Vec::new(),
            use_position: None,
            entries: Vec::new(),
        };
        while let Some(key) = access.next_key::<String>()? {
            if key == USE_KEY {
                block.uses = access.next_value()?;
                block.use_position = Some(block.entries.len());
            } else {
                let value = access.next_value()?;
                block.entries.push((key, value));
            }
        }
        Ok(block)
    }
}

fn serialize_use_block<S, T>(
    serializer: S,
    uses: &[TransformerUse],
    use_position: Option<usize>,
    entries: &[(String, T)],
) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: Serialize,
{
    // A `use` list added in memory goes first.
    let position = match use_position {
        Some(position) => Some(position.min(entries.len())),
        None if !uses.is_empty() => Some(0),
        None => None,
    };

    let len = entries.len() + usize::from(position.is_some());
    let mut map = serializer.serialize_map(Some(len))?;
    for (index, (key, value)) in entries.iter().enumerate() {
        if position == Some(index) {
            map.serialize_entry(USE_KEY, uses)?;
        }
        map.serialize_entry(key, value)?;
    }
    if position == Some(entries.len()) {
        map.serialize_entry(USE_KEY, uses)?;
    }
    map.end()
}

impl Serialize for TransformerScope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_use_block(serializer, &self.uses, self.use_position, &self.extra)
    }
}

impl<'de> Deserialize<'de> for TransformerScope {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let block = UseBlock::<Value>::deserialize(deserializer, "a model transformer object")?;
        Ok(Self {
            uses: block.uses,
            extra: block.entries,
            use_position: block.use_position,
        })
    }
}

impl Serialize for ProviderTransformer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serialize_use_block(serializer, &self.uses, self.use_position, &self.model_scopes)
    }
}

impl<'de> Deserialize<'de> for ProviderTransformer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let block = UseBlock::<TransformerScope>::deserialize(
            deserializer,
            "a transformer object with a `use` list and per-model scopes",
        )?;
        Ok(Self {
            uses: block.uses,
            model_scopes: block.entries,
            use_position: block.use_position,
        })
    }
}

/// Process-wide transformer plugin entry from the top-level `transformers` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Path to the plugin script.
    pub path: String,
    /// Plugin options, passed through untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Map<String, Value>>,
}

impl TransformerConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            options: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_mixed_use_list_and_model_scopes() {
        let value = json!({
            "use": ["openrouter", ["maxtoken", { "max_tokens": 16384 }]],
            "deepseek-chat": { "use": ["tooluse"] },
            "deepseek-reasoner": { "use": [] }
        });

        let transformer: ProviderTransformer = serde_json::from_value(value).unwrap();

        assert_eq!(transformer.uses.len(), 2);
        assert_eq!(transformer.uses[0], TransformerUse::Named("openrouter".into()));
        assert_eq!(
            transformer.uses[1],
            TransformerUse::Configured("maxtoken".into(), json!({ "max_tokens": 16384 }))
        );
        assert_eq!(transformer.model_scopes.len(), 2);
        assert_eq!(transformer.model_scopes[0].0, "deepseek-chat");
        assert_eq!(transformer.model_scopes[1].0, "deepseek-reasoner");
    }

    #[test]
    fn missing_use_key_is_empty_list() {
        let transformer: ProviderTransformer =
            serde_json::from_value(json!({ "gpt-4o": { "use": ["tooluse"] } })).unwrap();
        assert!(transformer.uses.is_empty());
        assert_eq!(transformer.scope_for("gpt-4o").unwrap().uses.len(), 1);
    }

    #[test]
    fn new_use_list_is_written_first() {
        let mut transformer = ProviderTransformer::new(vec![TransformerUse::Named("gemini".into())]);
        transformer.model_scopes = vec![
            ("z-model".into(), TransformerScope::default()),
            ("a-model".into(), TransformerScope::new(vec![TransformerUse::Named("tooluse".into())])),
        ];

        let text = serde_json::to_string(&transformer).unwrap();
        assert_eq!(
            text,
            r#"{"use":["gemini"],"z-model":{},"a-model":{"use":["tooluse"]}}"#
        );
    }

    #[test]
    fn blocks_are_written_back_as_read() {
        let cases = [
            r#"{"qwen":{"use":["tooluse"]}}"#,
            r#"{"qwen":{"use":["tooluse"]},"use":["openrouter"]}"#,
            r#"{"use":[],"qwen":{}}"#,
            r#"{"qwen":{"note":"keep me","use":[["maxtoken",{"max_tokens":8192}]]}}"#,
        ];
        for raw in cases {
            let transformer: ProviderTransformer = serde_json::from_str(raw).unwrap();
            assert_eq!(serde_json::to_string(&transformer).unwrap(), raw);
        }
    }

    #[test]
    fn scope_keeps_unknown_keys() {
        let transformer: ProviderTransformer =
            serde_json::from_value(json!({ "qwen": { "use": [], "note": "x" } })).unwrap();
        let scope = transformer.scope_for("qwen").unwrap();
        assert_eq!(scope.extra, vec![("note".to_string(), json!("x"))]);
    }

    #[test]
    fn rejects_non_object_scope() {
        let result: Result<ProviderTransformer, _> =
            serde_json::from_value(json!({ "use": [], "gpt-4o": "tooluse" }));
        assert!(result.is_err());
    }
}
