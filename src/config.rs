use serde::Deserialize;

use crate::error::SchemaError;
use crate::path_de;

pub const DEFAULT_MAX_DEPTH: usize = 64;
pub const DEFAULT_DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Converter settings. Every key is optional when loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct Options {
    /// Nesting ceiling; conversion fails with `TooDeep` past it.
    pub max_depth: usize,
    /// Prepended to definition keys to form `$ref` values.
    pub definitions_prefix: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            definitions_prefix: DEFAULT_DEFINITIONS_PREFIX.to_string(),
        }
    }
}

impl Options {
    pub fn from_json_str(what: &str, src: &str) -> Result<Self, SchemaError> {
        path_de::from_str_with_path(what, src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let options = Options::from_json_str("options.json", r#"{"max-depth": 8}"#).unwrap();
        assert_eq!(options.max_depth, 8);
        assert_eq!(options.definitions_prefix, "#/definitions/");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(Options::from_json_str("options.json", r#"{"depth": 8}"#).is_err());
    }
}
