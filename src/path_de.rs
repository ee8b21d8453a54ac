//! Deserialization that reports *where* in the document things went wrong.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::SchemaError;

fn located<E: std::fmt::Display>(what: &str, err: serde_path_to_error::Error<E>) -> SchemaError {
    let path = err.path().to_string();
    SchemaError::InvalidModel(format!("{what}: at JSON path {path} → {}", err.into_inner()))
}

/// `what` names the document in the error, e.g. a file path.
pub fn from_str_with_path<T: DeserializeOwned>(what: &str, src: &str) -> Result<T, SchemaError> {
    let de = &mut serde_json::Deserializer::from_str(src);
    serde_path_to_error::deserialize(de).map_err(|err| located(what, err))
}

pub fn from_value_with_path<T: DeserializeOwned>(what: &str, value: Value) -> Result<T, SchemaError> {
    serde_path_to_error::deserialize(value).map_err(|err| located(what, err))
}
