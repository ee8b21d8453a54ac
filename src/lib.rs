//! Compiles type information about a class graph into JSON Schema.
//!
//! Types come from two places: field declarations (`?int`, `A|B|null`) and
//! doc-comment annotations (`@var list<Person>`, `@property-read bool $flag`).
//! Referenced classes end up in a `definitions` map and are linked with `$ref`.
//!
//! ```
//! use docschema::{ClassModel, Converter};
//! use serde_json::json;
//!
//! let model = ClassModel::from_json_value("inline", json!({"classes": [
//!     {"name": "Person", "final": true, "fields": [{"name": "name", "type": "string"}]}
//! ]})).unwrap();
//!
//! let schema = Converter::new(&model).convert_annotation("?Person", None).unwrap();
//! assert_eq!(schema.to_json().unwrap()["definitions"]["Person"]["required"], json!(["name"]));
//! ```

pub mod annotation;
pub mod config;
pub mod convert;
pub mod docblock;
pub mod error;
pub mod model;
pub mod path_de;
pub mod registry;
pub mod schema;
pub mod types;

pub use config::Options;
pub use convert::{Bindings, Converter};
pub use error::{ParseError, SchemaError};
pub use model::{ClassInfo, ClassModel, ClassSource};
pub use schema::SchemaFragment;
pub use types::{NativeType, TypeDescriptor};
