//! What the converter knows about classes.
//!
//! [`ClassSource`] is the only thing the converter asks for; [`ClassModel`] is an
//! in-memory implementation that can be loaded from JSON documents such as
//!
//! ```json
//! {"classes": [{
//!     "name": "App\\Person",
//!     "final": true,
//!     "doc": "/** A person. */",
//!     "fields": [{"name": "age", "type": "?int", "default": null}]
//! }]}
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::SchemaError;
use crate::path_de;
use crate::types::NativeType;

/// Class lookup by fully-qualified name.
pub trait ClassSource {
    fn class(&self, name: &str) -> Option<&ClassInfo>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldInfo {
    pub name: String,
    /// `None` when the field has no declared type.
    #[serde(default, rename = "type", deserialize_with = "native_type")]
    pub declared: Option<NativeType>,
    /// `Some(Value::Null)` is a default of `null`; `None` is no default at all.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub doc: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumCase {
    pub name: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EnumInfo {
    /// Backing type name, `int` or `string`. Absent for pure enums.
    #[serde(default)]
    pub backing: Option<String>,
    #[serde(default)]
    pub cases: Vec<EnumCase>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClassInfo {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// A final class cannot grow extra properties.
    #[serde(default, rename = "final")]
    pub is_final: bool,
    #[serde(default)]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldInfo>,
    #[serde(default, rename = "enum")]
    pub enumeration: Option<EnumInfo>,
}

impl ClassInfo {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self {
            name: normalize_name(&name).to_string(),
            parent: None,
            is_final: false,
            doc: None,
            fields: Vec::new(),
            enumeration: None,
        }
    }

    /// `App\Model` for `App\Model\Person`; `None` in the global namespace.
    pub fn namespace(&self) -> Option<&str> {
        self.name.rsplit_once('\\').map(|(ns, _)| ns)
    }

    pub fn public_fields(&self) -> impl Iterator<Item = &FieldInfo> {
        self.fields.iter().filter(|f| f.visibility == Visibility::Public)
    }
}

impl FieldInfo {
    pub fn new(name: impl Into<String>, declared: Option<NativeType>) -> Self {
        Self {
            name: name.into(),
            declared,
            default: None,
            readonly: false,
            visibility: Visibility::Public,
            doc: None,
        }
    }
}

fn native_type<'de, D>(deserializer: D) -> Result<Option<NativeType>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|text| text.parse().map_err(serde::de::Error::custom))
        .transpose()
}

/// Distinguishes `"default": null` from a missing key.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Strips a leading namespace separator.
pub fn normalize_name(name: &str) -> &str {
    name.trim_start_matches('\\')
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelDocument {
    #[serde(default)]
    classes: Vec<ClassInfo>,
}

/// Insertion-ordered set of classes.
#[derive(Debug, Clone, Default)]
pub struct ClassModel {
    classes: IndexMap<String, ClassInfo>,
}

impl ClassModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a class, replacing any earlier class with the same name.
    pub fn insert(&mut self, mut class: ClassInfo) {
        class.name = normalize_name(&class.name).to_string();
        if let Some(parent) = &mut class.parent {
            *parent = normalize_name(parent).to_string();
        }
        self.classes.insert(class.name.clone(), class);
    }

    pub fn with(mut self, class: ClassInfo) -> Self {
        self.insert(class);
        self
    }

    pub fn extend(&mut self, other: ClassModel) {
        for (_, class) in other.classes {
            self.insert(class);
        }
    }

    /// `what` names the document in error messages.
    pub fn from_json_str(what: &str, src: &str) -> Result<Self, SchemaError> {
        let doc: ModelDocument = path_de::from_str_with_path(what, src)?;
        Ok(Self::from_document(doc))
    }

    pub fn from_json_value(what: &str, value: Value) -> Result<Self, SchemaError> {
        let doc: ModelDocument = path_de::from_value_with_path(what, value)?;
        Ok(Self::from_document(doc))
    }

    fn from_document(doc: ModelDocument) -> Self {
        let mut model = Self::new();
        for class in doc.classes {
            model.insert(class);
        }
        model
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassInfo> {
        self.classes.values()
    }
}

impl ClassSource for ClassModel {
    fn class(&self, name: &str) -> Option<&ClassInfo> {
        self.classes.get(normalize_name(name))
    }
}
