//! JSON Schema object model.
//!
//! Every keyword is optional and skipped when unset, so a default fragment
//! serializes to `{}` (the unconstrained schema).

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{Number, Value};

/// JSON Schema primitive type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

/// The `type` keyword: a single name or an ordered set of names.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypeSet {
    Single(JsonType),
    Many(Vec<JsonType>),
}

impl TypeSet {
    /// Builds a set from an ordered list, dropping duplicates.
    pub fn from_kinds(kinds: impl IntoIterator<Item = JsonType>) -> Self {
        let mut out: Vec<JsonType> = Vec::new();
        for kind in kinds {
            if !out.contains(&kind) {
                out.push(kind);
            }
        }
        match out.as_slice() {
            [single] => TypeSet::Single(*single),
            _ => TypeSet::Many(out),
        }
    }

    pub fn kinds(&self) -> Vec<JsonType> {
        match self {
            TypeSet::Single(kind) => vec![*kind],
            TypeSet::Many(kinds) => kinds.clone(),
        }
    }

    /// Moves (or inserts) `null` to the front.
    pub fn with_null_first(&self) -> Self {
        let rest = self.kinds().into_iter().filter(|k| *k != JsonType::Null);
        TypeSet::from_kinds(std::iter::once(JsonType::Null).chain(rest))
    }
}

impl From<JsonType> for TypeSet {
    fn from(kind: JsonType) -> Self {
        TypeSet::Single(kind)
    }
}

/// `additionalProperties` accepts either a flag or a schema.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<SchemaFragment>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFragment {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TypeSet>,
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    #[serde(rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<Value>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write_only: Option<bool>,

    // numbers
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exclusive_maximum: Option<Number>,

    // strings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,

    // arrays
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<u64>,

    // objects
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaFragment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,

    // composition
    #[serde(skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaFragment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub all_of: Option<Vec<SchemaFragment>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub definitions: Option<IndexMap<String, SchemaFragment>>,
}

impl SchemaFragment {
    /// The unconstrained schema `{}`.
    pub fn any() -> Self {
        Self::default()
    }

    pub fn of_type(kind: impl Into<TypeSet>) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    pub fn reference(path: impl Into<String>) -> Self {
        Self {
            reference: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn constant(value: Value) -> Self {
        Self {
            constant: Some(value),
            ..Self::default()
        }
    }

    pub fn any_of(branches: Vec<SchemaFragment>) -> Self {
        Self {
            any_of: Some(branches),
            ..Self::default()
        }
    }

    pub fn all_of(branches: Vec<SchemaFragment>) -> Self {
        Self {
            all_of: Some(branches),
            ..Self::default()
        }
    }

    /// `{type: 'object', additionalProperties: true}`
    pub fn open_object() -> Self {
        Self {
            kind: Some(TypeSet::Single(JsonType::Object)),
            additional_properties: Some(AdditionalProperties::Allowed(true)),
            ..Self::default()
        }
    }

    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    /// Makes the fragment accept `null`.
    ///
    /// `null` goes first in an existing `type`, or becomes the first `anyOf`
    /// branch. Anything else (a `$ref`, a `const`, an `allOf`) is wrapped into
    /// `anyOf: [{type: null}, original]`. `{}` already accepts null.
    pub fn into_nullable(mut self) -> Self {
        if let Some(kind) = &self.kind {
            self.kind = Some(kind.with_null_first());
            return self;
        }
        if let Some(branches) = &mut self.any_of {
            let null = SchemaFragment::of_type(JsonType::Null);
            if !branches.contains(&null) {
                branches.insert(0, null);
            }
            return self;
        }
        if self.is_unconstrained() {
            return self;
        }
        SchemaFragment::any_of(vec![SchemaFragment::of_type(JsonType::Null), self])
    }

    pub fn set_property(&mut self, name: impl Into<String>, schema: SchemaFragment) {
        self.properties
            .get_or_insert_with(IndexMap::new)
            .insert(name.into(), schema);
    }

    pub fn require(&mut self, name: impl Into<String>) {
        self.required.get_or_insert_with(Vec::new).push(name.into());
    }

    /// Splits free text into a title (first line) and a description (the rest),
    /// setting each only when non-empty.
    pub fn apply_title_and_description(&mut self, text: &str) {
        let text = text.trim();
        let (first, rest) = text.split_once('\n').unwrap_or((text, ""));
        let title = first.trim();
        if !title.is_empty() {
            self.title = Some(title.to_string());
        }
        let description = rest.trim();
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
    }

    pub fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}
