//! Type descriptors.
//!
//! [`TypeDescriptor`] is what doc-comment annotations parse into;
//! [`NativeType`] is what a field declares in code.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::ParseError;
use crate::schema::JsonType;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Literal {
    pub fn to_json(&self) -> Value {
        match self {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(i) => Value::from(*i),
            Literal::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Literal::String(s) => Value::String(s.clone()),
        }
    }
}

/// Scalar pseudo-types that narrow a base kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refinement {
    PositiveInt,
    NegativeInt,
    NonEmptyString,
    LowercaseString,
    NonEmptyLowercaseString,
    NumericString,
    Numeric,
}

impl Refinement {
    pub fn keyword(self) -> &'static str {
        match self {
            Refinement::PositiveInt => "positive-int",
            Refinement::NegativeInt => "negative-int",
            Refinement::NonEmptyString => "non-empty-string",
            Refinement::LowercaseString => "lowercase-string",
            Refinement::NonEmptyLowercaseString => "non-empty-lowercase-string",
            Refinement::NumericString => "numeric-string",
            Refinement::Numeric => "numeric",
        }
    }

    pub fn from_keyword(word: &str) -> Option<Self> {
        Some(match word {
            "positive-int" => Refinement::PositiveInt,
            "negative-int" => Refinement::NegativeInt,
            "non-empty-string" => Refinement::NonEmptyString,
            "lowercase-string" => Refinement::LowercaseString,
            "non-empty-lowercase-string" => Refinement::NonEmptyLowercaseString,
            "numeric-string" => Refinement::NumericString,
            "numeric" => Refinement::Numeric,
            _ => return None,
        })
    }
}

/// One key of an inline `object{...}` shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeEntry {
    pub key: String,
    pub optional: bool,
    pub ty: TypeDescriptor,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Mixed,
    Null,
    Bool,
    Int,
    Float,
    String,
    /// `string|int|float|bool`
    Scalar,
    /// `string|int`
    ArrayKey,
    /// Bare `object`.
    Object,
    Literal(Literal),
    Refined(Refinement),
    IntRange {
        min: Option<i64>,
        max: Option<i64>,
    },

    Nullable(Box<TypeDescriptor>),
    Union(Vec<TypeDescriptor>),
    Intersection(Vec<TypeDescriptor>),

    /// `Base<A, B>`
    Generic {
        base: String,
        args: Vec<TypeDescriptor>,
    },
    /// A template parameter of the enclosing class, with its declared bound.
    Template {
        name: String,
        bound: Option<Box<TypeDescriptor>>,
    },

    List {
        item: Box<TypeDescriptor>,
        non_empty: bool,
    },
    /// `array`, `array<V>`, `array<K, V>`, `V[]`
    Collection {
        key: Option<Box<TypeDescriptor>>,
        value: Option<Box<TypeDescriptor>>,
    },
    /// `object{a: T, b?: U}`
    Shape(Vec<ShapeEntry>),

    /// Class, interface or enum name as written.
    Class(String),
    SelfType,
    Static,
    This,
    Parent,

    Void,
    Never,
    Callable,
    Resource,
    Iterable,
    /// Constant expressions such as `Foo::BAR` or `Foo::*`.
    Expression(String),
}

impl TypeDescriptor {
    /// The JSON type this descriptor maps to when it is one of the basic scalars.
    pub fn scalar_kind(&self) -> Option<JsonType> {
        match self {
            TypeDescriptor::Null => Some(JsonType::Null),
            TypeDescriptor::Bool => Some(JsonType::Boolean),
            TypeDescriptor::Int => Some(JsonType::Integer),
            TypeDescriptor::Float => Some(JsonType::Number),
            TypeDescriptor::String => Some(JsonType::String),
            _ => None,
        }
    }

    pub fn nullable(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Nullable(Box::new(inner))
    }

    pub fn class(name: impl Into<String>) -> Self {
        TypeDescriptor::Class(name.into())
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[TypeDescriptor], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        match item {
            TypeDescriptor::Union(_) | TypeDescriptor::Intersection(_) => write!(f, "({item})")?,
            _ => write!(f, "{item}")?,
        }
    }
    Ok(())
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Mixed => f.write_str("mixed"),
            TypeDescriptor::Null => f.write_str("null"),
            TypeDescriptor::Bool => f.write_str("bool"),
            TypeDescriptor::Int => f.write_str("int"),
            TypeDescriptor::Float => f.write_str("float"),
            TypeDescriptor::String => f.write_str("string"),
            TypeDescriptor::Scalar => f.write_str("scalar"),
            TypeDescriptor::ArrayKey => f.write_str("array-key"),
            TypeDescriptor::Object => f.write_str("object"),
            TypeDescriptor::Literal(Literal::Null) => f.write_str("null"),
            TypeDescriptor::Literal(Literal::Bool(b)) => write!(f, "{b}"),
            TypeDescriptor::Literal(Literal::Int(i)) => write!(f, "{i}"),
            TypeDescriptor::Literal(Literal::Float(x)) => write!(f, "{x:?}"),
            TypeDescriptor::Literal(Literal::String(s)) => write!(f, "'{s}'"),
            TypeDescriptor::Refined(r) => f.write_str(r.keyword()),
            TypeDescriptor::IntRange { min, max } => {
                let min = min.map_or_else(|| "min".to_string(), |v| v.to_string());
                let max = max.map_or_else(|| "max".to_string(), |v| v.to_string());
                write!(f, "int<{min}, {max}>")
            }
            TypeDescriptor::Nullable(inner) => write!(f, "?{inner}"),
            TypeDescriptor::Union(members) => write_joined(f, members, "|"),
            TypeDescriptor::Intersection(members) => write_joined(f, members, "&"),
            TypeDescriptor::Generic { base, args } => {
                write!(f, "{base}<")?;
                write_joined(f, args, ", ")?;
                f.write_str(">")
            }
            TypeDescriptor::Template { name, .. } => f.write_str(name),
            TypeDescriptor::List { item, non_empty } => {
                let word = if *non_empty { "non-empty-list" } else { "list" };
                write!(f, "{word}<{item}>")
            }
            TypeDescriptor::Collection { key, value } => match (key, value) {
                (Some(k), Some(v)) => write!(f, "array<{k}, {v}>"),
                (None, Some(v)) => write!(f, "array<{v}>"),
                _ => f.write_str("array"),
            },
            TypeDescriptor::Shape(entries) => {
                f.write_str("object{")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    let opt = if entry.optional { "?" } else { "" };
                    write!(f, "{}{opt}: {}", entry.key, entry.ty)?;
                }
                f.write_str("}")
            }
            TypeDescriptor::Class(name) => f.write_str(name),
            TypeDescriptor::SelfType => f.write_str("self"),
            TypeDescriptor::Static => f.write_str("static"),
            TypeDescriptor::This => f.write_str("$this"),
            TypeDescriptor::Parent => f.write_str("parent"),
            TypeDescriptor::Void => f.write_str("void"),
            TypeDescriptor::Never => f.write_str("never"),
            TypeDescriptor::Callable => f.write_str("callable"),
            TypeDescriptor::Resource => f.write_str("resource"),
            TypeDescriptor::Iterable => f.write_str("iterable"),
            TypeDescriptor::Expression(raw) => f.write_str(raw),
        }
    }
}

// ————————————————————————————————————————————————————————————————————————————
// NATIVE DECLARATIONS
// ————————————————————————————————————————————————————————————————————————————

/// A type as declared on a field, e.g. `?int`, `int|float|null`, `A&B`.
///
/// `null` members of a union are folded into the `nullable` flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeType {
    Named { name: String, nullable: bool },
    Union { members: Vec<NativeType>, nullable: bool },
    Intersection { members: Vec<NativeType>, nullable: bool },
}

impl NativeType {
    pub fn named(name: impl Into<String>) -> Self {
        NativeType::Named {
            name: name.into(),
            nullable: false,
        }
    }

    fn into_nullable(self) -> Self {
        match self {
            NativeType::Named { name, .. } => NativeType::Named { name, nullable: true },
            NativeType::Union { members, .. } => NativeType::Union { members, nullable: true },
            NativeType::Intersection { members, .. } => NativeType::Intersection {
                members,
                nullable: true,
            },
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NativeType::Named { name, nullable } => {
                if *nullable {
                    f.write_str("?")?;
                }
                f.write_str(name)
            }
            NativeType::Union { members, nullable } => {
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("|")?;
                    }
                    match member {
                        NativeType::Intersection { .. } => write!(f, "({member})")?,
                        _ => write!(f, "{member}")?,
                    }
                }
                if *nullable {
                    f.write_str("|null")?;
                }
                Ok(())
            }
            NativeType::Intersection { members, nullable } => {
                if *nullable {
                    f.write_str("?(")?;
                }
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str("&")?;
                    }
                    write!(f, "{member}")?;
                }
                if *nullable {
                    f.write_str(")")?;
                }
                Ok(())
            }
        }
    }
}

/// Splits on `sep` outside of parentheses, returning each piece with its offset.
fn split_top_level(text: &str, sep: char) -> Vec<(usize, &str)> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == sep && depth == 0 => {
                parts.push((start, &text[start..i]));
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push((start, &text[start..]));
    parts
}

fn is_type_name(text: &str) -> bool {
    let bare = text.strip_prefix('\\').unwrap_or(text);
    !bare.is_empty()
        && bare
            .split('\\')
            .all(|seg| {
                let mut chars = seg.chars();
                matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                    && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            })
}

fn parse_member(src: &str, offset: usize, text: &str) -> Result<NativeType, ParseError> {
    let trimmed = text.trim();
    let offset = offset + (text.len() - text.trim_start().len());
    let (inner, grouped) = match trimmed.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(inner) => (inner, true),
        None => (trimmed, false),
    };
    let parts = split_top_level(inner, '&');
    if parts.len() > 1 || grouped {
        let mut members = Vec::with_capacity(parts.len());
        for (at, part) in parts {
            let name = part.trim();
            if !is_type_name(name) {
                return Err(ParseError::new(src, offset + at, "expected a type name in intersection"));
            }
            members.push(NativeType::named(name));
        }
        return Ok(NativeType::Intersection {
            members,
            nullable: false,
        });
    }
    if !is_type_name(inner) {
        return Err(ParseError::new(src, offset, "expected a type name"));
    }
    Ok(NativeType::named(inner))
}

impl FromStr for NativeType {
    type Err = ParseError;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        let text = src.trim();
        let lead = src.len() - src.trim_start().len();
        if text.is_empty() {
            return Err(ParseError::new(src, 0, "empty type declaration"));
        }

        if let Some(rest) = text.strip_prefix('?') {
            if rest.contains('|') {
                return Err(ParseError::new(src, lead, "`?` cannot be combined with a union"));
            }
            return Ok(parse_member(src, lead + 1, rest)?.into_nullable());
        }

        let parts = split_top_level(text, '|');
        if parts.len() == 1 {
            return parse_member(src, lead, text);
        }

        let mut nullable = false;
        let mut members = Vec::new();
        for (at, part) in parts {
            if part.trim().eq_ignore_ascii_case("null") {
                nullable = true;
                continue;
            }
            members.push(parse_member(src, lead + at, part)?);
        }
        if members.is_empty() {
            return Ok(NativeType::named("null"));
        }
        // `T|null` is the same declaration as `?T`
        if nullable && members.len() == 1 && matches!(members[0], NativeType::Named { .. }) {
            return Ok(members.remove(0).into_nullable());
        }
        Ok(NativeType::Union { members, nullable })
    }
}
