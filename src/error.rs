use thiserror::Error;

/// A syntax error in a type annotation, native declaration or doc comment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at offset {offset} in `{input}`")]
pub struct ParseError {
    pub input: String,
    pub offset: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(input: &str, offset: usize, message: impl Into<String>) -> Self {
        Self {
            input: input.to_string(),
            offset,
            message: message.into(),
        }
    }
}

/// Every way a conversion can fail. All of them abort the whole top-level call.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("`{0}` cannot be converted to JSON Schema")]
    UnsupportedType(String),

    #[error("cannot convert `{keyword}`: {reason}")]
    MissingContext {
        keyword: &'static str,
        reason: String,
    },

    #[error("template type `{0}` is not bound and declares no bound type")]
    UnresolvedTemplate(String),

    #[error("could not find class `{0}`")]
    UnknownClass(String),

    #[error("cannot convert enum `{name}` to JSON Schema: {reason}")]
    MalformedEnum { name: String, reason: String },

    #[error("`{class}` declares {expected} template parameter(s) but {found} argument(s) were given")]
    GenericArityMismatch {
        class: String,
        expected: usize,
        found: usize,
    },

    #[error("generic argument `{argument}` of `{class}` is not a concrete type name")]
    NonConcreteGenericArgument { class: String, argument: String },

    #[error("intersection `{0}` cannot allow null")]
    NullableIntersection(String),

    /// Reaching this means the converter itself is broken.
    #[error("definition `{0}` was still being built when definitions were merged")]
    IncompleteRegistry(String),

    #[error("schema too deep: more than {0} levels of nesting")]
    TooDeep(usize),

    #[error("invalid type annotation")]
    Annotation(#[from] ParseError),

    #[error("invalid documentation on `{owner}`")]
    DocComment {
        owner: String,
        #[source]
        source: ParseError,
    },

    #[error("invalid class model: {0}")]
    InvalidModel(String),
}

pub type Result<T, E = SchemaError> = std::result::Result<T, E>;
