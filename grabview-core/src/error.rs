use thiserror::Error;

/// Boxed error produced by a user-supplied function (coercion, callable field).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while a schema is being defined. Never raised at read time.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema {schema}: both `fields` and `ignore_fields` are configured")]
    ConflictingFieldConfig { schema: String },

    #[error("schema {schema}: member `{member}` is declared twice")]
    DuplicateMember { schema: String, member: String },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("unknown schema `{0}`")]
    UnknownSchema(String),

    #[error("schema reference cycle: {0}")]
    SchemaCycle(String),
}

/// Errors raised while reading fields from a schema instance.
#[derive(Debug, Error)]
pub enum ViewError {
    /// A strict projection met a structural miss.
    #[error("missing field `{key}` at `{path}`")]
    MissingField { key: String, path: String },

    /// Failure of a coercion or user function, passed through unchanged.
    #[error(transparent)]
    Coercion(BoxError),

    #[error("schema {schema} has no member `{name}`")]
    UnknownField { schema: String, name: String },

    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl ViewError {
    /// Wraps a user-function error without altering its message.
    pub fn coercion(err: impl Into<BoxError>) -> Self {
        ViewError::Coercion(err.into())
    }
}
