//! Error types for sqlweave

use thiserror::Error;

/// Result type alias for query building and compilation.
pub type QbResult<T> = Result<T, QbError>;

/// Errors raised while building or compiling a query.
///
/// Every variant is a deterministic programmer error: compiling the same
/// draft against the same dialect always fails the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QbError {
    /// A value shape that cannot be bound in this position (e.g. a list as a
    /// `BETWEEN` bound, or a number as a `LIKE` pattern).
    #[error("Unsupported value for {context}: {found}")]
    UnsupportedValue { context: String, found: String },

    /// A column reference was empty.
    #[error("Empty column name")]
    EmptyColumn,

    /// An identifier could not be parsed.
    #[error("Invalid identifier '{0}'")]
    InvalidIdentifier(String),

    /// A table spec carried more than one alias token.
    #[error("Invalid table alias spec '{0}': expected `table` or `table alias`")]
    InvalidAlias(String),

    /// A non-CROSS join was added without an ON condition.
    #[error("{kind} JOIN on '{table}' requires an ON condition")]
    MissingJoinCondition { kind: String, table: String },

    /// A CROSS join was given an ON condition.
    #[error("CROSS JOIN on '{0}' cannot carry an ON condition")]
    UnexpectedJoinCondition(String),

    /// A batch statement was built with zero rows.
    #[error("Empty batch: {0} requires at least one row")]
    EmptyBatch(&'static str),

    /// Batch rows did not share the same column set.
    #[error("Row {row} has columns [{found}], expected [{expected}]")]
    ColumnMismatch {
        row: usize,
        expected: String,
        found: String,
    },

    /// A batch update row (or the builder) is missing a key column.
    #[error("Missing key column: {0}")]
    MissingKey(String),

    /// An UPDATE had nothing to SET.
    #[error("UPDATE on '{0}' has no SET columns")]
    EmptySet(String),

    /// The number of placeholders did not match the number of arguments.
    #[error("Placeholder mismatch: {placeholders} placeholders, {params} params")]
    PlaceholderMismatch { placeholders: usize, params: usize },

    /// No dialect is registered under the requested driver name.
    #[error("Unknown dialect '{name}' (known: {known})")]
    UnknownDialect { name: String, known: String },

    /// A set-operation arm was not a plain SELECT core.
    #[error("Invalid set operation: {0}")]
    InvalidSetOperation(String),

    /// The target dialect has no way to express the requested construct.
    #[error("{dialect} does not support {feature}")]
    Unsupported {
        dialect: &'static str,
        feature: &'static str,
    },

    /// Struct-to-map conversion failed.
    #[error(transparent)]
    Mapping(#[from] MappingError),

    /// Other validation failures.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Errors from converting a typed record into a column map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// The record serialized to `null` (e.g. a `None`).
    #[error("Cannot map a nil record")]
    NilInput,

    /// The record did not serialize to a struct-like object.
    #[error("Cannot map non-struct value of kind {found}")]
    NotAStruct { found: &'static str },

    /// The record's `Serialize` impl failed.
    #[error("Record serialization failed: {0}")]
    Serialize(String),
}

impl QbError {
    /// Create an unsupported-value error.
    pub fn unsupported_value(context: impl Into<String>, found: impl Into<String>) -> Self {
        Self::UnsupportedValue {
            context: context.into(),
            found: found.into(),
        }
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Check if this is an unsupported-value error.
    pub fn is_unsupported_value(&self) -> bool {
        matches!(self, Self::UnsupportedValue { .. })
    }

    /// Check if this is an empty-batch error.
    pub fn is_empty_batch(&self) -> bool {
        matches!(self, Self::EmptyBatch(_))
    }

    /// Check if this is an unknown-dialect error.
    pub fn is_unknown_dialect(&self) -> bool {
        matches!(self, Self::UnknownDialect { .. })
    }
}
