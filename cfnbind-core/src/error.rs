//! Error types for schema reading, kind resolution and catalog assembly

use thiserror::Error;

/// Placeholder type name for failures that concern the whole document
pub const DOCUMENT: &str = "(document)";

/// Errors raised while turning schema entries into records
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A required schema attribute is absent or malformed
    #[error("Schema parse error in '{type_name}': {message}")]
    Parse { type_name: String, message: String },

    /// A field declares a kind the resolver does not recognize
    #[error("Unknown value kind '{kind}' for field '{field}' of '{type_name}'")]
    UnknownValueKind {
        type_name: String,
        field: String,
        kind: String,
    },

    /// Two schema entries share one type name
    #[error("Duplicate type name '{type_name}'")]
    DuplicateTypeName { type_name: String },

    /// Two type names map to the same artifact path
    #[error("'{type_name}' and '{other}' would both be written to '{path}'")]
    ArtifactCollision {
        type_name: String,
        other: String,
        path: String,
    },

    /// A concurrent generation worker did not complete
    #[error("Generation worker failed: {0}")]
    Worker(String),
}

impl SchemaError {
    pub fn parse(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    pub fn unknown_kind(
        type_name: impl Into<String>,
        field: impl Into<String>,
        kind: impl Into<String>,
    ) -> Self {
        Self::UnknownValueKind {
            type_name: type_name.into(),
            field: field.into(),
            kind: kind.into(),
        }
    }

    pub fn duplicate(type_name: impl Into<String>) -> Self {
        Self::DuplicateTypeName {
            type_name: type_name.into(),
        }
    }

    /// Type name the error is about, if any
    pub fn type_name(&self) -> Option<&str> {
        match self {
            SchemaError::Parse { type_name, .. }
            | SchemaError::UnknownValueKind { type_name, .. }
            | SchemaError::DuplicateTypeName { type_name }
            | SchemaError::ArtifactCollision { type_name, .. } => Some(type_name),
            SchemaError::Worker(_) => None,
        }
    }

    /// Returns true if the error only disqualifies one entry
    pub fn is_entry_level(&self) -> bool {
        matches!(
            self,
            SchemaError::Parse { .. } | SchemaError::UnknownValueKind { .. }
        )
    }
}

pub type SchemaResult<T> = Result<T, SchemaError>;

/// A schema entry that produced no record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryFailure {
    pub type_name: String,
    pub error: SchemaError,
}

impl EntryFailure {
    pub fn new(type_name: impl Into<String>, error: SchemaError) -> Self {
        Self {
            type_name: type_name.into(),
            error,
        }
    }
}

impl std::fmt::Display for EntryFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.type_name, self.error)
    }
}
