use std::error;
use std::fmt;

/// Convenient result type using [`ModstateError`] as the error type.
pub type ModstateResult<T> = Result<T, ModstateError>;

/// Main error type of the moderation state rebuild.
///
/// The kind is what callers match on, the description is static and the optional detail carries
/// the dynamic context such as the id of the entity involved.
#[derive(Debug, Clone)]
pub struct ModstateError {
    repr: ErrorRepr,
}

#[derive(Debug, Clone)]
enum ErrorRepr {
    WithDescription(ErrorKind, &'static str),
    WithDescriptionAndDetail(ErrorKind, &'static str, String),
}

/// Categories of errors that can occur while rebuilding moderation states.
#[derive(PartialEq, Eq, Copy, Clone, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    // Connection Errors
    SourceConnectionFailed,

    // Query & Execution Errors
    SourceQueryFailed,

    // Moderation Errors
    WorkflowNotFound,
    EntityNotFound,
    DuplicateStateRecord,

    // Data Errors
    ConversionError,

    // IO & Serialization Errors
    IoError,
    DeserializationError,

    // Batch Errors
    InvalidBatchSize,
    InvalidState,
}

impl ModstateError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        match self.repr {
            ErrorRepr::WithDescription(kind, _)
            | ErrorRepr::WithDescriptionAndDetail(kind, _, _) => kind,
        }
    }

    /// Returns the detailed error information if available.
    pub fn detail(&self) -> Option<&str> {
        match self.repr {
            ErrorRepr::WithDescriptionAndDetail(_, _, ref detail) => Some(detail.as_str()),
            ErrorRepr::WithDescription(_, _) => None,
        }
    }
}

impl PartialEq for ModstateError {
    fn eq(&self, other: &ModstateError) -> bool {
        match (&self.repr, &other.repr) {
            (ErrorRepr::WithDescription(kind_a, _), ErrorRepr::WithDescription(kind_b, _)) => {
                kind_a == kind_b
            }
            (
                ErrorRepr::WithDescriptionAndDetail(kind_a, _, _),
                ErrorRepr::WithDescriptionAndDetail(kind_b, _, _),
            ) => kind_a == kind_b,
            _ => false,
        }
    }
}

impl fmt::Display for ModstateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        match self.repr {
            ErrorRepr::WithDescription(kind, desc) => write!(f, "{kind:?}: {desc}"),
            ErrorRepr::WithDescriptionAndDetail(kind, desc, ref detail) => {
                write!(f, "{kind:?}: {desc} -> {detail}")
            }
        }
    }
}

impl error::Error for ModstateError {}

impl From<(ErrorKind, &'static str)> for ModstateError {
    fn from((kind, desc): (ErrorKind, &'static str)) -> ModstateError {
        ModstateError {
            repr: ErrorRepr::WithDescription(kind, desc),
        }
    }
}

impl From<(ErrorKind, &'static str, String)> for ModstateError {
    fn from((kind, desc, detail): (ErrorKind, &'static str, String)) -> ModstateError {
        ModstateError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, desc, detail),
        }
    }
}

impl From<std::io::Error> for ModstateError {
    fn from(err: std::io::Error) -> ModstateError {
        ModstateError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::IoError,
                "I/O error occurred",
                err.to_string(),
            ),
        }
    }
}

/// Maps syntax and data failures to [`ErrorKind::DeserializationError`], I/O failures to
/// [`ErrorKind::IoError`].
impl From<serde_json::Error> for ModstateError {
    fn from(err: serde_json::Error) -> ModstateError {
        let (kind, description) = match err.classify() {
            serde_json::error::Category::Io => (ErrorKind::IoError, "JSON I/O operation failed"),
            serde_json::error::Category::Syntax
            | serde_json::error::Category::Data
            | serde_json::error::Category::Eof => (
                ErrorKind::DeserializationError,
                "JSON deserialization failed",
            ),
        };

        ModstateError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

/// Converts [`sqlx::Error`] to [`ModstateError`].
///
/// Unique violations map to [`ErrorKind::DuplicateStateRecord`] since the only unique index we
/// write against is the moderation state record key.
impl From<sqlx::Error> for ModstateError {
    fn from(err: sqlx::Error) -> ModstateError {
        let (kind, description) = match &err {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => (
                ErrorKind::DuplicateStateRecord,
                "A moderation state record already exists for this key",
            ),
            sqlx::Error::Database(_) => (ErrorKind::SourceQueryFailed, "Database query failed"),
            sqlx::Error::Io(_) => (ErrorKind::IoError, "Database I/O error"),
            sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => (
                ErrorKind::SourceConnectionFailed,
                "Database connection unavailable",
            ),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => (
                ErrorKind::ConversionError,
                "Failed to decode database value",
            ),
            _ => (ErrorKind::SourceQueryFailed, "Database operation failed"),
        };

        ModstateError {
            repr: ErrorRepr::WithDescriptionAndDetail(kind, description, err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ModstateError {
    fn from(err: sqlx::migrate::MigrateError) -> ModstateError {
        ModstateError {
            repr: ErrorRepr::WithDescriptionAndDetail(
                ErrorKind::SourceQueryFailed,
                "Database migration failed",
                err.to_string(),
            ),
        }
    }
}
