use thiserror::Error;

/// Broad failure classes a caller can branch on.
///
/// Configuration and reflection errors are raised while a schema handle is
/// compiled and are not worth retrying. Usage errors come back from the
/// per-request transforms and are the caller's to fix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Configuration,
    Reflection,
    Usage,
    Conversion,
    Lock,
}

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Reflection error: {0}")]
    Reflection(String),

    #[error("Invalid argument: {0}")]
    Usage(String),

    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl MapperError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Reflection(_) => ErrorCategory::Reflection,
            Self::Usage(_) => ErrorCategory::Usage,
            Self::Conversion(_) => ErrorCategory::Conversion,
            Self::LockError(_) => ErrorCategory::Lock,
        }
    }

    /// True for errors raised while compiling a schema, which no retry can fix.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Configuration | ErrorCategory::Reflection
        )
    }
}

pub type Result<T> = std::result::Result<T, MapperError>;

impl<T> From<std::sync::PoisonError<T>> for MapperError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(err: serde_json::Error) -> Self {
        Self::Conversion(err.to_string())
    }
}
