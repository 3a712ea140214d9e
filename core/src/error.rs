use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the core library.
#[derive(Debug, Error)]
pub enum YummyError {
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("{context}: {source}")]
    Storage {
        context: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error("failed to parse {0}")]
    Parse(String),

    #[error("failed to encode {0}")]
    Encode(String),

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, YummyError>;

impl YummyError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Attaches operation context to driver errors, the way `anyhow::Context` does.
pub trait StorageContext<T> {
    fn storage(self, context: &str) -> Result<T>;

    fn with_storage<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> StorageContext<T> for rusqlite::Result<T> {
    fn storage(self, context: &str) -> Result<T> {
        self.map_err(|source| YummyError::Storage {
            context: context.to_string(),
            source,
        })
    }

    fn with_storage<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| YummyError::Storage {
            context: f(),
            source,
        })
    }
}
