use thiserror::Error;

use servicedesk_core::lookup::LookupError;

pub mod customer;
pub mod memory;

pub use customer::SqlLookupService;
pub use memory::InMemoryLookupService;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

impl From<RepositoryError> for LookupError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Database(source) => Self::Unavailable(source.to_string()),
            RepositoryError::Decode(message) => Self::Corrupt(message),
        }
    }
}
