//! Service error types.

use domain::DomainError;
use store::StoreError;
use thiserror::Error;

/// Errors returned by application services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// A domain rule rejected the operation, or a reference is missing.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// The store failed.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::Domain(e) if e.is_not_found())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ServiceError::Domain(e) if e.is_validation())
    }

    /// Maps a unique-constraint violation onto a duplicate-name error.
    pub(crate) fn duplicate(entity: &'static str, name: &str) -> impl FnOnce(StoreError) -> Self {
        move |e| match e {
            StoreError::UniqueViolation(_) => DomainError::Duplicate {
                entity,
                name: name.to_string(),
            }
            .into(),
            other => other.into(),
        }
    }
}

/// Convenience type alias for service results.
pub type Result<T> = std::result::Result<T, ServiceError>;
