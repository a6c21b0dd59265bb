//! Service Errors
//! Mission: One error vocabulary from store to handler

use std::fmt;

/// Error surface shared by the stores and the finance engine. The API layer
/// maps these onto HTTP statuses and a `{ "message": ... }` body.
#[derive(Debug)]
pub enum ServiceError {
    /// Permission gate rejected the actor. No side effects were performed.
    Forbidden,
    /// Referenced pilgrim/payment/ledger row does not exist.
    NotFound(String),
    /// Validation failure detected before any write.
    InvalidArgument(String),
    /// Underlying store failure.
    Storage(anyhow::Error),
}

impl ServiceError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Forbidden => write!(f, "Insufficient permissions"),
            ServiceError::NotFound(msg) => write!(f, "{}", msg),
            ServiceError::InvalidArgument(msg) => write!(f, "{}", msg),
            ServiceError::Storage(err) => write!(f, "Storage failure: {}", err),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<rusqlite::Error> for ServiceError {
    fn from(err: rusqlite::Error) -> Self {
        ServiceError::Storage(err.into())
    }
}

impl From<anyhow::Error> for ServiceError {
    fn from(err: anyhow::Error) -> Self {
        ServiceError::Storage(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = ServiceError::invalid("amount must be positive");
        assert_eq!(err.to_string(), "amount must be positive");

        let err = ServiceError::not_found("Pilgrim abc not found");
        assert_eq!(err.to_string(), "Pilgrim abc not found");

        assert_eq!(ServiceError::Forbidden.to_string(), "Insufficient permissions");
    }

    #[test]
    fn test_sqlite_error_converts_to_storage() {
        let err: ServiceError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, ServiceError::Storage(_)));
    }
}
