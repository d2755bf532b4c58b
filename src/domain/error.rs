use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Rejected: {0}")]
    Rejected(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("{message}: {details}")]
    Provider { message: String, details: String },
    #[error("{message}: {details}")]
    Persistence { message: String, details: String },
    #[error("Unexpected procedure result")]
    UnexpectedShape,
    #[error("{message}: {details}")]
    Internal { message: String, details: String },
}

impl DomainError {
    pub fn persistence(message: &str, err: impl std::fmt::Display) -> Self {
        DomainError::Persistence {
            message: message.to_string(),
            details: err.to_string(),
        }
    }
}
