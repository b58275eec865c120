use thiserror::Error;

use crate::domain::Credits;

/// Transport-facing tag for an error. Every service operation returns either
/// a record or exactly one of these, with a human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("listing not found: {0}")]
    ListingNotFound(String),

    #[error("only the owner may remove listing {0}")]
    NotOwner(String),

    #[error("a seller cannot buy their own listing")]
    OwnListing,

    #[error("insufficient funds: balance {balance}, required {required}")]
    InsufficientFunds { balance: Credits, required: Credits },

    #[error("item has not been sold: {0}")]
    NotSold(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// Map this error onto its transport-facing tag.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::MissingField(_)
            | AppError::InsufficientFunds { .. }
            | AppError::NotSold(_)
            | AppError::InvalidAmount(_) => ErrorKind::BadRequest,
            AppError::NotOwner(_) | AppError::OwnListing => ErrorKind::Forbidden,
            AppError::ListingNotFound(_) => ErrorKind::NotFound,
            AppError::Database(_) => ErrorKind::Internal,
        }
    }
}
