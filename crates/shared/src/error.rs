//! Errors raised while adapting backend payloads

use thiserror::Error;

/// Why a backend record could not become a typed [`crate::Subscription`]
#[derive(Debug, Error, PartialEq)]
pub enum PayloadError {
    #[error("subscription payload has no id")]
    MissingId,

    #[error("subscription {id} has a non-numeric price: {raw}")]
    InvalidPrice { id: String, raw: String },

    #[error("subscription {id} has a non-finite price")]
    NonFinitePrice { id: String },
}
