//! Data backend access

pub mod client;
pub mod signature;

pub use client::{BackendClient, BackendError, BatchDeleteResult};
pub use signature::{canonical_json, payload_signature, SIGNATURE_HEADER};
