//! HOT22 backend client.

/// HTTP client and the backend trait seam.
pub mod client;
/// Wire types for the backend contract.
pub mod types;
