//! Kiln Delivery Library
//!
//! This crate turns stored media references into short-lived playable URLs.
//! It provides the signing API client and the [`SignedUrlResolver`], a
//! bounded cache plus inflight-request coalescing layer that guarantees a
//! single signing call per path no matter how many feed rows ask at once.

pub mod resolver;
pub mod signing;

// Re-export commonly used types
pub use resolver::{HttpUrlWarmer, SignedUrlResolver, UrlWarmer};
pub use signing::{HttpSigningApi, SignedUrl, SigningApi, SigningError};
