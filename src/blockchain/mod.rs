// src/blockchain/mod.rs
//! On-chain identity resolution.
//!
//! `did:ethr` documents are derived from the ERC-1056 registry. Reading the
//! registry is left to a DID Resolution Service; this module defines what the
//! service is asked and provides an HTTP client for it.

pub mod resolver_client;

use crate::models::did::DIDDocument;
use async_trait::async_trait;
use thiserror::Error;

pub use resolver_client::UniversalResolverClient;

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("resolver request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("resolver url {url} is unusable: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("resolver returned {status} for {did}")]
    Status { did: String, status: u16 },

    #[error("resolution of {did} produced no document: {reason}")]
    NotFound { did: String, reason: String },

    #[error("resolver response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Resolves a DID to its current document. No caching is assumed.
#[async_trait]
pub trait DidResolver: Send + Sync {
    async fn resolve(&self, did: &str) -> Result<DIDDocument, ResolutionError>;
}
