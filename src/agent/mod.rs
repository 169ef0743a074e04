// src/agent/mod.rs
//! Credential Agent interface.
//!
//! The agent owns key custody, DID import and every signature operation.
//! This service only asks it questions; see [`remote::RemoteAgent`] for the
//! HTTP implementation.

pub mod remote;

use crate::models::credential::{UnsignedCredential, VerifiableCredential};
use crate::models::presentation::VerifiablePresentation;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub use remote::RemoteAgent;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("agent request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("agent method {method} returned {status}: {body}")]
    Status {
        method: &'static str,
        status: u16,
        body: String,
    },

    #[error("agent response could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Proof encoding requested when signing. Certificates are only ever issued
/// as JWTs; typed-data proofs are produced by wallets, not by this service.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProofFormat {
    Jwt,
}

/// A DID managed by the agent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ManagedIdentifier {
    pub did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
}

/// Key material handed to the agent on import.
#[derive(Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImportableKey {
    pub kms: String,
    #[serde(rename = "type")]
    pub key_type: String,
    pub private_key_hex: String,
}

impl std::fmt::Debug for ImportableKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportableKey")
            .field("kms", &self.kms)
            .field("key_type", &self.key_type)
            .finish_non_exhaustive()
    }
}

/// Identity imported into the agent when it has none yet.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImportableIdentity {
    pub did: String,
    pub provider: String,
    pub keys: Vec<ImportableKey>,
}

/// Operations the service needs from the Credential Agent.
///
/// Verification methods answer with `Ok(false)` for a proof that does not
/// check out and reserve `Err` for failures to get an answer at all.
#[async_trait]
pub trait CredentialAgent: Send + Sync {
    async fn list_managed_identifiers(&self) -> Result<Vec<ManagedIdentifier>, AgentError>;

    async fn import_identity(
        &self,
        identity: &ImportableIdentity,
    ) -> Result<ManagedIdentifier, AgentError>;

    async fn sign_credential(
        &self,
        credential: &UnsignedCredential,
        proof_format: ProofFormat,
        persist: bool,
    ) -> Result<VerifiableCredential, AgentError>;

    async fn verify_presentation(
        &self,
        presentation: &VerifiablePresentation,
        domain: Option<&str>,
        challenge: Option<&str>,
    ) -> Result<bool, AgentError>;

    async fn verify_presentation_typed_data(
        &self,
        presentation: &VerifiablePresentation,
    ) -> Result<bool, AgentError>;

    /// `credential` is either a structured credential or a compact JWT string.
    async fn verify_credential(&self, credential: &Value) -> Result<bool, AgentError>;
}
