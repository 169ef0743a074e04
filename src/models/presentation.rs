// src/models/presentation.rs
//! Verifiable Presentation data model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A presentation as submitted by a holder.
///
/// Embedded credentials stay as raw JSON: structured objects for JWT-proof
/// presentations, compact JWT strings for EIP-712 presentations. Members the
/// service does not read are kept in `extra` so the agent verifies exactly
/// what the holder signed.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    /// DID of the presenting party
    pub holder: String,

    #[serde(default)]
    pub verifiable_credential: Vec<Value>,

    pub proof: PresentationProof,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PresentationProof {
    /// "JwtProof2020" or "EthereumEip712Signature2021"
    #[serde(rename = "type")]
    pub proof_type: String,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
