// src/models/did.rs
//! DID Document data model.
//!
//! Mirrors the subset of the [DID Core](https://www.w3.org/TR/did-core/)
//! document that `did:ethr` resolution returns and the delegate check reads.

use serde::{Deserialize, Serialize};

/// A resolved DID Document.
///
/// Only verification methods are modelled; any other members of the resolved
/// document are ignored on deserialization.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DIDDocument {
    /// The DID this document describes
    /// Example: "did:ethr:goerli:0xb9c5714089478a327f09197987f16f9e5d936e8a"
    #[serde(default)]
    pub id: String,

    /// Keys and accounts able to act for the DID subject
    #[serde(default)]
    pub verification_method: Vec<VerificationMethod>,
}

/// A single verification method entry.
///
/// `did:ethr` documents carry either a raw secp256k1 key (`publicKeyHex`) or
/// a CAIP-10 account reference (`blockchainAccountId`), sometimes both.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    #[serde(default)]
    pub id: String,

    #[serde(rename = "type", default)]
    pub method_type: String,

    #[serde(default)]
    pub controller: String,

    /// Hex-encoded public key, no `0x` prefix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_hex: Option<String>,

    /// Example: "eip155:5:0xb9c5714089478a327f09197987f16f9e5d936e8a"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain_account_id: Option<String>,
}
