// src/utils/jwt.rs
//! Unverified decoding of compact JWTs.
//!
//! Signature checks belong to the Credential Agent. This module only reads
//! the claims a token carries so they can be compared against the structured
//! credential that accompanies it.

use serde::de::DeserializeOwned;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum JwtDecodeError {
    #[error("token does not have three dot-separated segments")]
    Malformed,

    #[error("payload is not base64url: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("payload is not valid JSON claims: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decodes the payload segment of `token` into `T` without checking the
/// signature.
pub fn decode_payload<T: DeserializeOwned>(token: &str) -> Result<T, JwtDecodeError> {
    let mut segments = token.trim().split('.');
    let payload = match (segments.next(), segments.next(), segments.next(), segments.next()) {
        (Some(_header), Some(payload), Some(_signature), None) => payload,
        _ => return Err(JwtDecodeError::Malformed),
    };
    // Some encoders keep the padding; base64url in JWTs is defined without it.
    let bytes = base64::decode_config(payload.trim_end_matches('='), base64::URL_SAFE_NO_PAD)?;
    Ok(serde_json::from_slice(&bytes)?)
}
