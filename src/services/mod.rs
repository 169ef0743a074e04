// src/services/mod.rs
//! Issuing and verification logic plus the HTTP surface over it.

pub mod api_server;
pub mod challenge;
pub mod credential_issuer;
pub mod delegate_resolver;
pub mod identifier;
pub mod schema_validator;
pub mod verifier;
