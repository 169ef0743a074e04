// src/error.rs
//! Service-level error taxonomy.
//!
//! Only input and readiness problems are reported to callers with a reason.
//! Failures inside presentation verification never reach this type; the
//! verifier collapses them to a `false` verdict.

use crate::agent::AgentError;
use thiserror::Error;

/// Errors surfaced by the issuing side of the service.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The identifier failed the `did:ethr` syntax check.
    #[error("Identifier {0} is not valid!")]
    InvalidIdentifier(String),

    /// No managed issuer identity was available; a bootstrap import may have
    /// been performed and the caller should retry.
    #[error("issuer identity not ready: {0}")]
    IssuanceFailure(String),

    /// The Credential Agent could not be reached or rejected the call.
    #[error("credential agent error: {0}")]
    Agent(#[from] AgentError),
}
