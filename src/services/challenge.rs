// src/services/challenge.rs
//! Presentation challenges handed to wallets before they sign.

use serde::Serialize;
use uuid::Uuid;

/// A fresh nonce and the domain the presentation must be bound to.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Challenge {
    pub challenge: String,
    pub domain: String,
}

/// Pairs a random UUID v4 with `domain`. Nothing is stored; the agent checks
/// the echoed values when the presentation comes back.
pub fn generate_challenge(domain: &str) -> Challenge {
    Challenge {
        challenge: Uuid::new_v4().to_string(),
        domain: domain.to_string(),
    }
}
