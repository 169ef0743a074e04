// src/services/identifier.rs
//! Syntax checks for `did:ethr` identifiers.
//!
//! Accepted shapes:
//! ```text
//! did:ethr:<address>
//! did:ethr:<network>:<address>
//! ```
//! where `<network>` is one of [`KNOWN_NETWORKS`] and `<address>` is a
//! 20-byte hex address, either single-case or EIP-55 checksummed.

use crate::error::IdentityError;
use ethers::types::Address;
use ethers::utils::to_checksum;
use std::fmt;
use std::str::FromStr;

/// Network labels accepted in the 4-segment form.
pub const KNOWN_NETWORKS: [&str; 3] = ["goerli", "0x5", "0x05"];

const DID_SCHEME: &str = "did";
const ETHR_METHOD: &str = "ethr";

/// Returns true if `identifier` is a well-formed `did:ethr` identifier.
pub fn is_valid_identifier(identifier: &str) -> bool {
    let parts: Vec<&str> = identifier.split(':').collect();
    if parts.len() < 3 || parts.len() > 4 || parts[0] != DID_SCHEME || parts[1] != ETHR_METHOD {
        return false;
    }
    match parts.as_slice() {
        [_, _, network, address] => KNOWN_NETWORKS.contains(network) && is_valid_address(address),
        [_, _, address] => is_valid_address(address),
        _ => false,
    }
}

/// Checks a chain address the way Ethereum wallets do: 40 hex digits with an
/// optional `0x` prefix. Mixed-case input must carry a valid EIP-55 checksum.
pub fn is_valid_address(address: &str) -> bool {
    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    if digits.len() != 40 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }

    let has_lower = digits.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = digits.chars().any(|c| c.is_ascii_uppercase());
    if !(has_lower && has_upper) {
        return true;
    }

    match Address::from_str(digits) {
        Ok(parsed) => to_checksum(&parsed, None)[2..] == *digits,
        Err(_) => false,
    }
}

/// Address component of a 3- or 4-segment `did:ethr` string, without any
/// further validation of the address itself.
pub fn address_of(identifier: &str) -> Option<&str> {
    let parts: Vec<&str> = identifier.split(':').collect();
    if parts.len() < 3 || parts[0] != DID_SCHEME || parts[1] != ETHR_METHOD {
        return None;
    }
    match parts.as_slice() {
        [_, _, _, address] | [_, _, address] => Some(*address),
        _ => None,
    }
}

/// A validated `did:ethr` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthrDid {
    network: Option<String>,
    address: String,
}

impl EthrDid {
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl FromStr for EthrDid {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_identifier(s) {
            return Err(IdentityError::InvalidIdentifier(s.to_string()));
        }
        let parts: Vec<&str> = s.split(':').collect();
        let (network, address) = match parts.as_slice() {
            [_, _, network, address] => (Some(network.to_string()), address.to_string()),
            [_, _, address] => (None, address.to_string()),
            _ => return Err(IdentityError::InvalidIdentifier(s.to_string())),
        };
        Ok(Self { network, address })
    }
}

impl fmt::Display for EthrDid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.network {
            Some(network) => write!(f, "{DID_SCHEME}:{ETHR_METHOD}:{network}:{}", self.address),
            None => write!(f, "{DID_SCHEME}:{ETHR_METHOD}:{}", self.address),
        }
    }
}
