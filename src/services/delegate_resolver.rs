// src/services/delegate_resolver.rs
//! Delegate authorization lookup.
//!
//! A holder may present a credential issued to another address if the
//! holder's `did:ethr` document links back to that address. The match is
//! best effort: a failed resolution and a document without a matching entry
//! both read as "not a delegate".

use crate::blockchain::DidResolver;
use crate::models::did::DIDDocument;
use crate::services::identifier::is_valid_address;
use log::{debug, warn};
use std::sync::Arc;

/// CAIP-10 namespace of EVM chains.
const EIP155_NAMESPACE: &str = "eip155:";

/// Length of a `0x`-prefixed address.
const ADDRESS_LEN: usize = 42;

#[derive(Clone)]
pub struct DelegateResolver {
    resolver: Arc<dyn DidResolver>,
    /// Network label used to build the delegate's DID, e.g. "goerli"
    network: String,
}

impl DelegateResolver {
    pub fn new(resolver: Arc<dyn DidResolver>, network: impl Into<String>) -> Self {
        Self {
            resolver,
            network: network.into(),
        }
    }

    /// Returns true if `delegate_address` is authorized to act for
    /// `owner_address` according to the delegate's identity document. A
    /// malformed delegate address is never resolved.
    pub async fn is_delegate(&self, owner_address: &str, delegate_address: &str) -> bool {
        if !is_valid_address(delegate_address) {
            warn!("{:?} is not an address, treating as no delegation", delegate_address);
            return false;
        }
        let did = format!("did:ethr:{}:{}", self.network, delegate_address);
        match self.resolver.resolve(&did).await {
            Ok(document) => {
                let authorized = document_authorizes(&document, owner_address, delegate_address);
                debug!(
                    "{} delegate check for owner {}: {}",
                    did, owner_address, authorized
                );
                authorized
            }
            Err(e) => {
                warn!("could not resolve {}, treating as no delegation: {}", did, e);
                false
            }
        }
    }
}

/// True if any verification method in `document` carries the delegate's key
/// or points at the owner's account.
pub fn document_authorizes(
    document: &DIDDocument,
    owner_address: &str,
    delegate_address: &str,
) -> bool {
    let delegate_tail = delegate_address.get(2..).unwrap_or_default();
    let owner_prefix = leading(owner_address, ADDRESS_LEN);

    document.verification_method.iter().any(|method| {
        let key_matches = method.public_key_hex.as_deref().is_some_and(|key| {
            !delegate_tail.is_empty() && key.eq_ignore_ascii_case(delegate_tail)
        });

        let account_matches = method
            .blockchain_account_id
            .as_deref()
            .map(strip_chain_namespace)
            .is_some_and(|account| {
                leading(account, ADDRESS_LEN).eq_ignore_ascii_case(owner_prefix)
            });

        key_matches || account_matches
    })
}

/// `eip155:5:0xabc` -> `0xabc`. Legacy `0xabc@eip155:5` values are returned
/// unchanged; the 42-character comparison ignores the suffix.
fn strip_chain_namespace(account: &str) -> &str {
    match account.strip_prefix(EIP155_NAMESPACE) {
        Some(rest) => rest.split_once(':').map_or(rest, |(_, address)| address),
        None => account,
    }
}

/// First `n` characters of `s`, or all of it when shorter.
fn leading(s: &str, n: usize) -> &str {
    match s.char_indices().nth(n) {
        Some((end, _)) => &s[..end],
        None => s,
    }
}
