// src/blockchain/resolver_client.rs
//! HTTP client for a universal-resolver style DID Resolution Service.
//!
//! `GET {base_url}/1.0/identifiers/{did}` answers with a resolution result
//! wrapping the document:
//!
//! ```json
//! { "didDocument": { ... }, "didResolutionMetadata": { ... } }
//! ```
//!
//! Some deployments return the bare document instead; both are accepted.

use super::{DidResolver, ResolutionError};
use crate::models::did::DIDDocument;
use async_trait::async_trait;
use log::debug;
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

#[derive(Clone)]
pub struct UniversalResolverClient {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolutionResult {
    did_document: Option<DIDDocument>,
    #[serde(default)]
    did_resolution_metadata: Value,
}

impl UniversalResolverClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `{base_url}/1.0/identifiers/{did}` with `did` escaped into a single
    /// path segment.
    fn identifier_url(&self, did: &str) -> Result<Url, ResolutionError> {
        let invalid = |reason: String| ResolutionError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| invalid("url cannot carry a path".into()))?
            .pop_if_empty()
            .extend(["1.0", "identifiers", did]);
        Ok(url)
    }
}

#[async_trait]
impl DidResolver for UniversalResolverClient {
    async fn resolve(&self, did: &str) -> Result<DIDDocument, ResolutionError> {
        debug!("resolving {}", did);
        let response = self
            .client
            .get(self.identifier_url(did)?)
            .header("accept", "application/json")
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ResolutionError::Status {
                did: did.to_string(),
                status: status.as_u16(),
            });
        }

        let body: Value = response.json().await?;
        if body.get("didDocument").is_some() || body.get("didResolutionMetadata").is_some() {
            let result: ResolutionResult = serde_json::from_value(body)?;
            return result.did_document.ok_or_else(|| ResolutionError::NotFound {
                did: did.to_string(),
                reason: result
                    .did_resolution_metadata
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or("empty result")
                    .to_string(),
            });
        }
        Ok(serde_json::from_value(body)?)
    }
}
