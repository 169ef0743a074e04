// src/agent/remote.rs
//! HTTP client for a remote Credential Agent.
//!
//! Every agent method is exposed as `POST {base_url}/agent/{method}` taking a
//! JSON object of named arguments and answering with the method's JSON
//! result. An optional API key is sent as a bearer token.

use super::{
    AgentError, CredentialAgent, ImportableIdentity, ManagedIdentifier, ProofFormat,
};
use crate::models::credential::{UnsignedCredential, VerifiableCredential};
use crate::models::presentation::VerifiablePresentation;
use async_trait::async_trait;
use log::debug;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Thread-safe agent client; clones share the connection pool.
#[derive(Clone)]
pub struct RemoteAgent {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

/// Agents answer verification calls either with a bare boolean or with a
/// result object carrying a `verified` flag.
#[derive(Deserialize)]
#[serde(untagged)]
enum VerifyOutcome {
    Flag(bool),
    Report { verified: bool },
}

impl From<VerifyOutcome> for bool {
    fn from(outcome: VerifyOutcome) -> bool {
        match outcome {
            VerifyOutcome::Flag(verified) | VerifyOutcome::Report { verified } => verified,
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateCredentialArgs<'a> {
    credential: &'a UnsignedCredential,
    save: bool,
    proof_format: ProofFormat,
}

#[derive(Serialize)]
struct VerifyPresentationArgs<'a> {
    presentation: &'a VerifiablePresentation,
    #[serde(skip_serializing_if = "Option::is_none")]
    domain: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    challenge: Option<&'a str>,
}

impl RemoteAgent {
    /// Creates a client for the agent at `base_url` (no trailing `/agent`).
    pub fn new(base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Invokes `method` with `args` and decodes the result.
    async fn call<A, R>(&self, method: &'static str, args: &A) -> Result<R, AgentError>
    where
        A: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        debug!("calling agent method {}", method);
        let mut request = self
            .client
            .post(format!("{}/agent/{}", self.base_url, method))
            .json(args);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(AgentError::Status {
                method,
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl CredentialAgent for RemoteAgent {
    async fn list_managed_identifiers(&self) -> Result<Vec<ManagedIdentifier>, AgentError> {
        self.call("didManagerFind", &json!({})).await
    }

    async fn import_identity(
        &self,
        identity: &ImportableIdentity,
    ) -> Result<ManagedIdentifier, AgentError> {
        self.call("didManagerImport", identity).await
    }

    async fn sign_credential(
        &self,
        credential: &UnsignedCredential,
        proof_format: ProofFormat,
        persist: bool,
    ) -> Result<VerifiableCredential, AgentError> {
        let args = CreateCredentialArgs {
            credential,
            save: persist,
            proof_format,
        };
        self.call("createVerifiableCredential", &args).await
    }

    async fn verify_presentation(
        &self,
        presentation: &VerifiablePresentation,
        domain: Option<&str>,
        challenge: Option<&str>,
    ) -> Result<bool, AgentError> {
        let args = VerifyPresentationArgs {
            presentation,
            domain,
            challenge,
        };
        let outcome: VerifyOutcome = self.call("verifyPresentation", &args).await?;
        Ok(outcome.into())
    }

    async fn verify_presentation_typed_data(
        &self,
        presentation: &VerifiablePresentation,
    ) -> Result<bool, AgentError> {
        let outcome: VerifyOutcome = self
            .call("verifyPresentationEIP712", &json!({ "presentation": presentation }))
            .await?;
        Ok(outcome.into())
    }

    async fn verify_credential(&self, credential: &Value) -> Result<bool, AgentError> {
        let outcome: VerifyOutcome = self
            .call("verifyCredential", &json!({ "credential": credential }))
            .await?;
        Ok(outcome.into())
    }
}
