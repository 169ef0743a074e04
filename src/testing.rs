// src/testing.rs
//! Deterministic stand-ins for the Credential Agent and the DID Resolution
//! Service, plus fixture builders shared by the unit tests.

use crate::agent::{
    AgentError, CredentialAgent, ImportableIdentity, ManagedIdentifier, ProofFormat,
};
use crate::blockchain::{DidResolver, ResolutionError};
use crate::config::{CertificateSettings, IssuerSettings};
use crate::models::credential::{
    CredentialProof, UnsignedCredential, VerifiableCredential, CREDENTIAL_CONTEXTS,
    CREDENTIAL_SCHEMA_ID,
};
use crate::models::did::DIDDocument;
use crate::models::presentation::VerifiablePresentation;
use async_trait::async_trait;
use chrono::DateTime;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const TRUSTED_ISSUER: &str = "did:ethr:goerli:0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const SUBJECT_ADDRESS: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
pub const DELEGATE_ADDRESS: &str = "0xdbF03B407c01E7cD3CBea99509d93f8DDDC8C6FB";

/// Id of the fixture credential, in the bare UUID form the issuer mints.
pub const CREDENTIAL_ID: &str = "3978344f-8596-4c3a-a978-8fcaba3903c5";

pub fn subject_did() -> String {
    format!("did:ethr:goerli:{SUBJECT_ADDRESS}")
}

pub fn delegate_did() -> String {
    format!("did:ethr:goerli:{DELEGATE_ADDRESS}")
}

/// Mints a compact JWT around `claims`. The agent fakes never check the
/// signature, so an HMAC key is enough.
pub fn mint_jwt(claims: &Value) -> String {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"fixture"),
    )
    .expect("fixture claims serialize")
}

/// `credentialSubject` of a certificate issued to `subject`.
pub fn subject_claims(subject: &str) -> Value {
    json!({
        "id": subject,
        "accomplishmentType": "Developer Certificate",
        "learnerName": "Ada",
        "achievement": "Certified Solidity Developer Test",
        "courseProvider": "https://blockchain-lab.um.si/"
    })
}

/// JWT payload a JWT-proof credential carries for `subject` and `issuer`.
pub fn jwt_payload(subject: &str, issuer: &str) -> Value {
    let mut claims = subject_claims(subject);
    if let Some(map) = claims.as_object_mut() {
        map.remove("id");
    }
    json!({
        "sub": subject,
        "iss": issuer,
        "nbf": 1_700_000_000,
        "jti": CREDENTIAL_ID,
        "vc": {
            "@context": CREDENTIAL_CONTEXTS,
            "type": ["VerifiableCredential", "ProgramCompletionCertificate"],
            "credentialSchema": {
                "id": CREDENTIAL_SCHEMA_ID,
                "type": "JsonSchemaValidator2018"
            },
            "credentialSubject": claims
        }
    })
}

/// Structured JWT-proof credential whose proof restates its own content.
pub fn structured_credential(subject: &str, issuer: &str) -> Value {
    json!({
        "id": CREDENTIAL_ID,
        "issuer": { "id": issuer },
        "@context": CREDENTIAL_CONTEXTS,
        "credentialSchema": {
            "id": CREDENTIAL_SCHEMA_ID,
            "type": "JsonSchemaValidator2018"
        },
        "type": ["VerifiableCredential", "ProgramCompletionCertificate"],
        "issuanceDate": "2023-11-14T22:13:20.000Z",
        "credentialSubject": subject_claims(subject),
        "proof": {
            "type": "JwtProof2020",
            "jwt": mint_jwt(&jwt_payload(subject, issuer))
        }
    })
}

/// Token claims an agent derives from `credential` when signing it as a JWT:
/// the id moves to `jti`, the subject id to `sub` and the issuance date to
/// `nbf`.
pub fn signed_payload(credential: &UnsignedCredential) -> Value {
    let mut subject = serde_json::to_value(&credential.credential_subject).unwrap();
    subject.as_object_mut().unwrap().remove("id");
    let nbf = DateTime::parse_from_rfc3339(&credential.issuance_date)
        .unwrap()
        .timestamp();
    json!({
        "sub": credential.credential_subject.id,
        "iss": credential.issuer.id(),
        "nbf": nbf,
        "jti": credential.id,
        "vc": {
            "@context": credential.context,
            "type": credential.types,
            "credentialSchema": credential.credential_schema,
            "credentialSubject": subject
        }
    })
}

pub fn issuer_settings() -> IssuerSettings {
    IssuerSettings {
        did: TRUSTED_ISSUER.into(),
        provider: "did:ethr:goerli".into(),
        kms: "local".into(),
        key_type: "Secp256k1".into(),
        private_key_hex: "c0ffee".into(),
    }
}

pub fn certificate_settings() -> CertificateSettings {
    CertificateSettings {
        accomplishment_type: "Developer Certificate".into(),
        achievement: "Certified Solidity Developer Test".into(),
        course_provider: "https://blockchain-lab.um.si/".into(),
    }
}

pub fn presentation(
    proof_type: &str,
    holder: &str,
    credentials: Vec<Value>,
) -> VerifiablePresentation {
    serde_json::from_value(json!({
        "@context": ["https://www.w3.org/2018/credentials/v1"],
        "type": ["VerifiablePresentation"],
        "holder": holder,
        "verifiableCredential": credentials,
        "proof": { "type": proof_type }
    }))
    .expect("fixture presentation deserializes")
}

/// Scripted Credential Agent that records how it was called.
#[derive(Default)]
pub struct FakeAgent {
    identifiers: Vec<ManagedIdentifier>,
    presentation_verified: bool,
    credential_verified: bool,
    credential_errors: bool,
    pub list_calls: AtomicUsize,
    pub import_calls: AtomicUsize,
    pub sign_calls: AtomicUsize,
    pub verify_presentation_calls: AtomicUsize,
    pub verify_typed_data_calls: AtomicUsize,
    pub verify_credential_calls: AtomicUsize,
    pub signed: Mutex<Vec<(UnsignedCredential, ProofFormat, bool)>>,
    pub imported: Mutex<Vec<ImportableIdentity>>,
}

impl FakeAgent {
    /// An agent that accepts every signature.
    pub fn accepting() -> Self {
        Self {
            presentation_verified: true,
            credential_verified: true,
            ..Default::default()
        }
    }

    pub fn with_identifiers(mut self, dids: &[&str]) -> Self {
        self.identifiers = dids
            .iter()
            .map(|did| ManagedIdentifier {
                did: did.to_string(),
                provider: Some("did:ethr:goerli".into()),
            })
            .collect();
        self
    }

    pub fn rejecting_presentations(mut self) -> Self {
        self.presentation_verified = false;
        self
    }

    pub fn rejecting_credentials(mut self) -> Self {
        self.credential_verified = false;
        self
    }

    /// Credential verification calls fail instead of answering.
    pub fn failing_credentials(mut self) -> Self {
        self.credential_errors = true;
        self
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialAgent for FakeAgent {
    async fn list_managed_identifiers(&self) -> Result<Vec<ManagedIdentifier>, AgentError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.identifiers.clone())
    }

    async fn import_identity(
        &self,
        identity: &ImportableIdentity,
    ) -> Result<ManagedIdentifier, AgentError> {
        self.import_calls.fetch_add(1, Ordering::SeqCst);
        self.imported.lock().unwrap().push(identity.clone());
        Ok(ManagedIdentifier {
            did: identity.did.clone(),
            provider: Some(identity.provider.clone()),
        })
    }

    async fn sign_credential(
        &self,
        credential: &UnsignedCredential,
        proof_format: ProofFormat,
        persist: bool,
    ) -> Result<VerifiableCredential, AgentError> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        self.signed
            .lock()
            .unwrap()
            .push((credential.clone(), proof_format, persist));
        Ok(VerifiableCredential {
            id: Some(credential.id.clone()),
            issuer: credential.issuer.clone(),
            context: json!(credential.context),
            credential_schema: Some(credential.credential_schema.clone()),
            types: json!(credential.types),
            issuance_date: Some(credential.issuance_date.clone()),
            credential_subject: credential.credential_subject.clone(),
            proof: CredentialProof {
                proof_type: "JwtProof2020".into(),
                jwt: Some(mint_jwt(&signed_payload(credential))),
            },
        })
    }

    async fn verify_presentation(
        &self,
        _presentation: &VerifiablePresentation,
        _domain: Option<&str>,
        _challenge: Option<&str>,
    ) -> Result<bool, AgentError> {
        self.verify_presentation_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.presentation_verified)
    }

    async fn verify_presentation_typed_data(
        &self,
        _presentation: &VerifiablePresentation,
    ) -> Result<bool, AgentError> {
        self.verify_typed_data_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.presentation_verified)
    }

    async fn verify_credential(&self, _credential: &Value) -> Result<bool, AgentError> {
        self.verify_credential_calls.fetch_add(1, Ordering::SeqCst);
        if self.credential_errors {
            return Err(AgentError::Status {
                method: "verifyCredential",
                status: 500,
                body: "agent unavailable".into(),
            });
        }
        Ok(self.credential_verified)
    }
}

/// Resolver serving canned documents; unknown DIDs fail to resolve.
#[derive(Default)]
pub struct FakeResolver {
    documents: HashMap<String, DIDDocument>,
    calls: AtomicUsize,
    last: Mutex<Option<String>>,
}

impl FakeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, did: &str, document: DIDDocument) -> Self {
        self.documents.insert(did.to_string(), document);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_resolved(&self) -> Option<String> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl DidResolver for FakeResolver {
    async fn resolve(&self, did: &str) -> Result<DIDDocument, ResolutionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(did.to_string());
        self.documents
            .get(did)
            .cloned()
            .ok_or_else(|| ResolutionError::NotFound {
                did: did.to_string(),
                reason: "notFound".into(),
            })
    }
}
