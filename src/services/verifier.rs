// src/services/verifier.rs
//! Presentation verification.
//!
//! Decides whether a Verifiable Presentation proves that a wallet address
//! controls, or is delegated to act for, the subject of the credentials it
//! carries. The decision combines:
//! - agent signature checks on the presentation and on every credential
//! - schema validation of every credential
//! - reconciliation of the presented credential with its signed payload
//! - subject, issuer and holder policy checks, including delegate lookup
//!
//! Callers only ever see a boolean. Reasons for rejection are logged.

use crate::agent::{AgentError, CredentialAgent};
use crate::models::presentation::VerifiablePresentation;
use crate::services::delegate_resolver::DelegateResolver;
use crate::services::identifier::address_of;
use crate::services::schema_validator::{SchemaError, SchemaValidator, SchemaVariant};
use crate::utils::jwt::{decode_payload, JwtDecodeError};
use chrono::{DateTime, SecondsFormat};
use futures::future::join_all;
use futures::FutureExt;
use log::{debug, error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use thiserror::Error;

pub const JWT_PROOF_TYPE: &str = "JwtProof2020";
pub const EIP712_PROOF_TYPE: &str = "EthereumEip712Signature2021";

/// Encoding family of a presentation and of every credential inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProofFamily {
    /// Structured credentials, each carrying a `proof.jwt`
    Jwt,
    /// Credentials embedded as compact JWT strings
    TypedData,
}

impl ProofFamily {
    pub fn from_proof_type(proof_type: &str) -> Option<Self> {
        match proof_type {
            JWT_PROOF_TYPE => Some(ProofFamily::Jwt),
            EIP712_PROOF_TYPE => Some(ProofFamily::TypedData),
            _ => None,
        }
    }

    fn schema_variant(self) -> SchemaVariant {
        match self {
            ProofFamily::Jwt => SchemaVariant::Plain,
            ProofFamily::TypedData => SchemaVariant::TypedData,
        }
    }

    /// Typed-data wallets do not preserve address case.
    fn same_address(self, a: &str, b: &str) -> bool {
        match self {
            ProofFamily::Jwt => a == b,
            ProofFamily::TypedData => a.eq_ignore_ascii_case(b),
        }
    }

    fn same_holder(self, holder: &str, subject: &str) -> bool {
        match self {
            ProofFamily::Jwt => holder == subject,
            ProofFamily::TypedData => match (address_of(holder), address_of(subject)) {
                (Some(h), Some(s)) => h.eq_ignore_ascii_case(s),
                _ => false,
            },
        }
    }

    fn extract(self, embedded: &Value) -> Result<ExtractedCredential, Rejection> {
        match self {
            ProofFamily::Jwt => extract_structured(embedded),
            ProofFamily::TypedData => extract_encoded(embedded),
        }
    }
}

/// How per-credential verdicts combine into the presentation verdict.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationPolicy {
    /// At least one credential must verify
    #[default]
    AnyValid,
    /// Every credential must verify
    AllValid,
}

impl AggregationPolicy {
    pub fn aggregate(self, verdicts: &[bool]) -> bool {
        match self {
            AggregationPolicy::AnyValid => verdicts.iter().any(|v| *v),
            AggregationPolicy::AllValid => !verdicts.is_empty() && verdicts.iter().all(|v| *v),
        }
    }
}

/// Why a presentation as a whole could not be evaluated.
#[derive(Error, Debug)]
pub enum VerificationError {
    #[error("unsupported proof type {0:?}")]
    UnsupportedProofType(String),

    #[error("presentation signature could not be checked: {0}")]
    Agent(#[from] AgentError),
}

/// Why a single embedded credential was rejected.
#[derive(Error, Debug)]
enum Rejection {
    #[error("credential could not be decoded: {0}")]
    Malformed(String),

    #[error("credential signature rejected by agent")]
    Signature,

    #[error("credential signature could not be checked: {0}")]
    Agent(#[from] AgentError),

    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("signed {0} differs from the presented credential")]
    ContentMismatch(&'static str),

    #[error("credential subject {subject} does not belong to {claimed}")]
    SubjectMismatch { subject: String, claimed: String },

    #[error("issuer {0} is not trusted")]
    UntrustedIssuer(String),

    #[error("holder {holder} is not a delegate of {subject}")]
    NotDelegated { holder: String, subject: String },
}

impl From<JwtDecodeError> for Rejection {
    fn from(e: JwtDecodeError) -> Self {
        Rejection::Malformed(e.to_string())
    }
}

/// Claims of a JWT credential token.
#[derive(Deserialize, Debug, Default)]
struct CredentialTokenClaims {
    sub: Option<String>,
    iss: Option<String>,
    nbf: Option<i64>,
    #[serde(default)]
    vc: Value,
}

/// The fields that must agree between a credential and its signed payload.
#[derive(Debug, Default, PartialEq)]
struct ClaimSet {
    subject: Option<String>,
    issuer: Option<String>,
    accomplishment_type: Option<String>,
    achievement: Option<String>,
}

impl ClaimSet {
    /// Claims read from a `vc` claim or a structured credential.
    fn from_credential(credential: &Value) -> Self {
        Self {
            subject: string_at(credential, "/credentialSubject/id"),
            issuer: issuer_id(credential),
            accomplishment_type: string_at(credential, "/credentialSubject/accomplishmentType"),
            achievement: string_at(credential, "/credentialSubject/achievement"),
        }
    }
}

/// An embedded credential decoded by its family's rules.
struct ExtractedCredential {
    /// Document handed to the schema validator
    schema_view: Value,
    /// Claims as the credential presents them
    presented: ClaimSet,
    /// Claims as covered by the signature
    signed: ClaimSet,
}

impl ExtractedCredential {
    fn reconcile(&self) -> Result<(), Rejection> {
        let (p, s) = (&self.presented, &self.signed);
        if p.subject != s.subject {
            return Err(Rejection::ContentMismatch("subject"));
        }
        if p.issuer != s.issuer {
            return Err(Rejection::ContentMismatch("issuer"));
        }
        if p.accomplishment_type != s.accomplishment_type {
            return Err(Rejection::ContentMismatch("accomplishmentType"));
        }
        if p.achievement != s.achievement {
            return Err(Rejection::ContentMismatch("achievement"));
        }
        Ok(())
    }
}

fn string_at(value: &Value, pointer: &str) -> Option<String> {
    value.pointer(pointer).and_then(Value::as_str).map(str::to_string)
}

/// `issuer` may be `{ "id": ... }` or a bare string.
fn issuer_id(credential: &Value) -> Option<String> {
    match credential.get("issuer")? {
        Value::String(id) => Some(id.clone()),
        issuer => string_at(issuer, "/id"),
    }
}

fn extract_structured(embedded: &Value) -> Result<ExtractedCredential, Rejection> {
    if !embedded.is_object() {
        return Err(Rejection::Malformed("expected a structured credential".into()));
    }
    let token = embedded
        .pointer("/proof/jwt")
        .and_then(Value::as_str)
        .ok_or_else(|| Rejection::Malformed("credential has no proof.jwt".into()))?;
    let claims: CredentialTokenClaims = decode_payload(token)?;

    let mut signed = ClaimSet::from_credential(&claims.vc);
    signed.subject = claims.sub;
    signed.issuer = claims.iss;

    Ok(ExtractedCredential {
        schema_view: embedded.clone(),
        presented: ClaimSet::from_credential(embedded),
        signed,
    })
}

fn extract_encoded(embedded: &Value) -> Result<ExtractedCredential, Rejection> {
    let token = embedded
        .as_str()
        .ok_or_else(|| Rejection::Malformed("expected an encoded credential".into()))?;
    let claims: CredentialTokenClaims = decode_payload(token)?;
    if !claims.vc.is_object() {
        return Err(Rejection::Malformed("token carries no vc claim".into()));
    }

    // The `vc` claim may restate subject and issuer; when it does they have
    // to agree with `sub` and `iss`.
    let mut presented = ClaimSet::from_credential(&claims.vc);
    presented.subject = presented.subject.or_else(|| claims.sub.clone());
    presented.issuer = presented.issuer.or_else(|| claims.iss.clone());

    let mut signed = ClaimSet::from_credential(&claims.vc);
    signed.subject = claims.sub.clone();
    signed.issuer = claims.iss.clone();

    Ok(ExtractedCredential {
        schema_view: normalize_token_credential(&claims),
        presented,
        signed,
    })
}

/// Rebuilds the credential a token stands for: `iss`, `nbf` and `sub` fill in
/// `issuer`, `issuanceDate` and `credentialSubject.id` when the `vc` claim
/// leaves them out. `jti` is not carried over; issued ids are bare UUIDs, not
/// URIs.
fn normalize_token_credential(claims: &CredentialTokenClaims) -> Value {
    let mut view = claims.vc.clone();
    let Some(map) = view.as_object_mut() else {
        return view;
    };

    if let Some(iss) = &claims.iss {
        map.entry("issuer").or_insert_with(|| json!({ "id": iss }));
    }
    if let Some(date) = claims.nbf.and_then(|nbf| DateTime::from_timestamp(nbf, 0)) {
        map.entry("issuanceDate")
            .or_insert_with(|| json!(date.to_rfc3339_opts(SecondsFormat::Millis, true)));
    }
    if let (Some(sub), Some(Value::Object(subject))) =
        (&claims.sub, map.get_mut("credentialSubject"))
    {
        subject.entry("id").or_insert_with(|| json!(sub));
    }
    view
}

/// The presentation verification engine.
///
/// Holds only shared, read-only collaborators; one instance serves all
/// requests concurrently.
#[derive(Clone)]
pub struct PresentationVerifier {
    agent: Arc<dyn CredentialAgent>,
    delegates: DelegateResolver,
    schemas: Arc<SchemaValidator>,
    trusted_issuer: String,
    policy: AggregationPolicy,
}

impl PresentationVerifier {
    pub fn new(
        agent: Arc<dyn CredentialAgent>,
        delegates: DelegateResolver,
        schemas: Arc<SchemaValidator>,
        trusted_issuer: impl Into<String>,
        policy: AggregationPolicy,
    ) -> Self {
        Self {
            agent,
            delegates,
            schemas,
            trusted_issuer: trusted_issuer.into(),
            policy,
        }
    }

    /// Verifies `presentation` for the wallet at `claimed_address`.
    ///
    /// Never fails: every error, including a panic inside the evaluation,
    /// yields `false`.
    pub async fn verify_presentation(
        &self,
        presentation: &VerifiablePresentation,
        domain: Option<&str>,
        challenge: Option<&str>,
        claimed_address: &str,
    ) -> bool {
        let evaluation =
            AssertUnwindSafe(self.evaluate(presentation, domain, challenge, claimed_address))
                .catch_unwind()
                .await;

        match evaluation {
            Ok(Ok(verdict)) => {
                info!(
                    "presentation from {} verified for {}: {}",
                    presentation.holder, claimed_address, verdict
                );
                verdict
            }
            Ok(Err(e)) => {
                warn!("presentation from {} rejected: {}", presentation.holder, e);
                false
            }
            Err(_) => {
                error!(
                    "presentation verification for {} panicked",
                    presentation.holder
                );
                false
            }
        }
    }

    async fn evaluate(
        &self,
        presentation: &VerifiablePresentation,
        domain: Option<&str>,
        challenge: Option<&str>,
        claimed_address: &str,
    ) -> Result<bool, VerificationError> {
        let proof_type = &presentation.proof.proof_type;
        let family = ProofFamily::from_proof_type(proof_type)
            .ok_or_else(|| VerificationError::UnsupportedProofType(proof_type.clone()))?;
        debug!("presentation from {} uses {:?} proofs", presentation.holder, family);

        let presentation_verified = match family {
            ProofFamily::Jwt => {
                self.agent
                    .verify_presentation(presentation, domain, challenge)
                    .await?
            }
            ProofFamily::TypedData => {
                self.agent
                    .verify_presentation_typed_data(presentation)
                    .await?
            }
        };
        if !presentation_verified {
            info!("presentation signature from {} rejected", presentation.holder);
            return Ok(false);
        }

        if presentation.verifiable_credential.is_empty() {
            info!("presentation from {} carries no credentials", presentation.holder);
            return Ok(false);
        }

        let checks = presentation
            .verifiable_credential
            .iter()
            .enumerate()
            .map(|(index, embedded)| {
                self.verify_embedded(family, index, &presentation.holder, embedded, claimed_address)
            });
        let verdicts = join_all(checks).await;
        debug!("credential verdicts for {}: {:?}", presentation.holder, verdicts);

        Ok(self.policy.aggregate(&verdicts))
    }

    async fn verify_embedded(
        &self,
        family: ProofFamily,
        index: usize,
        holder: &str,
        embedded: &Value,
        claimed_address: &str,
    ) -> bool {
        match self.check_credential(family, holder, embedded, claimed_address).await {
            Ok(()) => true,
            Err(rejection) => {
                info!("credential #{} from {} rejected: {}", index, holder, rejection);
                false
            }
        }
    }

    async fn check_credential(
        &self,
        family: ProofFamily,
        holder: &str,
        embedded: &Value,
        claimed_address: &str,
    ) -> Result<(), Rejection> {
        let credential = family.extract(embedded)?;
        if !self.agent.verify_credential(embedded).await? {
            return Err(Rejection::Signature);
        }

        self.schemas
            .check(&credential.schema_view, family.schema_variant())?;
        credential.reconcile()?;

        let subject = credential.presented.subject.as_deref().unwrap_or_default();
        let subject_address = address_of(subject)
            .filter(|address| family.same_address(address, claimed_address))
            .ok_or_else(|| Rejection::SubjectMismatch {
                subject: subject.to_string(),
                claimed: claimed_address.to_string(),
            })?;

        let issuer = credential.presented.issuer.as_deref().unwrap_or_default();
        if issuer != self.trusted_issuer {
            return Err(Rejection::UntrustedIssuer(issuer.to_string()));
        }

        if !family.same_holder(holder, subject) {
            let delegated = match address_of(holder) {
                Some(holder_address) => {
                    self.delegates
                        .is_delegate(subject_address, holder_address)
                        .await
                }
                None => false,
            };
            if !delegated {
                return Err(Rejection::NotDelegated {
                    holder: holder.to_string(),
                    subject: subject.to_string(),
                });
            }
        }

        Ok(())
    }
}
