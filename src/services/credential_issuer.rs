// src/services/credential_issuer.rs
//! Credential Issuer Service
//!
//! Builds program completion certificates and has the Credential Agent sign
//! them with the first identity the agent manages. When the agent manages no
//! identity yet, the configured issuer key is imported instead and the call
//! reports that issuance is not ready; the caller retries afterwards.

use crate::agent::{CredentialAgent, ImportableIdentity, ImportableKey, ProofFormat};
use crate::config::{CertificateSettings, IssuerSettings};
use crate::error::IdentityError;
use crate::models::credential::{
    CredentialSchema, CredentialSubject, Issuer, UnsignedCredential, VerifiableCredential,
    CREDENTIAL_CONTEXTS, CREDENTIAL_SCHEMA_ID, CREDENTIAL_SCHEMA_TYPE, CREDENTIAL_TYPES,
};
use crate::services::identifier::EthrDid;
use chrono::{SecondsFormat, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

/// Service issuing program completion certificates through the agent.
#[derive(Clone)]
pub struct CredentialIssuer {
    /// Signs credentials and holds the issuer key
    agent: Arc<dyn CredentialAgent>,

    /// Identity imported when the agent has none
    bootstrap: IssuerSettings,

    /// Fixed claims of every certificate
    certificate: CertificateSettings,
}

impl CredentialIssuer {
    pub fn new(
        agent: Arc<dyn CredentialAgent>,
        bootstrap: IssuerSettings,
        certificate: CertificateSettings,
    ) -> Self {
        Self {
            agent,
            bootstrap,
            certificate,
        }
    }

    /// Issues a certificate to `claimer` naming `name` as the learner.
    ///
    /// # Errors
    /// - `InvalidIdentifier` if `claimer` is not a valid `did:ethr` identifier;
    ///   the agent is not contacted
    /// - see [`issue`](Self::issue)
    pub async fn issue_credential(
        &self,
        name: &str,
        claimer: &str,
    ) -> Result<VerifiableCredential, IdentityError> {
        let subject: EthrDid = claimer.parse()?;
        debug!(
            "claimer address {} on network {}",
            subject.address(),
            subject.network().unwrap_or("mainnet")
        );
        let claims = CredentialSubject {
            id: subject.to_string(),
            accomplishment_type: self.certificate.accomplishment_type.clone(),
            learner_name: name.to_string(),
            achievement: self.certificate.achievement.clone(),
            course_provider: self.certificate.course_provider.clone(),
        };
        self.issue(claims).await
    }

    /// Signs a certificate carrying `claims`; `claims.id` is the subject.
    ///
    /// # Errors
    /// - `IssuanceFailure` when the agent had no identity; the configured
    ///   issuer has been imported by the time this returns
    /// - `Agent` when the agent cannot be reached or refuses a call
    pub async fn issue(
        &self,
        claims: CredentialSubject,
    ) -> Result<VerifiableCredential, IdentityError> {
        let identifiers = self.agent.list_managed_identifiers().await?;
        let Some(issuer) = identifiers.into_iter().next() else {
            return Err(self.bootstrap_identity().await?);
        };

        info!("issuing certificate to {} as {}", claims.id, issuer.did);
        let unsigned = Self::build_credential(issuer.did, claims);
        let signed = self
            .agent
            .sign_credential(&unsigned, ProofFormat::Jwt, false)
            .await?;
        debug!(
            "agent signed certificate for {} as {}",
            signed.credential_subject.id,
            signed.issuer.id()
        );
        Ok(signed)
    }

    /// Unsigned certificate with a fresh id and the current time.
    fn build_credential(issuer: String, claims: CredentialSubject) -> UnsignedCredential {
        UnsignedCredential {
            id: Uuid::new_v4().to_string(),
            issuer: Issuer::Object { id: issuer },
            context: CREDENTIAL_CONTEXTS.iter().map(|c| c.to_string()).collect(),
            credential_schema: CredentialSchema {
                id: CREDENTIAL_SCHEMA_ID.to_string(),
                schema_type: CREDENTIAL_SCHEMA_TYPE.to_string(),
            },
            types: CREDENTIAL_TYPES.iter().map(|t| t.to_string()).collect(),
            issuance_date: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            credential_subject: claims,
        }
    }

    /// Imports the configured issuer and returns the error to report for
    /// this call.
    async fn bootstrap_identity(&self) -> Result<IdentityError, IdentityError> {
        warn!(
            "agent manages no identifier, importing issuer {}",
            self.bootstrap.did
        );
        let identity = ImportableIdentity {
            did: self.bootstrap.did.clone(),
            provider: self.bootstrap.provider.clone(),
            keys: vec![ImportableKey {
                kms: self.bootstrap.kms.clone(),
                key_type: self.bootstrap.key_type.clone(),
                private_key_hex: self.bootstrap.private_key_hex.clone(),
            }],
        };
        let imported = self.agent.import_identity(&identity).await?;
        info!("imported issuer identity {}", imported.did);
        Ok(IdentityError::IssuanceFailure(format!(
            "issuer {} was just imported, retry issuance",
            imported.did
        )))
    }
}
