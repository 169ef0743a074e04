// src/models/credential.rs
//! Verifiable Credential data model.
//!
//! Follows the JSON shape of the
//! [W3C Verifiable Credentials Data Model](https://www.w3.org/TR/vc-data-model/)
//! as produced by the Credential Agent for the program completion
//! certificate.

use serde::{Deserialize, Serialize};

/// `@context` entries attached to every issued certificate.
pub const CREDENTIAL_CONTEXTS: [&str; 2] = [
    "https://www.w3.org/2018/credentials/v1",
    concat!(
        "https://beta.api.schemas.serto.id/v1/public/",
        "program-completion-certificate/1.0/ld-context.json"
    ),
];

/// JSON schema the certificate declares conformance to.
pub const CREDENTIAL_SCHEMA_ID: &str = concat!(
    "https://beta.api.schemas.serto.id/v1/public/",
    "program-completion-certificate/1.0/json-schema.json"
);

pub const CREDENTIAL_SCHEMA_TYPE: &str = "JsonSchemaValidator2018";

/// Type tags of the certificate.
pub const CREDENTIAL_TYPES: [&str; 2] = ["VerifiableCredential", "ProgramCompletionCertificate"];

/// Claims about the credential subject.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialSubject {
    /// DID of the subject
    /// Example: "did:ethr:goerli:0x6A24687621cDD1C77Bb6aCbBEE910d0C517eB443"
    pub id: String,
    pub accomplishment_type: String,
    pub learner_name: String,
    pub achievement: String,
    /// URI of the institution that ran the program
    pub course_provider: String,
}

/// Issuer reference. Agents emit the object form; the string form is accepted
/// on input.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Issuer {
    Object { id: String },
    Id(String),
}

impl Issuer {
    pub fn id(&self) -> &str {
        match self {
            Issuer::Object { id } | Issuer::Id(id) => id,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialSchema {
    pub id: String,
    #[serde(rename = "type")]
    pub schema_type: String,
}

/// A credential before the agent attaches a proof.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedCredential {
    pub id: String,
    pub issuer: Issuer,
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    pub credential_schema: CredentialSchema,
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// RFC 3339 timestamp
    pub issuance_date: String,
    pub credential_subject: CredentialSubject,
}

/// Proof attached by the agent. For JWT-proof credentials `jwt` holds the
/// compact token whose payload restates the credential.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CredentialProof {
    #[serde(rename = "type")]
    pub proof_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
}

/// A signed credential as returned by the agent.
///
/// The agent may drop or add members while signing, so everything except the
/// subject, issuer and proof is optional here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub issuer: Issuer,
    #[serde(rename = "@context", default)]
    pub context: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential_schema: Option<CredentialSchema>,
    #[serde(rename = "type", default)]
    pub types: serde_json::Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuance_date: Option<String>,
    pub credential_subject: CredentialSubject,
    pub proof: CredentialProof,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issuer_accepts_both_forms() {
        let object: Issuer = serde_json::from_value(json!({ "id": "did:ethr:0x1" })).unwrap();
        let bare: Issuer = serde_json::from_value(json!("did:ethr:0x1")).unwrap();
        assert_eq!(object.id(), "did:ethr:0x1");
        assert_eq!(bare.id(), "did:ethr:0x1");
        assert_eq!(serde_json::to_value(&object).unwrap(), json!({ "id": "did:ethr:0x1" }));
    }

    #[test]
    fn test_unsigned_credential_uses_wire_names() {
        let unsigned = UnsignedCredential {
            id: "cred-1".into(),
            issuer: Issuer::Object { id: "did:ethr:goerli:0x1".into() },
            context: CREDENTIAL_CONTEXTS.iter().map(|c| c.to_string()).collect(),
            credential_schema: CredentialSchema {
                id: CREDENTIAL_SCHEMA_ID.into(),
                schema_type: CREDENTIAL_SCHEMA_TYPE.into(),
            },
            types: CREDENTIAL_TYPES.iter().map(|t| t.to_string()).collect(),
            issuance_date: "2024-01-01T00:00:00.000Z".into(),
            credential_subject: CredentialSubject {
                id: "did:ethr:goerli:0x2".into(),
                accomplishment_type: "Developer Certificate".into(),
                learner_name: "Ada".into(),
                achievement: "Certified Solidity Developer Test".into(),
                course_provider: "https://blockchain-lab.um.si/".into(),
            },
        };

        let value = serde_json::to_value(&unsigned).unwrap();
        assert_eq!(value["@context"][0], "https://www.w3.org/2018/credentials/v1");
        assert_eq!(value["credentialSchema"]["type"], "JsonSchemaValidator2018");
        assert_eq!(value["type"][1], "ProgramCompletionCertificate");
        assert_eq!(value["issuanceDate"], "2024-01-01T00:00:00.000Z");
        assert_eq!(value["credentialSubject"]["learnerName"], "Ada");
    }
}
