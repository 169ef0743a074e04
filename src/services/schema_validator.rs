// src/services/schema_validator.rs
//! Structural validation of credentials against the program completion
//! certificate schema.
//!
//! Two variants of the schema exist because the two proof families expose a
//! credential differently: a JWT-proof credential is a full structured object,
//! while a typed-data credential is reconstructed from token claims and may
//! omit the subject id.

use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

const PLAIN_SCHEMA: &str = include_str!("../schemas/program-completion-certificate.jwt.json");
const TYPED_DATA_SCHEMA: &str =
    include_str!("../schemas/program-completion-certificate.eip712.json");

/// Which schema a payload is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaVariant {
    /// Structured credentials carried with a JWT proof
    Plain,
    /// Credentials decoded from EIP-712 presentations
    TypedData,
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVariant::Plain => write!(f, "plain"),
            SchemaVariant::TypedData => write!(f, "typed-data"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("embedded {variant} schema is not valid JSON: {reason}")]
    Load { variant: SchemaVariant, reason: String },

    #[error("embedded {variant} schema does not compile: {reason}")]
    Build { variant: SchemaVariant, reason: String },

    #[error("payload violates {variant} schema: {}", violations.join("; "))]
    Violations {
        variant: SchemaVariant,
        violations: Vec<String>,
    },
}

/// Compiled validators for both schema variants. Cheap to share; compile
/// once at start-up.
pub struct SchemaValidator {
    plain: Validator,
    typed_data: Validator,
}

impl SchemaValidator {
    pub fn new() -> Result<Self, SchemaError> {
        Ok(Self {
            plain: compile(SchemaVariant::Plain, PLAIN_SCHEMA)?,
            typed_data: compile(SchemaVariant::TypedData, TYPED_DATA_SCHEMA)?,
        })
    }

    /// Checks `payload` against the `variant` schema and reports every
    /// violation.
    pub fn check(&self, payload: &Value, variant: SchemaVariant) -> Result<(), SchemaError> {
        let validator = match variant {
            SchemaVariant::Plain => &self.plain,
            SchemaVariant::TypedData => &self.typed_data,
        };
        let violations: Vec<String> = validator
            .iter_errors(payload)
            .map(|e| {
                let path = e.instance_path.to_string();
                if path.is_empty() {
                    format!("(root): {e}")
                } else {
                    format!("{path}: {e}")
                }
            })
            .collect();

        if violations.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::Violations { variant, violations })
        }
    }
}

fn compile(variant: SchemaVariant, source: &str) -> Result<Validator, SchemaError> {
    let schema: Value = serde_json::from_str(source).map_err(|e| SchemaError::Load {
        variant,
        reason: e.to_string(),
    })?;

    let mut opts = jsonschema::options();
    opts.with_draft(Draft::Draft7);
    opts.should_validate_formats(true);
    opts.build(&schema).map_err(|e| SchemaError::Build {
        variant,
        reason: e.to_string(),
    })
}
