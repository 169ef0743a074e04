// src/config.rs
//! Layered service configuration.
//!
//! Sources, lowest precedence first:
//! 1. built-in defaults
//! 2. optional `config/default.{toml,yaml,json}` file
//! 3. environment variables prefixed with `VC`, sections separated by `__`
//!    (for example `VC_ISSUER__DID` or `VC_AGENT__URL`)
//!
//! A section name on its own is a key too: a flat `VC_ISSUER=did:ethr:...`
//! replaces the whole `issuer` table with a string and loading fails. Use
//! `VC_ISSUER__DID` instead.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File, Map};
use serde::Deserialize;

use crate::services::verifier::AggregationPolicy;

const DEFAULT_ISSUER_DID: &str = concat!(
    "did:ethr:goerli:",
    "0x0241abd662da06d0af2f0152a80bc037f65a7f901160cfe1eb35ef3f0c532a2a4d"
);

/// Complete runtime settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub agent: AgentSettings,
    pub resolver: ResolverSettings,
    pub issuer: IssuerSettings,
    pub certificate: CertificateSettings,
    pub verification: VerificationSettings,
}

/// HTTP listener.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Remote Credential Agent endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSettings {
    pub url: String,
    #[serde(default)]
    pub api_key: Option<String>,
}

/// DID Resolution Service endpoint and the network delegates are looked up on.
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverSettings {
    pub url: String,
    pub network: String,
}

/// Trusted issuer identity. `did` doubles as the expected presentation domain
/// and as the identity imported when the agent has none.
#[derive(Clone, Deserialize)]
pub struct IssuerSettings {
    pub did: String,
    pub provider: String,
    pub kms: String,
    pub key_type: String,
    #[serde(default)]
    pub private_key_hex: String,
}

// Keeps the key out of `{:?}` output.
impl std::fmt::Debug for IssuerSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuerSettings")
            .field("did", &self.did)
            .field("provider", &self.provider)
            .field("kms", &self.kms)
            .field("key_type", &self.key_type)
            .field("private_key_hex", &"<redacted>")
            .finish()
    }
}

/// Fixed claims of the program completion certificate.
#[derive(Debug, Clone, Deserialize)]
pub struct CertificateSettings {
    pub accomplishment_type: String,
    pub achievement: String,
    pub course_provider: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VerificationSettings {
    pub policy: AggregationPolicy,
}

impl Settings {
    /// Loads settings from defaults, the optional config file and the
    /// environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(None)
    }

    /// Same as [`Settings::load`], reading `VC_*` variables from `env`
    /// instead of the process environment when given.
    fn load_with(env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(
                Environment::with_prefix("VC")
                    .prefix_separator("_")
                    .separator("__")
                    .source(env),
            )
            .build()?
            .try_deserialize()
    }

    /// Builder pre-populated with every default value.
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000_i64)?
            .set_default("agent.url", "http://localhost:3332")?
            .set_default("resolver.url", "https://dev.uniresolver.io")?
            .set_default("resolver.network", "goerli")?
            .set_default("issuer.did", DEFAULT_ISSUER_DID)?
            .set_default("issuer.provider", "did:ethr:goerli")?
            .set_default("issuer.kms", "local")?
            .set_default("issuer.key_type", "Secp256k1")?
            .set_default("certificate.accomplishment_type", "Developer Certificate")?
            .set_default("certificate.achievement", "Certified Solidity Developer Test")?
            .set_default("certificate.course_provider", "https://blockchain-lab.um.si/")?
            .set_default("verification.policy", "any_valid")
    }
}
