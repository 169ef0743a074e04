// src/main.rs

//! # Verifiable Credential Service - Main Entry Point
//!
//! Issues program completion certificates to `did:ethr` holders and verifies
//! the presentations they later submit.
//!
//! ## Architecture Overview
//! 1. **Agent Layer**: `RemoteAgent` talks to the Credential Agent that holds keys and signs
//! 2. **Resolution Layer**: `UniversalResolverClient` resolves delegate DID documents
//! 3. **Services Layer**: issuance, presentation verification and the HTTP API
//!
//! ## Configuration
//! Defaults, then `config/default.*`, then `VC_*` environment variables
//! (a `.env` file is read first). See [`config::Settings`].

use crate::agent::RemoteAgent;
use crate::blockchain::UniversalResolverClient;
use crate::config::Settings;
use crate::services::api_server::ApiServer;
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::delegate_resolver::DelegateResolver;
use crate::services::schema_validator::SchemaValidator;
use crate::services::verifier::PresentationVerifier;
use anyhow::Context;
use dotenv::dotenv;
use log::info;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

mod agent;         // Credential Agent client
mod blockchain;    // DID resolution
mod config;        // Layered settings
mod error;         // Service error taxonomy
mod models;        // Data structures
mod services;      // Business logic and API
mod utils;         // Helper functions

#[cfg(test)]
mod testing;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = Settings::load().context("failed to load configuration")?;
    info!(
        "using agent {} and resolver {} ({})",
        settings.agent.url, settings.resolver.url, settings.resolver.network
    );

    let agent = Arc::new(RemoteAgent::new(
        &settings.agent.url,
        settings.agent.api_key.clone(),
    ));
    let resolver = Arc::new(UniversalResolverClient::new(&settings.resolver.url));
    let schemas = Arc::new(SchemaValidator::new().context("credential schemas do not compile")?);

    let trusted_issuer = settings.issuer.did.clone();
    let credential_issuer = CredentialIssuer::new(
        agent.clone(),
        settings.issuer.clone(),
        settings.certificate.clone(),
    );
    let verifier = PresentationVerifier::new(
        agent,
        DelegateResolver::new(resolver, settings.resolver.network.clone()),
        schemas,
        trusted_issuer.clone(),
        settings.verification.policy,
    );

    let api_server = ApiServer::new(credential_issuer, verifier, trusted_issuer);

    let host: IpAddr = settings
        .server
        .host
        .parse()
        .with_context(|| format!("invalid server host {}", settings.server.host))?;
    let addr = SocketAddr::new(host, settings.server.port);
    info!("Available endpoints:");
    info!("- GET  /api/vc");
    info!("- POST /api/vc/issue-vc");
    info!("- POST /api/vc/verify-vp");
    info!("- POST /api/vc/generate-challenge");

    api_server.run(addr).await
}
