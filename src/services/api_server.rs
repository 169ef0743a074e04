// src/services/api_server.rs
//! REST API for credential issuance and presentation verification.
//!
//! All routes live under `/api/vc`:
//! - `GET  /api/vc` - liveness message
//! - `POST /api/vc/issue-vc` - issue a program completion certificate
//! - `POST /api/vc/verify-vp` - verify a presentation for a wallet address
//! - `POST /api/vc/generate-challenge` - nonce and domain for a new presentation

use crate::error::IdentityError;
use crate::models::presentation::VerifiablePresentation;
use crate::services::challenge::{generate_challenge, Challenge};
use crate::services::credential_issuer::CredentialIssuer;
use crate::services::verifier::PresentationVerifier;
use axum::{
    extract::{Json, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use log::{error, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;

/// Request payload for issuing a certificate
#[derive(Deserialize)]
struct IssueVcRequest {
    name: Option<String>,
    id: Option<String>,
}

/// Request payload for verifying a presentation
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyVpRequest {
    vp: Option<Value>,
    domain: Option<String>,
    challenge: Option<String>,
    #[serde(default)]
    subject_address: String,
}

/// Errors a handler reports to the client.
#[derive(Error, Debug)]
enum ApiError {
    #[error("{0}")]
    BadRequest(&'static str),

    #[error(transparent)]
    Identity(#[from] IdentityError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) | ApiError::Identity(IdentityError::InvalidIdentifier(_)) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Identity(IdentityError::IssuanceFailure(_)) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ApiError::Identity(IdentityError::Agent(_)) => StatusCode::BAD_GATEWAY,
        };
        if status.is_server_error() {
            error!("request failed: {}", self);
        }
        let body = json!({
            "error": {
                "code": status.as_u16(),
                "message": self.to_string(),
            }
        });
        (status, Json(body)).into_response()
    }
}

/// API server state shared by every handler
#[derive(Clone)]
pub struct ApiServer {
    /// Service issuing certificates
    credential_issuer: Arc<CredentialIssuer>,

    /// Presentation verification engine
    verifier: Arc<PresentationVerifier>,

    /// Domain handed out with every challenge
    domain: String,
}

impl ApiServer {
    pub fn new(
        credential_issuer: CredentialIssuer,
        verifier: PresentationVerifier,
        domain: impl Into<String>,
    ) -> Self {
        ApiServer {
            credential_issuer: Arc::new(credential_issuer),
            verifier: Arc::new(verifier),
            domain: domain.into(),
        }
    }

    /// Routes with the server state attached.
    pub fn router(&self) -> Router {
        let vc_routes = Router::new()
            .route("/", get(Self::default_handler))
            .route("/issue-vc", post(Self::issue_vc_handler))
            .route("/verify-vp", post(Self::verify_vp_handler))
            .route("/generate-challenge", post(Self::generate_challenge_handler));

        Router::new()
            .nest("/api/vc", vc_routes)
            .fallback(Self::not_found_handler)
            .layer(CorsLayer::permissive())
            .with_state(Arc::new(self.clone()))
    }

    /// Binds `addr` and serves requests until the process stops.
    pub async fn run(&self, addr: SocketAddr) -> anyhow::Result<()> {
        let app = self.router();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("API server listening on http://{}", addr);
        axum::serve(listener, app).await?;
        Ok(())
    }

    async fn default_handler() -> impl IntoResponse {
        Json(json!({ "text": "You've reached the credential router's default method" }))
    }

    /// # Responses
    /// - 200 OK: the signed certificate
    /// - 400 Bad Request: missing field or invalid identifier
    /// - 503 Service Unavailable: issuer identity was just bootstrapped, retry
    /// - 502 Bad Gateway: agent failure
    async fn issue_vc_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<IssueVcRequest>,
    ) -> Result<Response, ApiError> {
        let (Some(name), Some(id)) = (payload.name, payload.id) else {
            return Err(ApiError::BadRequest("ID or Name not provided"));
        };
        let credential = state.credential_issuer.issue_credential(&name, &id).await?;
        Ok(Json(credential).into_response())
    }

    /// Answers with a bare JSON boolean. Presentations that do not even
    /// deserialize are answered with `false`.
    async fn verify_vp_handler(
        State(state): State<Arc<ApiServer>>,
        Json(payload): Json<VerifyVpRequest>,
    ) -> Result<Response, ApiError> {
        let vp = payload
            .vp
            .ok_or(ApiError::BadRequest("Verifiable presentation not provided"))?;

        let verified = match serde_json::from_value::<VerifiablePresentation>(vp) {
            Ok(presentation) => {
                state
                    .verifier
                    .verify_presentation(
                        &presentation,
                        payload.domain.as_deref(),
                        payload.challenge.as_deref(),
                        &payload.subject_address,
                    )
                    .await
            }
            Err(e) => {
                warn!("presentation could not be parsed: {}", e);
                false
            }
        };
        Ok(Json(verified).into_response())
    }

    async fn generate_challenge_handler(State(state): State<Arc<ApiServer>>) -> Json<Challenge> {
        Json(generate_challenge(&state.domain))
    }

    async fn not_found_handler(uri: Uri) -> impl IntoResponse {
        (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": {
                    "code": StatusCode::NOT_FOUND.as_u16(),
                    "message": format!("no route for {}", uri.path()),
                }
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::delegate_resolver::DelegateResolver;
    use crate::services::schema_validator::SchemaValidator;
    use crate::services::verifier::{AggregationPolicy, JWT_PROOF_TYPE};
    use crate::testing::{
        certificate_settings, issuer_settings, presentation, structured_credential, subject_did,
        FakeAgent, FakeResolver, SUBJECT_ADDRESS, TRUSTED_ISSUER,
    };
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    fn server(agent: FakeAgent) -> ApiServer {
        let agent = Arc::new(agent);
        let issuer =
            CredentialIssuer::new(agent.clone(), issuer_settings(), certificate_settings());
        let verifier = PresentationVerifier::new(
            agent,
            DelegateResolver::new(Arc::new(FakeResolver::new()), "goerli"),
            Arc::new(SchemaValidator::new().unwrap()),
            TRUSTED_ISSUER,
            AggregationPolicy::AnyValid,
        );
        ApiServer::new(issuer, verifier, TRUSTED_ISSUER)
    }

    async fn send(
        server: &ApiServer,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();
        let response = server.router().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_default_route() {
        let (status, body) = send(&server(FakeAgent::accepting()), "GET", "/api/vc", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["text"].as_str().unwrap().contains("default method"));
    }

    #[tokio::test]
    async fn test_issue_vc_returns_signed_credential() {
        let server = server(FakeAgent::accepting().with_identifiers(&[TRUSTED_ISSUER]));
        let (status, body) = send(
            &server,
            "POST",
            "/api/vc/issue-vc",
            Some(json!({ "name": "Ada", "id": subject_did() })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["credentialSubject"]["learnerName"], "Ada");
        assert_eq!(body["issuer"]["id"], TRUSTED_ISSUER);
        assert_eq!(body["proof"]["type"], "JwtProof2020");
    }

    #[tokio::test]
    async fn test_issue_vc_error_statuses() {
        let ready = server(FakeAgent::accepting().with_identifiers(&[TRUSTED_ISSUER]));

        let missing_id = Some(json!({ "name": "Ada" }));
        let (status, _) = send(&ready, "POST", "/api/vc/issue-vc", missing_id).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &ready,
            "POST",
            "/api/vc/issue-vc",
            Some(json!({ "name": "Ada", "id": "did:ethr:goerli:0x12" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Identifier did:ethr:goerli:0x12 is not valid!");

        let bootstrapping = server(FakeAgent::accepting());
        let (status, body) = send(
            &bootstrapping,
            "POST",
            "/api/vc/issue-vc",
            Some(json!({ "name": "Ada", "id": subject_did() })),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"]["code"], 503);
    }

    #[tokio::test]
    async fn test_verify_vp_answers_boolean() {
        let server = server(FakeAgent::accepting());
        let vp = presentation(
            JWT_PROOF_TYPE,
            &subject_did(),
            vec![structured_credential(&subject_did(), TRUSTED_ISSUER)],
        );

        let (status, body) = send(
            &server,
            "POST",
            "/api/vc/verify-vp",
            Some(json!({
                "vp": vp,
                "domain": TRUSTED_ISSUER,
                "challenge": "c0ffee",
                "subjectAddress": SUBJECT_ADDRESS
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(true));
    }

    #[tokio::test]
    async fn test_verify_vp_input_handling() {
        let server = server(FakeAgent::accepting());

        let (status, _) = send(
            &server,
            "POST",
            "/api/vc/verify-vp",
            Some(json!({ "subjectAddress": SUBJECT_ADDRESS })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &server,
            "POST",
            "/api/vc/verify-vp",
            Some(json!({ "vp": 42, "subjectAddress": SUBJECT_ADDRESS })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!(false));
    }

    #[tokio::test]
    async fn test_generate_challenge_uses_trusted_domain() {
        let (status, body) = send(
            &server(FakeAgent::accepting()),
            "POST",
            "/api/vc/generate-challenge",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["domain"], TRUSTED_ISSUER);
        assert!(body["challenge"].is_string());
    }

    #[tokio::test]
    async fn test_unknown_route_is_json_404() {
        let (status, body) = send(&server(FakeAgent::accepting()), "GET", "/api/did", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 404);
    }
}
