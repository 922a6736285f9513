use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use hookline_discord::InteractionPipeline;
use serde::Serialize;

pub const HEALTH_PATH: &str = "/health";

#[derive(Clone)]
pub struct HealthState {
    pipeline: Arc<InteractionPipeline>,
    application_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub application_id: Option<String>,
    pub service: HealthCheck,
    pub signature_verification: HealthCheck,
    pub commands: Vec<String>,
    pub checked_at: String,
}

pub fn router(pipeline: Arc<InteractionPipeline>, application_id: Option<String>) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .with_state(HealthState { pipeline, application_id })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let signature_verification = signature_check(&state.pipeline);
    let ready = signature_verification.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        application_id: state.application_id.clone(),
        service: HealthCheck {
            status: "ready",
            detail: "hookline-server runtime initialized".to_string(),
        },
        signature_verification,
        commands: state.pipeline.registry().names().into_iter().map(str::to_owned).collect(),
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn signature_check(pipeline: &InteractionPipeline) -> HealthCheck {
    if pipeline.verifier().is_configured() {
        HealthCheck { status: "ready", detail: "application public key loaded".to_string() }
    } else {
        HealthCheck {
            status: "degraded",
            detail: "discord.public_key is not configured; interactions answer 500".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use ed25519_dalek::SigningKey;
    use hookline_discord::{
        builtin::builtin_registry, permissions::RequirementGate, pipeline::InteractionPipeline,
        text::LocalizedText, verify::SignatureVerifier,
    };

    use crate::health::{health, HealthState};

    fn state(verifier: SignatureVerifier, application_id: Option<&str>) -> HealthState {
        let registry = builtin_registry().expect("registry");
        HealthState {
            pipeline: Arc::new(InteractionPipeline::new(
                verifier,
                Arc::new(registry),
                Arc::new(RequirementGate),
                Arc::new(LocalizedText::new()),
            )),
            application_id: application_id.map(str::to_owned),
        }
    }

    #[tokio::test]
    async fn health_returns_ready_when_public_key_is_loaded() {
        let key = SigningKey::from_bytes(&[7u8; 32]).verifying_key();

        let verifier = SignatureVerifier::new(Some(key));

        let (status, Json(payload)) = health(State(state(verifier, Some("1234")))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.signature_verification.status, "ready");
        assert_eq!(payload.commands, vec!["ping".to_string()]);
        assert_eq!(payload.application_id.as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_without_public_key() {
        let (status, Json(payload)) = health(State(state(SignatureVerifier::default(), None))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.signature_verification.status, "degraded");
        assert_eq!(payload.service.status, "ready");
        assert_eq!(payload.application_id, None);
    }
}
