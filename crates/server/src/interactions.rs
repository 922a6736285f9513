use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use hookline_core::errors::{FailureClass, InterfaceError};
use hookline_discord::{
    pipeline::{InteractionPipeline, PipelineReply, ReplyKind, RequestContext},
    response::ResponseEnvelope,
    verify::{SignedRequest, SIGNATURE_HEADER, TIMESTAMP_HEADER},
    IngressError, PipelineError,
};
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

pub const INTERACTIONS_PATH: &str = "/interactions";

#[derive(Clone)]
pub struct InteractionsState {
    pipeline: Arc<InteractionPipeline>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Every method is routed so non-POST requests get the same JSON error shape.
pub fn router(pipeline: Arc<InteractionPipeline>) -> Router {
    Router::new()
        .route(INTERACTIONS_PATH, any(handle_interaction))
        .with_state(InteractionsState { pipeline })
}

pub async fn handle_interaction(
    State(state): State<InteractionsState>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let ctx = RequestContext { correlation_id: Uuid::new_v4().to_string() };

    let request = match read_signed_request(&method, &headers, &body) {
        Ok(request) => request,
        Err(error) => {
            return encode_error(PipelineError::from(error).into_interface(ctx.correlation_id))
        }
    };

    match state.pipeline.process(request, &ctx).await {
        Ok(reply) => {
            log_reply(&reply, &ctx);
            encode_envelope(reply.envelope)
        }
        Err(error) => {
            if let PipelineError::Dispatch(failure) = &error {
                error!(
                    event_name = "interaction.command.failed",
                    correlation_id = %ctx.correlation_id,
                    command = failure.command(),
                    "command collaborator failed after resolution"
                );
            }
            encode_error(error.into_interface(ctx.correlation_id))
        }
    }
}

fn read_signed_request<'a>(
    method: &Method,
    headers: &'a HeaderMap,
    body: &'a [u8],
) -> Result<SignedRequest<'a>, IngressError> {
    if *method != Method::POST {
        return Err(IngressError::MethodNotAllowed(method.to_string()));
    }
    let signature = header_value(headers, SIGNATURE_HEADER)?;
    let timestamp = header_value(headers, TIMESTAMP_HEADER)?;
    SignedRequest::from_parts(method.as_str(), signature, timestamp, body)
}

/// A present header that is not visible ASCII is reported as invalid, not as missing.
fn header_value<'a>(
    headers: &'a HeaderMap,
    name: &'static str,
) -> Result<Option<&'a str>, IngressError> {
    headers
        .get(name)
        .map(|value| value.to_str().map_err(|_| IngressError::InvalidHeader(name)))
        .transpose()
}

fn log_reply(reply: &PipelineReply, ctx: &RequestContext) {
    match &reply.kind {
        ReplyKind::Pong => info!(
            event_name = "interaction.ping",
            correlation_id = %ctx.correlation_id,
            "answered platform ping"
        ),
        ReplyKind::Handled(outcome) => info!(
            event_name = "interaction.handled",
            correlation_id = %ctx.correlation_id,
            outcome = ?outcome,
            "interaction answered with a handled outcome"
        ),
        ReplyKind::Executed { command } => info!(
            event_name = "interaction.command.executed",
            correlation_id = %ctx.correlation_id,
            command = %command,
            "command executed"
        ),
    }
}

pub fn encode_envelope(envelope: ResponseEnvelope) -> Response {
    (StatusCode::OK, Json(envelope)).into_response()
}

pub fn encode_error(error: InterfaceError) -> Response {
    match error.class() {
        FailureClass::Transport | FailureClass::Authentication => warn!(
            event_name = "interaction.rejected",
            correlation_id = %error.correlation_id(),
            failure_class = error.class().as_str(),
            error = %error,
            "interaction request rejected"
        ),
        FailureClass::Configuration | FailureClass::Unexpected => error!(
            event_name = "interaction.failed",
            correlation_id = %error.correlation_id(),
            failure_class = error.class().as_str(),
            error = %error,
            "interaction request failed"
        ),
    }

    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody { error: error.wire_message().to_owned() })).into_response()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{HeaderValue, Request, StatusCode},
        Router,
    };
    use ed25519_dalek::{Signer, SigningKey};
    use hookline_discord::{
        builtin::PingCommand,
        commands::{Command, CommandError, CommandRegistry},
        interaction::Interaction,
        permissions::RequirementGate,
        pipeline::InteractionPipeline,
        response::{CommandOutput, EPHEMERAL_FLAG},
        text::LocalizedText,
        verify::{SignatureVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{router, INTERACTIONS_PATH};

    const TIMESTAMP: &str = "1700000000";

    struct Broken;

    #[async_trait]
    impl Command for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        async fn execute(&self, _interaction: &Interaction) -> Result<CommandOutput, CommandError> {
            Err(CommandError::Failed("database password is hunter2".to_owned()))
        }
    }

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7u8; 32])
    }

    fn app(configured: bool) -> Router {
        let mut registry = CommandRegistry::new();
        registry.register(PingCommand).expect("register ping");
        registry.register(Broken).expect("register broken");
        let verifier = if configured {
            SignatureVerifier::new(Some(signing_key().verifying_key()))
        } else {
            SignatureVerifier::default()
        };
        router(Arc::new(InteractionPipeline::new(
            verifier,
            Arc::new(registry),
            Arc::new(RequirementGate),
            Arc::new(LocalizedText::new()),
        )))
    }

    fn signed(body: &Value) -> Request<Body> {
        let body = serde_json::to_vec(body).expect("encode body");
        let mut message = TIMESTAMP.as_bytes().to_vec();
        message.extend_from_slice(&body);
        let signature = hex::encode(signing_key().sign(&message).to_bytes());

        Request::post(INTERACTIONS_PATH)
            .header(SIGNATURE_HEADER, signature)
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request")
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let value = serde_json::from_slice(&bytes).expect("json body");
        (status, value)
    }

    #[tokio::test]
    async fn ping_returns_exact_pong_body() {
        let (status, body) = call(app(true), signed(&json!({ "type": 1 }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn builtin_ping_command_is_wrapped_as_channel_message() {
        let request = signed(&json!({
            "type": 2,
            "data": {
                "name": "ping",
                "options": [{ "name": "ephemeral", "type": 5, "value": true }]
            }
        }));

        let (status, body) = call(app(true), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 4, "data": { "content": "pong", "flags": EPHEMERAL_FLAG } }));
    }

    #[tokio::test]
    async fn unknown_command_is_a_handled_200() {
        let (status, body) =
            call(app(true), signed(&json!({ "type": 2, "data": { "name": "nope" } }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 4, "data": { "content": "command not found 👎" } }));
    }

    #[tokio::test]
    async fn non_post_is_a_bad_request() {
        let request = Request::get(INTERACTIONS_PATH).body(Body::empty()).expect("request");

        let (status, body) = call(app(true), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|message| message.contains("POST")));
    }

    #[tokio::test]
    async fn missing_signature_headers_are_bad_requests() {
        let request = Request::post(INTERACTIONS_PATH)
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .body(Body::from("{}"))
            .expect("request");
        let (status, body) = call(app(true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().is_some_and(|message| message.contains(SIGNATURE_HEADER)));

        let request = Request::post(INTERACTIONS_PATH)
            .header(SIGNATURE_HEADER, "00")
            .body(Body::from("{}"))
            .expect("request");
        let (status, _) = call(app(true), request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn non_ascii_signature_header_is_invalid_not_missing() {
        let request = Request::post(INTERACTIONS_PATH)
            .header(SIGNATURE_HEADER, HeaderValue::from_bytes(b"\xfe\xff").expect("header"))
            .header(TIMESTAMP_HEADER, TIMESTAMP)
            .body(Body::from("{}"))
            .expect("request");

        let (status, body) = call(app(true), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let message = body["error"].as_str().unwrap_or_default();
        assert!(message.starts_with("invalid header value"), "unexpected message: {message}");
        assert!(message.contains(SIGNATURE_HEADER));
    }

    #[tokio::test]
    async fn signed_ping_with_odd_context_fields_still_pongs() {
        let body = json!({ "type": 1, "version": 1000, "user": { "username": "no-id" } });

        let (status, body) = call(app(true), signed(&body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 1 }));
    }

    #[tokio::test]
    async fn non_string_command_name_is_a_handled_200() {
        let (status, body) =
            call(app(true), signed(&json!({ "type": 2, "data": { "name": 42 } }))).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "type": 4, "data": { "content": "command not found 👎" } }));
    }

    #[tokio::test]
    async fn tampered_body_is_unauthorized() {
        let mut request = signed(&json!({ "type": 1 }));
        *request.body_mut() = Body::from(r#"{"type":2}"#);

        let (status, body) = call(app(true), request).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid request; could not verify the request" }));
    }

    #[tokio::test]
    async fn missing_public_key_is_a_server_error() {
        let (status, body) = call(app(false), signed(&json!({ "type": 1 }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "missing public key" }));
    }

    #[tokio::test]
    async fn unsupported_interaction_type_is_a_bad_request() {
        let (status, body) =
            call(app(true), signed(&json!({ "type": 3, "data": { "custom_id": "x" } }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Bad request" }));
    }

    #[tokio::test]
    async fn handler_failure_does_not_leak_details() {
        let (status, body) =
            call(app(true), signed(&json!({ "type": 2, "data": { "name": "broken" } }))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "internal server error" }));
    }
}
