use std::error::Error as _;

use axum::{
    body::{to_bytes, Body},
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use http_body_util::LengthLimitError;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::gateway::{GatewayClient, GatewayError};
use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};

/// Largest accepted request body, in bytes.
pub const MAX_BODY_BYTES: usize = 1_000_000;

#[derive(Clone)]
pub struct AppState {
    pub gateway: GatewayClient,
}

/// The three forwarded gateway calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOperation {
    CreatePaymentIntent,
    CreatePaymentMethod,
    AttachPaymentMethod,
}

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("Payload too large")]
    PayloadTooLarge,

    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid request body")]
    UnreadableBody,

    #[error("payment_intent_id is required")]
    MissingPaymentIntentId,

    #[error("Not found")]
    NotFound,

    #[error("Payment gateway unavailable")]
    Gateway(#[source] GatewayError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = match self {
            ProxyError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ProxyError::InvalidJson
            | ProxyError::UnreadableBody
            | ProxyError::MissingPaymentIntentId => StatusCode::BAD_REQUEST,
            ProxyError::NotFound => StatusCode::NOT_FOUND,
            ProxyError::Gateway(_) => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorBody {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

impl PaymentOperation {
    /// Gateway path for this call, and the attributes to send.
    ///
    /// Attaching takes the payment intent id out of the body; the remaining
    /// fields are sent as attributes.
    fn prepare(self, mut body: Value) -> Result<(String, Value), ProxyError> {
        match self {
            PaymentOperation::CreatePaymentIntent => Ok(("payment_intents".to_owned(), body)),
            PaymentOperation::CreatePaymentMethod => Ok(("payment_methods".to_owned(), body)),
            PaymentOperation::AttachPaymentMethod => {
                let id = body
                    .as_object_mut()
                    .and_then(|fields| fields.remove("payment_intent_id"))
                    .and_then(|v| v.as_str().map(str::to_owned))
                    .filter(|id| is_gateway_id(id))
                    .ok_or(ProxyError::MissingPaymentIntentId)?;
                Ok((format!("payment_intents/{id}/attach"), body))
            }
        }
    }
}

/// Gateway ids look like `pi_abc123`; anything else never reaches the URL.
fn is_gateway_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn exceeds_length_limit(err: &axum::Error) -> bool {
    let mut source = err.source();
    while let Some(inner) = source {
        if inner.is::<LengthLimitError>() {
            return true;
        }
        source = inner.source();
    }
    false
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/create_payment_intent", post(create_payment_intent))
        .route("/create_payment_method", post(create_payment_method))
        .route("/attach_payment_method", post(attach_payment_method))
        .fallback(not_found)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn not_found() -> ProxyError {
    ProxyError::NotFound
}

async fn create_payment_intent(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Body,
) -> Result<Response, ProxyError> {
    forward(&state, &req_id, PaymentOperation::CreatePaymentIntent, body).await
}

async fn create_payment_method(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Body,
) -> Result<Response, ProxyError> {
    forward(&state, &req_id, PaymentOperation::CreatePaymentMethod, body).await
}

async fn attach_payment_method(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Body,
) -> Result<Response, ProxyError> {
    forward(&state, &req_id, PaymentOperation::AttachPaymentMethod, body).await
}

async fn forward(
    state: &AppState,
    req_id: &RequestId,
    operation: PaymentOperation,
    body: Body,
) -> Result<Response, ProxyError> {
    let bytes = to_bytes(body, MAX_BODY_BYTES).await.map_err(|e| {
        tracing::warn!(request_id = %req_id.0, ?operation, error = %e, "request body rejected");
        if exceeds_length_limit(&e) {
            ProxyError::PayloadTooLarge
        } else {
            ProxyError::UnreadableBody
        }
    })?;
    let payload: Value = serde_json::from_slice(&bytes).map_err(|_| ProxyError::InvalidJson)?;

    let (path, attributes) = operation.prepare(payload)?;
    let answer = state.gateway.post(&path, attributes).await.map_err(|e| {
        tracing::error!(request_id = %req_id.0, ?operation, error = %e, "gateway unreachable");
        ProxyError::Gateway(e)
    })?;

    tracing::info!(
        request_id = %req_id.0,
        ?operation,
        status = answer.status.as_u16(),
        "forwarded payment request"
    );
    Ok((answer.status, Json(answer.body)).into_response())
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::json;
    use tower::ServiceExt;
    use wiremock::matchers::{basic_auth, body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn app(gateway_url: &str) -> Router {
        let gateway =
            GatewayClient::new(gateway_url, "sk_test_123", 5).expect("gateway client");
        build_app(AppState { gateway })
    }

    fn post_json(uri: &str, body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.into())
            .expect("request")
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body bytes");
        serde_json::from_slice(&bytes).expect("json parse")
    }

    #[tokio::test]
    async fn oversized_body_is_rejected_with_413() {
        let response = app("http://127.0.0.1:9")
            .oneshot(post_json(
                "/create_payment_intent",
                vec![b' '; MAX_BODY_BYTES + 1],
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Payload too large" })
        );
    }

    #[tokio::test]
    async fn invalid_json_is_rejected_with_400() {
        let response = app("http://127.0.0.1:9")
            .oneshot(post_json("/create_payment_method", "{not json"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await, json!({ "error": "Invalid JSON" }));
    }

    #[tokio::test]
    async fn broken_body_stream_is_rejected_with_400() {
        let chunks: Vec<Result<axum::body::Bytes, std::io::Error>> = vec![
            Ok(axum::body::Bytes::from_static(b"{\"amount\":")),
            Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            )),
        ];
        let body = Body::from_stream(futures::stream::iter(chunks));

        let response = app("http://127.0.0.1:9")
            .oneshot(post_json("/create_payment_intent", body))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Invalid request body" })
        );
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let response = app("http://127.0.0.1:9")
            .oneshot(post_json("/refund", "{}"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(json_body(response).await, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn responses_carry_request_id() {
        let response = app("http://127.0.0.1:9")
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .header(REQUEST_ID_HEADER, "req-42")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(REQUEST_ID_HEADER)
                .and_then(|v| v.to_str().ok()),
            Some("req-42")
        );
    }

    #[tokio::test]
    async fn payment_intent_is_wrapped_and_relayed() {
        let server = MockServer::start().await;
        let attributes = json!({ "amount": 34000, "currency": "PHP" });

        Mock::given(method("POST"))
            .and(path("/payment_intents"))
            .and(basic_auth("sk_test_123", ""))
            .and(body_json(json!({ "data": { "attributes": attributes } })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "pi_abc", "attributes": { "status": "awaiting_payment_method" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app(&server.uri())
            .oneshot(post_json(
                "/create_payment_intent",
                attributes.to_string(),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["data"]["id"], "pi_abc");
    }

    #[tokio::test]
    async fn attach_takes_intent_id_from_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/payment_intents/pi_abc/attach"))
            .and(body_json(json!({
                "data": { "attributes": { "payment_method": "pm_xyz" } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "id": "pi_abc", "attributes": { "status": "succeeded" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let body = json!({ "payment_intent_id": "pi_abc", "payment_method": "pm_xyz" });
        let response = app(&server.uri())
            .oneshot(post_json("/attach_payment_method", body.to_string()))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn attach_without_intent_id_is_400() {
        let response = app("http://127.0.0.1:9")
            .oneshot(post_json(
                "/attach_payment_method",
                json!({ "payment_method": "pm_xyz" }).to_string(),
            ))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn gateway_errors_are_relayed_with_their_status() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/payment_methods"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "errors": [{ "code": "parameter_required", "detail": "type is required" }]
            })))
            .mount(&server)
            .await;

        let response = app(&server.uri())
            .oneshot(post_json("/create_payment_method", "{}"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await["errors"][0]["code"],
            "parameter_required"
        );
    }

    #[tokio::test]
    async fn unreachable_gateway_is_502() {
        let response = app("http://127.0.0.1:9")
            .oneshot(post_json("/create_payment_intent", "{}"))
            .await
            .expect("response");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn gateway_ids_are_restricted_to_url_safe_characters() {
        assert!(is_gateway_id("pi_abc123"));
        assert!(!is_gateway_id("pi/../x"));
        assert!(!is_gateway_id(""));
    }
}
