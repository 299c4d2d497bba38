//! HTTP route handlers for Wifi Gate.

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{any, get},
};
use std::any::Any;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use wifi_gate_common::{ApiResponse, GateError};

use crate::state::AppState;

mod health;
mod wifi;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health & Status
        .route("/health", get(health::health_check))

        // Verification flow (method checked by the dispatcher)
        .route("/api/wifi", any(wifi::dispatch))

        // Add shared state
        .with_state(state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

/// A [`GateError`] on its way to the client as `{success: false, error}`
#[derive(Debug)]
pub struct ApiError(pub GateError);

impl From<GateError> for ApiError {
    fn from(err: GateError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match &self.0 {
            GateError::Internal(detail) => tracing::error!(detail = %detail, "Request failed"),
            other => tracing::debug!(status = status.as_u16(), error = %other, "Request rejected"),
        }

        (status, Json(ApiResponse::<()>::failure(self.0.client_message()))).into_response()
    }
}

/// Turn a handler panic into the redacted 500 envelope
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    ApiError(GateError::Internal(format!("handler panicked: {detail}"))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::store::{MemoryStore, VerificationStore};
    use crate::verification::{CodePolicy, LogNotifier};
    use anyhow::Result;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::ServiceExt;
    use wifi_gate_common::VerificationRecord;

    const PHONE: &str = "11987654321";

    fn fixed_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.wifi.password = "cafe-guest".into();
        config.token.secret = "router-test-secret".into();
        config.verification.code = CodePolicy::Fixed {
            fixed_code: "123456".into(),
        };
        config
    }

    fn app(config: &AppConfig) -> Router {
        create_router(AppState::new(config))
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(app: &Router, action: &str, body: Value) -> (StatusCode, Value) {
        call(app, "POST", &format!("/api/wifi?action={action}"), body).await
    }

    #[tokio::test]
    async fn test_health() {
        let app = app(&fixed_config());
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
        assert!(body.get("code_mode").is_none(), "{body}");
        assert_eq!(body.as_object().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_full_flow_and_session_resume() {
        let app = app(&fixed_config());

        let (status, body) =
            post(&app, "request-verification", json!({ "phoneNumber": PHONE })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert!(body.get("data").is_none(), "code must not leak: {body}");

        let (status, body) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["password"], "cafe-guest");
        let token = body["data"]["token"].as_str().unwrap().to_string();
        let expires_at = body["data"]["expiresAt"].as_str().unwrap().to_string();

        let (status, body) = post(&app, "validate-token", json!({ "token": token })).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Token válido");
        assert_eq!(body["data"]["password"], "cafe-guest");
        assert!(body["data"].get("token").is_none());

        let resumed = chrono::DateTime::parse_from_rfc3339(body["data"]["expiresAt"].as_str().unwrap())
            .unwrap();
        let issued = chrono::DateTime::parse_from_rfc3339(&expires_at).unwrap();
        assert_eq!(resumed.timestamp(), issued.timestamp());
    }

    #[tokio::test]
    async fn test_invalid_phone() {
        let app = app(&fixed_config());
        for body in [json!({ "phoneNumber": "12345" }), json!({})] {
            let (status, body) = post(&app, "request-verification", body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(body["success"], false);
            assert_eq!(
                body["error"],
                "Número de telefone inválido. Formate como 11987654321"
            );
        }
    }

    #[tokio::test]
    async fn test_verify_status_codes() {
        let app = app(&fixed_config());

        let (status, _) = post(&app, "verify", json!({ "phoneNumber": PHONE })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(&app, "verify", json!({ "verificationCode": "123456" })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        post(&app, "request-verification", json!({ "phoneNumber": PHONE })).await;
        let wrong = json!({ "phoneNumber": PHONE, "verificationCode": "000000" });
        for remaining in [2, 1, 0] {
            let (status, body) = post(&app, "verify", wrong.clone()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(
                body["error"],
                format!("Código inválido. Restam {remaining} tentativas.")
            );
        }

        let (status, _) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        // A new request unlocks the record
        post(&app, "request-verification", json!({ "phoneNumber": PHONE })).await;
        let (status, _) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_validate_token_failures() {
        let app = app(&fixed_config());

        let (status, body) = post(&app, "validate-token", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Token não fornecido");

        let (status, body) = post(&app, "validate-token", json!({ "token": "abc.def.ghi" })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Token inválido");

        // Signed with another secret
        let mut other = fixed_config();
        other.token.secret = "someone-else".into();
        let other_app = super::create_router(AppState::new(&other));
        post(&other_app, "request-verification", json!({ "phoneNumber": PHONE })).await;
        let (_, body) = post(
            &other_app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        let foreign = body["data"]["token"].as_str().unwrap();

        let (status, _) = post(&app, "validate-token", json!({ "token": foreign })).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_validate_token_from_cookie() {
        let app = app(&fixed_config());
        post(&app, "request-verification", json!({ "phoneNumber": PHONE })).await;
        let (_, body) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        let token = body["data"]["token"].as_str().unwrap();

        let request = Request::builder()
            .method("POST")
            .uri("/api/wifi?action=validate-token")
            .header("cookie", format!("wifi_access_token={token}"))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dispatcher_rejections() {
        let app = app(&fixed_config());

        let (status, body) = call(&app, "GET", "/api/wifi?action=verify", json!({})).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["error"], "Método não permitido");

        let (status, body) = post(&app, "delete-everything", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Ação inválida");

        let (status, _) = call(&app, "POST", "/api/wifi", json!({})).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_repeated_action_is_invalid_action() {
        let app = app(&fixed_config());

        let (status, body) = call(
            &app,
            "POST",
            "/api/wifi?action=verify&action=verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Ação inválida");

        let (status, body) =
            call(&app, "GET", "/api/wifi?action=verify&action=x", json!({})).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Método não permitido");
    }

    #[tokio::test]
    async fn test_malformed_body() {
        let app = app(&fixed_config());
        let request = Request::builder()
            .method("POST")
            .uri("/api/wifi?action=verify")
            .body(Body::from("{oops"))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    struct PanickingStore;

    #[async_trait]
    impl VerificationStore for PanickingStore {
        async fn get(&self, _id: &str) -> Result<Option<VerificationRecord>> {
            panic!("store exploded at 10.0.0.7");
        }

        async fn put(&self, _id: &str, _record: VerificationRecord) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_panic_is_redacted() {
        let config = fixed_config();
        let state = AppState::with_parts(
            &config,
            Arc::new(PanickingStore),
            Arc::new(LogNotifier::new(false)),
        );
        let app = create_router(state);

        let (status, body) =
            post(&app, "request-verification", json!({ "phoneNumber": PHONE })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Erro interno do servidor");
        assert!(!body.to_string().contains("10.0.0.7"));
    }

    struct UnreachableStore;

    #[async_trait]
    impl VerificationStore for UnreachableStore {
        async fn get(&self, _id: &str) -> Result<Option<VerificationRecord>> {
            anyhow::bail!("connect to 10.0.0.9:6379 refused")
        }

        async fn put(&self, _id: &str, _record: VerificationRecord) -> Result<()> {
            anyhow::bail!("connect to 10.0.0.9:6379 refused")
        }
    }

    #[tokio::test]
    async fn test_store_error_is_redacted() {
        let config = fixed_config();
        let state = AppState::with_parts(
            &config,
            Arc::new(UnreachableStore),
            Arc::new(LogNotifier::new(false)),
        );
        let app = create_router(state);

        let (status, body) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Erro interno do servidor");
        assert!(!body.to_string().contains("10.0.0.9"));
    }

    #[tokio::test]
    async fn test_random_mode_unknown_phone_not_found() {
        let mut config = fixed_config();
        config.verification.code = CodePolicy::Random;
        let state = AppState::with_parts(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(LogNotifier::new(false)),
        );
        let app = create_router(state);

        let (status, body) = post(
            &app,
            "verify",
            json!({ "phoneNumber": PHONE, "verificationCode": "123456" }),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body["error"],
            "Verificação não encontrada. Solicite um novo código."
        );
    }
}
