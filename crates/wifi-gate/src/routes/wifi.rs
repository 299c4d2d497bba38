//! The `/api/wifi` action dispatcher.
//!
//! POST only. The `action` query parameter picks the operation:
//! - `request-verification` `{phoneNumber}`
//! - `verify` `{phoneNumber, verificationCode}`
//! - `validate-token` `{token}`, falling back to the session cookie

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State, rejection::QueryRejection},
    http::{HeaderMap, Method, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::str::FromStr;

use wifi_gate_common::constants::{ACCESS_TOKEN_COOKIE, messages};
use wifi_gate_common::{ApiResponse, GateError};

use super::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ActionQuery {
    action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    RequestVerification,
    Verify,
    ValidateToken,
}

impl FromStr for Action {
    type Err = GateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "request-verification" => Ok(Self::RequestVerification),
            "verify" => Ok(Self::Verify),
            "validate-token" => Ok(Self::ValidateToken),
            _ => Err(GateError::InvalidAction),
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RequestVerificationBody {
    phone_number: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VerifyBody {
    phone_number: Option<String>,
    verification_code: Option<String>,
}

#[derive(Deserialize)]
struct ValidateTokenBody {
    token: Option<String>,
}

/// Route one request to its operation
pub async fn dispatch(
    State(state): State<AppState>,
    method: Method,
    headers: HeaderMap,
    query: Result<Query<ActionQuery>, QueryRejection>,
    body: Bytes,
) -> Result<Response, ApiError> {
    if method != Method::POST {
        return Err(GateError::MethodNotAllowed.into());
    }

    let Query(query) = query.map_err(|e| {
        tracing::debug!(error = %e, "Unreadable action query");
        GateError::InvalidAction
    })?;
    let action: Action = query.action.as_deref().unwrap_or_default().parse()?;

    tracing::debug!(action = ?action, "Dispatching wifi action");

    match action {
        Action::RequestVerification => request_verification(&state, &body).await,
        Action::Verify => verify(&state, &body).await,
        Action::ValidateToken => validate_token(&state, &headers, &body),
    }
}

async fn request_verification(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let payload: RequestVerificationBody = parse_body(body)?;
    let phone = payload.phone_number.unwrap_or_default();

    state.engine.request_verification(&phone).await?;

    Ok(ok::<()>(messages::CODE_SENT, None))
}

async fn verify(state: &AppState, body: &[u8]) -> Result<Response, ApiError> {
    let payload: VerifyBody = parse_body(body)?;
    let (Some(phone), Some(code)) = (
        non_empty(payload.phone_number),
        non_empty(payload.verification_code),
    ) else {
        return Err(GateError::InvalidInput(messages::MISSING_VERIFY_FIELDS.to_string()).into());
    };

    let grant = state.engine.verify_code(&phone, &code).await?;

    Ok(ok(messages::VERIFIED, Some(grant)))
}

fn validate_token(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    let payload: ValidateTokenBody = parse_body(body)?;
    let token = non_empty(payload.token).or_else(|| cookie_token(headers));
    let Some(token) = token else {
        return Err(GateError::InvalidInput(messages::MISSING_TOKEN.to_string()).into());
    };

    let grant = state.engine.validate_token(&token)?;

    Ok(ok(messages::TOKEN_VALID, Some(grant)))
}

/// Decode a JSON body; an empty body reads as `{}`
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, GateError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Malformed request body");
        GateError::InvalidInput(messages::INVALID_BODY.to_string())
    })
}

/// Session token from the `wifi_access_token` cookie, if any
fn cookie_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == ACCESS_TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn ok<T: serde::Serialize>(message: &str, data: Option<T>) -> Response {
    (StatusCode::OK, Json(ApiResponse::ok(message, data))).into_response()
}
