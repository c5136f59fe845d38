//! Route handlers, including the login flow controller.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::auth::gate::{self, CurrentUser};
use crate::errors::AppError;
use crate::notification::LoginEvent;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Login flow: verify once, and only on success issue a token and persist
/// a session. Every attempt is recorded and emitted to the notification
/// sink (identity, outcome, history, token on success — never the secret);
/// emission is fire-and-forget and cannot fail the response.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Response, AppError> {
    tracing::info!(identity = %req.username, "login attempt");

    let ok = state.credentials.verify(&req.username, &req.password);
    let history = state.attempts.record(&req.username, ok);

    if !ok {
        state.webhook.dispatch(
            &state.config.webhook_urls,
            state.config.webhook_secret.as_deref(),
            LoginEvent::failed(&req.username, history),
        );
        return Err(AppError::InvalidCredentials);
    }

    let session = state.sessions.create(&req.username).await?;
    state.webhook.dispatch(
        &state.config.webhook_urls,
        state.config.webhook_secret.as_deref(),
        LoginEvent::succeeded(&req.username, &session.token, history),
    );

    tracing::info!(identity = %req.username, "login success");
    let mut resp = (
        StatusCode::OK,
        Json(json!({
            "message": "Login successful",
            "sessionFile": format!("/download/{}", session.token),
        })),
    )
        .into_response();
    resp.headers_mut().insert(
        header::SET_COOKIE,
        gate::set_session_cookie(&session.token),
    );
    Ok(resp)
}

/// Logout: drop the record for the presented token (if any) and expire the
/// cookie. Acknowledged regardless of whether a record existed.
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    if let Some(token) = gate::session_cookie(&headers) {
        state.sessions.delete(&token).await?;
        tracing::debug!(token = %token, "logout");
    }
    let mut resp = StatusCode::OK.into_response();
    resp.headers_mut()
        .insert(header::SET_COOKIE, gate::clear_session_cookie());
    Ok(resp)
}

/// Session export: the raw record as a JSON attachment, for the token
/// holder. Goes through the store's checked read, so expired records 404
/// (and are reclaimed). The record holds no secrets.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Response, AppError> {
    let Some(session) = state.sessions.get(&token).await? else {
        return Err(AppError::SessionNotFound);
    };
    let body = serde_json::to_vec_pretty(&session)
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"session_{token}.json\""),
            ),
        ],
        body,
    )
        .into_response())
}

/// The protected page. Only reachable through the gate middleware, which
/// guarantees the `CurrentUser` extension is present.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Result<Response, AppError> {
    tracing::debug!(%username, "serving dashboard");
    let path = std::path::Path::new(&state.config.public_dir).join("dashboard.html");
    let page = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("missing dashboard page: {e}")))?;
    Ok(Html(page).into_response())
}
