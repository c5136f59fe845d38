//! Authorization gate: the per-request decision between serving a
//! protected resource and bouncing the caller back to login.
//!
//! Stateless per call; everything it knows comes from the presented token
//! and the session store. A rejected request has no retry path here — it
//! re-enters through `/login`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header, HeaderMap, HeaderValue};
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::errors::AppError;
use crate::session::{SessionStore, StoreError, SESSION_TTL_DAYS};
use crate::AppState;

/// Cookie carrying the bearer token.
pub const SESSION_COOKIE: &str = "session_id";

#[derive(Debug, PartialEq)]
pub enum AuthOutcome {
    Authorized(String),
    /// `clear_cookie` is set when a token was presented but rejected, so
    /// the controller can invalidate the stale client-side reference.
    Unauthorized { clear_cookie: bool },
}

/// The gate proper. Storage failure is the only error path and is distinct
/// from a rejection: an unreachable store must not look like a logout.
pub async fn authorize(
    store: &SessionStore,
    token: Option<&str>,
) -> Result<AuthOutcome, StoreError> {
    let Some(token) = token else {
        return Ok(AuthOutcome::Unauthorized {
            clear_cookie: false,
        });
    };
    match store.get(token).await? {
        Some(session) => Ok(AuthOutcome::Authorized(session.username)),
        None => Ok(AuthOutcome::Unauthorized { clear_cookie: true }),
    }
}

/// Identity of the authorized caller, inserted into request extensions by
/// [`require_session`] for downstream handlers.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub String);

/// Middleware guarding protected routes. Authorized requests proceed with
/// a `CurrentUser` extension; rejected ones are redirected to the login
/// page, clearing the stale cookie if one was presented.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_cookie(req.headers());
    match authorize(&state.sessions, token.as_deref()).await? {
        AuthOutcome::Authorized(username) => {
            tracing::debug!(%username, path = %req.uri().path(), "authorized");
            req.extensions_mut().insert(CurrentUser(username));
            Ok(next.run(req).await)
        }
        AuthOutcome::Unauthorized { clear_cookie } => {
            let mut resp = Redirect::to("/").into_response();
            if clear_cookie {
                resp.headers_mut()
                    .insert(header::SET_COOKIE, clear_session_cookie());
            }
            Ok(resp)
        }
    }
}

// ── Cookie plumbing ───────────────────────────────────────────

/// Pull the session token out of the `Cookie` header, if any.
pub fn session_cookie(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.trim().to_string())
    })
}

/// `Set-Cookie` value binding `token` for the full session TTL.
/// HttpOnly + SameSite keep it off scripts and cross-site requests.
pub fn set_session_cookie(token: &str) -> HeaderValue {
    let max_age = SESSION_TTL_DAYS * 24 * 60 * 60;
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; Max-Age={max_age}; Path=/; HttpOnly; SameSite=Strict"
    ))
    .expect("token is URL-safe ASCII")
}

/// `Set-Cookie` value that expires the session cookie immediately.
pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static(
        "session_id=deleted; Expires=Thu, 01 Jan 1970 00:00:00 GMT; Path=/; HttpOnly; SameSite=Strict",
    )
}
