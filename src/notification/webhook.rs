use anyhow::Result;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::auth::attempts::Attempt;

// ── Login Event ───────────────────────────────────────────────

/// A structured login-attempt event sent to the notification sink.
///
/// Carries identity, outcome, attempt history, timestamp, and on success
/// the issued token. It never carries the submitted secret — the sink is
/// an audit channel, not a credential channel.
#[derive(Debug, Clone, Serialize)]
pub struct LoginEvent {
    /// "login_succeeded" or "login_failed".
    pub event_type: String,
    /// ISO-8601 timestamp of when the attempt was decided.
    pub timestamp: String,
    /// The identity that attempted to log in.
    pub identity: String,
    pub success: bool,
    /// Recent attempts for this identity, oldest first, including this one.
    pub attempt_history: Vec<Attempt>,
    /// Issued session token; present only on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl LoginEvent {
    pub fn succeeded(identity: &str, token: &str, history: Vec<Attempt>) -> Self {
        Self {
            event_type: "login_succeeded".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            identity: identity.to_string(),
            success: true,
            attempt_history: history,
            token: Some(token.to_string()),
        }
    }

    pub fn failed(identity: &str, history: Vec<Attempt>) -> Self {
        Self {
            event_type: "login_failed".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            identity: identity.to_string(),
            success: false,
            attempt_history: history,
            token: None,
        }
    }
}

// ── HMAC Signing ─────────────────────────────────────────────

/// Compute HMAC-SHA256 of `payload` using `secret`.
/// Returns "sha256=<lowercase hex digest>".
fn hmac_sha256_hex(secret: &str, payload: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(payload);
    let result = mac.finalize();
    let bytes = result.into_bytes();
    format!("sha256={}", hex::encode(bytes))
}

// ── Webhook Notifier ──────────────────────────────────────────

/// Dispatches login events to the configured sink URLs.
/// Supports:
/// - HMAC-SHA256 signing (X-Portal-Signature header)
/// - Up to 3 retries with exponential back-off (1s → 5s → 25s)
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
}

impl WebhookNotifier {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(10))
                .user_agent("Portal-Webhook/1.0")
                .build()
                .expect("failed to build webhook HTTP client"),
        }
    }

    /// Send a signed event to a single URL with retry.
    ///
    /// If `signing_secret` is `Some`, the request body is signed with
    /// HMAC-SHA256 and the signature is sent in `X-Portal-Signature`.
    ///
    /// Retries up to 3 times on failure with exponential back-off.
    /// Returns `Ok(())` if delivery succeeded on any attempt.
    pub async fn send_signed(
        &self,
        url: &str,
        event: &LoginEvent,
        signing_secret: Option<&str>,
    ) -> Result<()> {
        let payload = serde_json::to_vec(event)
            .map_err(|e| anyhow::anyhow!("webhook serialize error: {}", e))?;
        let delivery_id = uuid::Uuid::new_v4().to_string();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = signing_secret.map(|s| hmac_sha256_hex(s, &payload));

        let backoff_secs: &[u64] = &[0, 1, 5, 25];

        for (attempt, &delay) in backoff_secs.iter().enumerate() {
            if delay > 0 {
                debug!(
                    url,
                    attempt,
                    delay_secs = delay,
                    event_type = %event.event_type,
                    "retrying webhook delivery"
                );
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }

            let mut req = self
                .client
                .post(url)
                .header("content-type", "application/json")
                .header("x-portal-delivery-id", &delivery_id)
                .header("x-portal-timestamp", &timestamp)
                .header("x-portal-event", &event.event_type);

            if let Some(ref sig) = signature {
                req = req.header("x-portal-signature", sig.as_str());
            }

            let result = req.body(payload.clone()).send().await;

            match result {
                Ok(resp) if resp.status().is_success() => {
                    info!(
                        url,
                        event_type = %event.event_type,
                        delivery_id = %delivery_id,
                        attempt,
                        status = %resp.status(),
                        "webhook delivered successfully"
                    );
                    return Ok(());
                }
                Ok(resp) => {
                    let status = resp.status();
                    warn!(
                        url,
                        event_type = %event.event_type,
                        delivery_id = %delivery_id,
                        attempt,
                        status = %status,
                        "webhook delivery failed (non-2xx), will retry"
                    );
                }
                Err(e) => {
                    warn!(
                        url,
                        event_type = %event.event_type,
                        delivery_id = %delivery_id,
                        attempt,
                        error = %e,
                        "webhook request error, will retry"
                    );
                }
            }
        }

        // All attempts exhausted
        warn!(
            url,
            event_type = %event.event_type,
            delivery_id = %delivery_id,
            "webhook delivery failed after all retries"
        );
        Err(anyhow::anyhow!(
            "webhook delivery failed after 3 retries: {}",
            url
        ))
    }

    /// Dispatch an event to all configured sink URLs (fire-and-forget).
    ///
    /// Delivery happens on a spawned task and can never block or fail the
    /// login response; each URL is attempted independently with retry.
    /// An empty URL list is a silent no-op.
    pub fn dispatch(&self, urls: &[String], secret: Option<&str>, event: LoginEvent) {
        if urls.is_empty() {
            debug!("no webhook URLs configured, skipping login event");
            return;
        }

        let notifier = self.clone();
        let urls = urls.to_vec();
        let secret = secret.map(String::from);

        tokio::spawn(async move {
            for url in &urls {
                if let Err(e) = notifier.send_signed(url, &event, secret.as_deref()).await {
                    warn!(url, error = %e, "webhook dispatch ultimately failed");
                }
            }
        });
    }
}

impl Default for WebhookNotifier {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────
