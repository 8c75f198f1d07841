//! Access-token lifecycle
//!
//! `TokenRefresher` hands out a usable access token. Fresh tokens are
//! returned without touching the network; stale or undecodable ones are
//! exchanged at `POST /auth/refresh`. Any failure during the exchange clears
//! both tokens (fail-closed) so the user is sent back to login instead of
//! looping on a dead session.
//!
//! Refreshes are single-flight: an async mutex serializes them, and a caller
//! that waited on it re-reads the store first. If another task already
//! replaced the token it saw, the waiter takes the new one as is instead of
//! spending the (possibly rotated) refresh token a second time.
//!
//! An exchange only persists its result while the refresh token it spent is
//! still stored, so a logout that lands mid-exchange stays logged out.

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::event::{ClearReason, SessionEvent, SessionEvents};
use crate::jwt::decode_expiry;
use crate::token_store::TokenStore;
use crate::transport::{ApiRequest, Method, Transport};
use bookkeep_types::{DecodedExpiry, TokenPair, UserProfile};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, trace, warn};

/// Backend path of the token exchange
pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<serde_json::Value>,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// Snapshot of the stored session, for status displays
#[derive(Debug, Clone)]
pub struct SessionStatus {
    pub has_session: bool,
    pub expiry: Option<DecodedExpiry>,
    /// True when the next call would trigger a refresh
    pub refresh_due: bool,
    pub profile: Option<UserProfile>,
}

pub struct TokenRefresher {
    store: Arc<TokenStore>,
    transport: Arc<dyn Transport>,
    refresh_url: String,
    margin_secs: i64,
    events: SessionEvents,
    /// Held for the duration of one exchange
    refresh_gate: Mutex<()>,
}

impl TokenRefresher {
    pub fn new(
        store: Arc<TokenStore>,
        transport: Arc<dyn Transport>,
        config: &ClientConfig,
        events: SessionEvents,
    ) -> Self {
        Self {
            store,
            transport,
            refresh_url: config.endpoint(REFRESH_PATH),
            margin_secs: config.refresh_margin_secs(),
            events,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    /// Store tokens obtained from a login
    pub fn login(&self, pair: &TokenPair, profile: Option<UserProfile>) -> Result<(), CoreError> {
        self.store.store_pair(pair)?;
        if let Some(profile) = profile {
            self.store.set_profile(profile)?;
        }
        info!("Session stored");
        self.events.publish(SessionEvent::LoggedIn);
        Ok(())
    }

    /// Forget the session entirely
    pub fn logout(&self) -> Result<(), CoreError> {
        self.store.clear_all()?;
        info!("Session cleared by logout");
        self.events
            .publish(SessionEvent::SessionCleared(ClearReason::Logout));
        Ok(())
    }

    pub fn status(&self) -> SessionStatus {
        let pair = self.store.token_pair();
        let expiry = pair
            .as_ref()
            .and_then(|p| decode_expiry(&p.access_token).ok().flatten());
        SessionStatus {
            has_session: pair.is_some(),
            refresh_due: pair
                .as_ref()
                .map(|p| !self.is_fresh(&p.access_token))
                .unwrap_or(false),
            expiry,
            profile: self.store.profile(),
        }
    }

    /// A usable access token, refreshing first if needed
    ///
    /// `None` means there is no session (or it was just cleared).
    pub async fn get_valid_access_token(&self) -> Option<String> {
        let pair = self.store.token_pair()?;
        if self.is_fresh(&pair.access_token) {
            trace!(token = %fingerprint(&pair.access_token), "Access token is fresh");
            return Some(pair.access_token);
        }
        self.refresh(&pair.access_token).await
    }

    /// Refresh regardless of freshness, after the backend rejected `rejected`
    pub async fn force_refresh(&self, rejected: &str) -> Option<String> {
        self.refresh(rejected).await
    }

    fn is_fresh(&self, access_token: &str) -> bool {
        match decode_expiry(access_token) {
            Ok(Some(expiry)) => expiry.is_fresh(now_epoch_seconds(), self.margin_secs),
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "Access token unreadable, treating as expired");
                false
            }
        }
    }

    async fn refresh(&self, seen: &str) -> Option<String> {
        let _gate = self.refresh_gate.lock().await;

        // Re-read: the session may have changed while we waited. A token
        // that differs from `seen` is the result of that change, whatever
        // its expiry says.
        let pair = self.store.token_pair()?;
        if pair.access_token != seen {
            debug!("Token already refreshed by a concurrent caller");
            return Some(pair.access_token);
        }

        match self.exchange(&pair.refresh_token).await {
            Ok(Some(token)) => Some(token),
            Ok(None) => {
                info!("Session changed during refresh, discarding exchanged tokens");
                self.store.token_pair().map(|p| p.access_token)
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing session");
                if let Err(clear_err) = self.store.clear_tokens() {
                    warn!(error = %clear_err, "Failed to clear tokens after refresh failure");
                }
                self.events
                    .publish(SessionEvent::SessionCleared(ClearReason::RefreshFailed));
                None
            }
        }
    }

    /// Spend `refresh_token` at the backend
    ///
    /// `Ok(None)` means the exchange succeeded but the session no longer
    /// holds `refresh_token`, so nothing was stored.
    async fn exchange(&self, refresh_token: &str) -> Result<Option<String>, CoreError> {
        info!("Refreshing access token");

        let request = ApiRequest::new(Method::Post, &self.refresh_url)
            .with_body(serde_json::json!({ "refresh_token": refresh_token }));
        let response = self.transport.send(request).await?;

        if !response.is_success() {
            return Err(CoreError::RefreshRejected {
                reason: format!("status {}", response.status),
            });
        }

        let parsed: RefreshResponse =
            serde_json::from_str(&response.body).map_err(|source| CoreError::Decode {
                context: "token refresh".to_string(),
                source,
            })?;

        let access_token = match parsed.access_token {
            Some(serde_json::Value::String(s)) if !s.is_empty() => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => {
                return Err(CoreError::RefreshRejected {
                    reason: "no access_token in response".to_string(),
                })
            }
        };

        // Keep the old refresh token unless the backend rotated it
        let rotated = parsed.refresh_token.filter(|t| !t.is_empty());
        let new_refresh = rotated.clone().unwrap_or_else(|| refresh_token.to_string());

        let pair = TokenPair::new(access_token.clone(), new_refresh);
        if !self.store.replace_pair_if(refresh_token, &pair)? {
            return Ok(None);
        }

        info!(rotated = rotated.is_some(), "Access token refreshed");
        self.events.publish(SessionEvent::TokensRefreshed {
            rotated: rotated.is_some(),
        });
        Ok(Some(access_token))
    }
}

fn now_epoch_seconds() -> i64 {
    chrono::Utc::now().timestamp()
}

/// First characters of a token, safe for trace logs
fn fingerprint(token: &str) -> &str {
    token.get(..8).unwrap_or(token)
}
