//! Session change notifications
//!
//! Lets front-ends react to session changes, most importantly the
//! `LoginRequired` signal raised when a call cannot be authorized.

use tokio::sync::broadcast;

/// Events emitted by the session layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Tokens were stored by a login
    LoggedIn,
    /// Access token was exchanged for a new one
    TokensRefreshed {
        /// Whether the backend also rotated the refresh token
        rotated: bool,
    },
    /// Tokens were dropped (logout or failed refresh)
    SessionCleared(ClearReason),
    /// A request stayed unauthorized after a forced refresh; redirect to login
    LoginRequired { path: String },
}

/// Why the session was cleared
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearReason {
    Logout,
    RefreshFailed,
}

/// Events kept for a lagging subscriber before it starts missing some
const CHANNEL_CAPACITY: usize = 64;

/// Broadcast handle for [`SessionEvent`]s
///
/// Clones publish into the same channel.
#[derive(Clone)]
pub struct SessionEvents {
    sender: broadcast::Sender<SessionEvent>,
}

impl SessionEvents {
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Send to every current subscriber; nobody listening is fine
    pub fn publish(&self, event: SessionEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("Session event dropped, no subscribers");
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl Default for SessionEvents {
    fn default() -> Self {
        Self::with_capacity(CHANNEL_CAPACITY)
    }
}
