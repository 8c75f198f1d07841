//! Session credentials

use serde::{Deserialize, Serialize};
use std::fmt;

/// Access + refresh token, always held together
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

// Credentials must never end up in logs.
impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Who is logged in, as reported by the login endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub username: String,
    pub email: String,
    pub id: String,
}

/// Expiry read from an access token's `exp` claim
///
/// Derived on every validity check, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedExpiry {
    pub expires_at_epoch_seconds: i64,
}

impl DecodedExpiry {
    /// True when the token outlives `now + margin_secs`
    ///
    /// A token expiring exactly at the threshold is stale, even though the
    /// lenient reading ("invalid only if `exp < now + margin`") would call it
    /// fresh. The sum saturates, so an oversized margin makes every token
    /// stale.
    pub fn is_fresh(&self, now_epoch_seconds: i64, margin_secs: i64) -> bool {
        self.expires_at_epoch_seconds > now_epoch_seconds.saturating_add(margin_secs)
    }

    pub fn expires_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp(self.expires_at_epoch_seconds, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_tokens() {
        let pair = TokenPair::new("secret-access", "secret-refresh");
        let rendered = format!("{:?}", pair);
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_freshness_boundary() {
        let expiry = DecodedExpiry {
            expires_at_epoch_seconds: 1_300,
        };
        // exactly at the margin counts as stale
        assert!(expiry.is_fresh(999, 300));
        assert!(!expiry.is_fresh(1_000, 300));
        assert!(!expiry.is_fresh(1_001, 300));
        assert!(expiry.expires_at().is_some());
    }

    #[test]
    fn test_huge_margin_never_fresh() {
        let expired = DecodedExpiry {
            expires_at_epoch_seconds: 1,
        };
        assert!(!expired.is_fresh(1_700_000_000, i64::MAX));

        let far_future = DecodedExpiry {
            expires_at_epoch_seconds: i64::MAX,
        };
        assert!(!far_future.is_fresh(1_700_000_000, i64::MAX));
    }
}
