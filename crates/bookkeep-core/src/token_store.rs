//! Persisted session tokens
//!
//! Opaque key/value holder for the access token, refresh token and the
//! logged-in user's profile. State lives in memory behind a
//! `parking_lot::RwLock` and, for file-backed stores, every mutation is
//! written through to `session.json` (temp file + rename) so the session
//! survives restarts.

use crate::error::CoreError;
use bookkeep_types::{TokenPair, UserProfile};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Which token to address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKey {
    Access,
    Refresh,
}

/// On-disk shape of `session.json`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionState {
    #[serde(rename = "authToken", default, skip_serializing_if = "Option::is_none")]
    auth_token: Option<String>,

    #[serde(rename = "refreshToken", default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<UserProfile>,
}

impl SessionState {
    fn slot(&mut self, key: TokenKey) -> &mut Option<String> {
        match key {
            TokenKey::Access => &mut self.auth_token,
            TokenKey::Refresh => &mut self.refresh_token,
        }
    }
}

/// Process-wide token holder, shared via `Arc`
pub struct TokenStore {
    /// Backing file (None = memory only)
    path: Option<PathBuf>,

    state: RwLock<SessionState>,
}

impl TokenStore {
    /// Store that never touches disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Open (or lazily create) a file-backed store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, CoreError> {
        let path = path.into();
        let state = load_state(&path)?;
        debug!(
            path = %path.display(),
            has_session = state.auth_token.is_some() && state.refresh_token.is_some(),
            "Session store opened"
        );
        Ok(Self {
            path: Some(path),
            state: RwLock::new(state),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: TokenKey) -> Option<String> {
        let state = self.state.read();
        match key {
            TokenKey::Access => state.auth_token.clone(),
            TokenKey::Refresh => state.refresh_token.clone(),
        }
    }

    pub fn set(&self, key: TokenKey, value: impl Into<String>) -> Result<(), CoreError> {
        self.mutate(|state| *state.slot(key) = Some(value.into()))
    }

    pub fn clear(&self, key: TokenKey) -> Result<(), CoreError> {
        self.mutate(|state| *state.slot(key) = None)
    }

    /// Drop both tokens in one write, keeping the profile
    pub fn clear_tokens(&self) -> Result<(), CoreError> {
        self.mutate(|state| {
            state.auth_token = None;
            state.refresh_token = None;
        })
    }

    /// Drop tokens and profile together
    pub fn clear_all(&self) -> Result<(), CoreError> {
        self.mutate(|state| *state = SessionState::default())
    }

    /// Both tokens, or `None` if either is missing
    pub fn token_pair(&self) -> Option<TokenPair> {
        let state = self.state.read();
        match (&state.auth_token, &state.refresh_token) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        }
    }

    /// Replace both tokens in one write
    pub fn store_pair(&self, pair: &TokenPair) -> Result<(), CoreError> {
        self.mutate(|state| {
            state.auth_token = Some(pair.access_token.clone());
            state.refresh_token = Some(pair.refresh_token.clone());
        })
    }

    /// Replace both tokens, but only while the stored refresh token is still
    /// `expected_refresh`
    ///
    /// Returns `false` without writing when the session was cleared or
    /// replaced in the meantime.
    pub fn replace_pair_if(
        &self,
        expected_refresh: &str,
        pair: &TokenPair,
    ) -> Result<bool, CoreError> {
        let mut state = self.state.write();
        if state.refresh_token.as_deref() != Some(expected_refresh) {
            return Ok(false);
        }
        state.auth_token = Some(pair.access_token.clone());
        state.refresh_token = Some(pair.refresh_token.clone());
        self.persist(&state)?;
        Ok(true)
    }

    pub fn profile(&self) -> Option<UserProfile> {
        self.state.read().profile.clone()
    }

    pub fn set_profile(&self, profile: UserProfile) -> Result<(), CoreError> {
        self.mutate(|state| state.profile = Some(profile))
    }

    fn mutate(&self, apply: impl FnOnce(&mut SessionState)) -> Result<(), CoreError> {
        let mut state = self.state.write();
        apply(&mut state);
        self.persist(&state)
    }

    fn persist(&self, state: &SessionState) -> Result<(), CoreError> {
        match &self.path {
            Some(path) => save_state(path, state),
            None => Ok(()),
        }
    }
}

fn load_state(path: &Path) -> Result<SessionState, CoreError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(SessionState::default()),
        Err(source) => {
            return Err(CoreError::SessionFileRead {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if content.trim().is_empty() {
        return Ok(SessionState::default());
    }

    serde_json::from_str(&content).map_err(|e| {
        warn!(path = %path.display(), error = %e, "Session file is not valid JSON");
        CoreError::SessionFileParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })
}

fn save_state(path: &Path, state: &SessionState) -> Result<(), CoreError> {
    let write_err = |source| CoreError::SessionFileWrite {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }

    let json = serde_json::to_string_pretty(state).map_err(|e| CoreError::SessionFileParse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).map_err(write_err)?;
    restrict_permissions(&tmp).map_err(write_err)?;
    std::fs::rename(&tmp, path).map_err(write_err)?;
    Ok(())
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_in_memory_get_set_clear() {
        let store = TokenStore::in_memory();
        assert!(store.get(TokenKey::Access).is_none());

        store.set(TokenKey::Access, "a1").unwrap();
        assert_eq!(store.get(TokenKey::Access).as_deref(), Some("a1"));
        // partial pair is no session
        assert!(store.token_pair().is_none());

        store.set(TokenKey::Refresh, "r1").unwrap();
        assert_eq!(store.token_pair(), Some(TokenPair::new("a1", "r1")));

        store.clear(TokenKey::Access).unwrap();
        assert!(store.token_pair().is_none());
        assert_eq!(store.get(TokenKey::Refresh).as_deref(), Some("r1"));
    }

    #[test]
    fn test_clear_tokens_keeps_profile() {
        let store = TokenStore::in_memory();
        store.store_pair(&TokenPair::new("a", "r")).unwrap();
        store.set_profile(UserProfile::default()).unwrap();

        store.clear_tokens().unwrap();
        assert!(store.get(TokenKey::Access).is_none());
        assert!(store.get(TokenKey::Refresh).is_none());
        assert!(store.profile().is_some());
    }

    #[test]
    fn test_replace_pair_if_requires_same_refresh_token() {
        let store = TokenStore::in_memory();
        store.store_pair(&TokenPair::new("a1", "r1")).unwrap();

        assert!(store
            .replace_pair_if("r1", &TokenPair::new("a2", "r2"))
            .unwrap());
        assert_eq!(store.token_pair(), Some(TokenPair::new("a2", "r2")));

        // r1 was already spent
        assert!(!store
            .replace_pair_if("r1", &TokenPair::new("a3", "r3"))
            .unwrap());
        assert_eq!(store.token_pair(), Some(TokenPair::new("a2", "r2")));

        store.clear_all().unwrap();
        assert!(!store
            .replace_pair_if("r2", &TokenPair::new("a4", "r4"))
            .unwrap());
        assert!(store.token_pair().is_none());
    }

    #[test]
    fn test_clear_all_drops_profile() {
        let store = TokenStore::in_memory();
        store.store_pair(&TokenPair::new("a", "r")).unwrap();
        store
            .set_profile(UserProfile {
                username: "kim".to_string(),
                email: "kim@example.com".to_string(),
                id: "7".to_string(),
            })
            .unwrap();

        store.clear_all().unwrap();
        assert!(store.token_pair().is_none());
        assert!(store.profile().is_none());
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        {
            let store = TokenStore::open(&path).unwrap();
            store.store_pair(&TokenPair::new("access-1", "refresh-1")).unwrap();
        }

        let reopened = TokenStore::open(&path).unwrap();
        assert_eq!(
            reopened.token_pair(),
            Some(TokenPair::new("access-1", "refresh-1"))
        );

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"authToken\""));
        assert!(raw.contains("\"refreshToken\""));
    }

    #[test]
    fn test_file_store_clear_all_persists() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = TokenStore::open(&path).unwrap();
        store.store_pair(&TokenPair::new("a", "r")).unwrap();
        store.clear_all().unwrap();

        let reopened = TokenStore::open(&path).unwrap();
        assert!(reopened.get(TokenKey::Access).is_none());
        assert!(reopened.get(TokenKey::Refresh).is_none());
    }

    #[test]
    fn test_corrupt_file_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "{not json").unwrap();

        let err = TokenStore::open(&path).err().unwrap();
        assert!(matches!(err, CoreError::SessionFileParse { .. }));
    }

    #[test]
    fn test_empty_file_is_empty_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "").unwrap();

        let store = TokenStore::open(&path).unwrap();
        assert!(store.token_pair().is_none());
    }
}
