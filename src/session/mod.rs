//! Session state: who is signed in, restored from durable storage.
//!
//! Invariant: the credential and the identity record are both present or
//! both absent — never one without the other. [`Session::restore`] enforces
//! this at load time by tearing down any half-written state, and treats a
//! malformed identity record exactly like "not signed in".

pub mod guard;
pub mod store;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

pub use guard::{LoginBoundary, PromptLoginBoundary, SessionGuard};
pub use store::{SessionStore, THEME_KEY, TOKEN_KEY, USER_KEY};

use crate::error::StoreError;

/// Account tier, as issued by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Normal,
    Premium,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Premium => "premium",
            Self::Admin => "admin",
        }
    }

    /// Human-readable tier label for the user-info line.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Normal => "Standard user",
            Self::Premium => "Premium user",
            Self::Admin => "Administrator",
        }
    }
}

/// Identity record persisted under the `user` key. Extra backend fields
/// (ids, email) are ignored on read and not carried.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub role: Role,
}

impl Identity {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or("unknown")
    }
}

/// Immutable snapshot of the signed-in session, read from storage at the
/// point of use. The guard does not trust this copy of the credential; it
/// re-reads storage on every request.
#[derive(Debug)]
pub struct Session {
    pub credential: SecretString,
    pub identity: Identity,
}

impl Session {
    /// Load-time gate. Returns the session when both keys are present and
    /// the identity parses; otherwise tears down whatever is there and
    /// returns `None`. Runs before any other initialization.
    pub fn restore(store: &SessionStore) -> Result<Option<Self>, StoreError> {
        let token = store.get(TOKEN_KEY)?;
        let user = store.get(USER_KEY)?;

        let (token, user) = match (token, user) {
            (Some(t), Some(u)) => (t, u),
            (None, None) => return Ok(None),
            _ => {
                // Half-written state violates the both-or-neither invariant.
                teardown(store);
                return Ok(None);
            }
        };

        match serde_json::from_str::<Identity>(&user) {
            Ok(identity) => Ok(Some(Self {
                credential: SecretString::from(token),
                identity,
            })),
            Err(e) => {
                tracing::warn!("stored identity record is malformed, clearing session: {e}");
                teardown(store);
                Ok(None)
            }
        }
    }

    /// Write both keys. Used after a successful login.
    pub fn persist(store: &SessionStore, token: &str, identity: &Identity) -> Result<(), StoreError> {
        let record = serde_json::to_string(identity).map_err(|e| StoreError::Write {
            key: USER_KEY.to_string(),
            source: std::io::Error::other(e),
        })?;
        store.put(TOKEN_KEY, token)?;
        store.put(USER_KEY, &record)?;
        Ok(())
    }
}

/// Remove all session-identifying data. Idempotent: removing absent keys
/// is a no-op, and removal failures are logged rather than surfaced —
/// teardown is already the recovery path.
pub fn teardown(store: &SessionStore) {
    for key in [TOKEN_KEY, USER_KEY] {
        if let Err(e) = store.remove(key) {
            tracing::warn!("failed to remove '{key}' during session teardown: {e}");
        }
    }
}
