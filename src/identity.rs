//! Identity and the identity-provider boundary.
//!
//! The provider owns login state and its persistence. The client only asks
//! it for the current identity, whether a session exists, and to run the
//! login/logout flows.

use crate::error::{ClientError, ClientResult};
use crate::principal::Principal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::time::Duration;

const SEED_CONTEXT: &str = "utk-client identity seed v1";
const PUBLIC_KEY_CONTEXT: &str = "utk-client identity public key v1";

/// Cryptographic identity the ledger sees as the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Delegated { public_key: Vec<u8>, principal: Principal },
}

impl Identity {
    pub fn from_public_key(public_key: Vec<u8>) -> Self {
        let principal = Principal::self_authenticating(&public_key);
        Self::Delegated { public_key, principal }
    }

    /// Deterministic identity for a passphrase. Same passphrase, same principal.
    pub fn from_passphrase(passphrase: &str) -> Self {
        let seed = blake3::derive_key(SEED_CONTEXT, passphrase.as_bytes());
        let public_key = blake3::derive_key(PUBLIC_KEY_CONTEXT, &seed);
        Self::from_public_key(public_key.to_vec())
    }

    pub fn principal(&self) -> Principal {
        match self {
            Identity::Anonymous => Principal::anonymous(),
            Identity::Delegated { principal, .. } => principal.clone(),
        }
    }

    pub fn is_anonymous(&self) -> bool { matches!(self, Identity::Anonymous) }
}

#[derive(Debug, Clone)]
pub struct LoginOptions {
    pub identity_provider: String,
    pub max_time_to_live: Duration,
}

/// Redirect-based authorization flow. `login` returns once the flow's
/// success callback would have fired.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current identity, `Identity::Anonymous` when logged out.
    fn identity(&self) -> Identity;
    async fn is_authenticated(&self) -> bool;
    async fn login(&self, options: &LoginOptions) -> ClientResult<()>;
    async fn logout(&self) -> ClientResult<()>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SessionFile {
    public_key: String,
    expires_at: i64,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    identity: Identity,
    expires_at: i64,
}

/// In-process provider for development: a passphrase stands in for the
/// browser round trip. Sessions optionally survive restarts via a JSON file.
#[derive(Debug)]
pub struct LocalIdentityProvider {
    passphrase: String,
    session_file: Option<PathBuf>,
    session: RwLock<Option<ActiveSession>>,
}

impl LocalIdentityProvider {
    pub fn new(passphrase: impl Into<String>) -> Self {
        Self { passphrase: passphrase.into(), session_file: None, session: RwLock::new(None) }
    }

    /// Provider backed by a session file; resumes a stored, unexpired session.
    pub fn open(passphrase: impl Into<String>, session_file: impl Into<PathBuf>) -> ClientResult<Self> {
        let session_file = session_file.into();
        let session = load_session(&session_file)?;
        if session.is_some() {
            tracing::info!(path = %session_file.display(), "resumed stored identity session");
        }
        Ok(Self { passphrase: passphrase.into(), session_file: Some(session_file), session: RwLock::new(session) })
    }

    fn active(&self) -> Option<ActiveSession> {
        let guard = self.session.read().unwrap_or_else(|p| p.into_inner());
        guard.clone().filter(|s| s.expires_at > chrono::Utc::now().timestamp())
    }

    fn store(&self, session: Option<ActiveSession>) -> ClientResult<()> {
        if let Some(path) = &self.session_file {
            match &session {
                Some(active) => save_session(path, active)?,
                None if path.exists() => std::fs::remove_file(path)?,
                None => {}
            }
        }
        *self.session.write().unwrap_or_else(|p| p.into_inner()) = session;
        Ok(())
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn identity(&self) -> Identity {
        self.active().map(|s| s.identity).unwrap_or(Identity::Anonymous)
    }

    async fn is_authenticated(&self) -> bool { self.active().is_some() }

    async fn login(&self, options: &LoginOptions) -> ClientResult<()> {
        if options.identity_provider.trim().is_empty() {
            return Err(ClientError::Auth("no identity provider configured".into()));
        }
        if self.passphrase.is_empty() {
            return Err(ClientError::Auth("authorization declined".into()));
        }
        let ttl = i64::try_from(options.max_time_to_live.as_secs()).unwrap_or(i64::MAX);
        let session = ActiveSession {
            identity: Identity::from_passphrase(&self.passphrase),
            expires_at: chrono::Utc::now().timestamp().saturating_add(ttl),
        };
        tracing::debug!(provider = %options.identity_provider, "authorization approved");
        self.store(Some(session))
    }

    async fn logout(&self) -> ClientResult<()> { self.store(None) }
}

fn load_session(path: &Path) -> ClientResult<Option<ActiveSession>> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = std::fs::read_to_string(path)?;
    let file: SessionFile = serde_json::from_str(&raw)?;
    let public_key = hex::decode(&file.public_key)
        .map_err(|e| ClientError::Auth(format!("session key: {e}")))?;
    Ok(Some(ActiveSession { identity: Identity::from_public_key(public_key), expires_at: file.expires_at }))
}

fn save_session(path: &Path, session: &ActiveSession) -> ClientResult<()> {
    let Identity::Delegated { public_key, .. } = &session.identity else {
        return Err(ClientError::Auth("cannot persist anonymous session".into()));
    };
    let file = SessionFile { public_key: hex::encode(public_key), expires_at: session.expires_at };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}
