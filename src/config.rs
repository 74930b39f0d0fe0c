//! Client configuration - passed from higher layers or read from the env.

use crate::error::{ClientError, ClientResult};
use crate::principal::Principal;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_IDENTITY_PROVIDER: &str = "https://identity.ic0.app/#authorize";
pub const DEFAULT_TOKEN_SYMBOL: &str = "UTK";
/// Delegation lifetime requested at login (8 hours).
pub const DEFAULT_MAX_TIME_TO_LIVE: Duration = Duration::from_secs(8 * 60 * 60);

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub app: String,
    pub identity_provider: String,
    pub ledger_canister_id: Option<Principal>,
    pub token_symbol: String,
    pub max_time_to_live: Duration,
    pub session_file: Option<PathBuf>,
    pub ledger_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app: "utk".into(),
            identity_provider: DEFAULT_IDENTITY_PROVIDER.into(),
            ledger_canister_id: None,
            token_symbol: DEFAULT_TOKEN_SYMBOL.into(),
            max_time_to_live: DEFAULT_MAX_TIME_TO_LIVE,
            session_file: None,
            ledger_file: None,
        }
    }
}

impl ClientConfig {
    pub fn new(app: impl Into<String>) -> Self { Self { app: app.into(), ..Default::default() } }
    pub fn with_identity_provider(mut self, url: impl Into<String>) -> Self { self.identity_provider = url.into(); self }
    pub fn with_ledger_canister(mut self, id: Principal) -> Self { self.ledger_canister_id = Some(id); self }
    pub fn with_token_symbol(mut self, symbol: impl Into<String>) -> Self { self.token_symbol = symbol.into(); self }
    pub fn with_max_time_to_live(mut self, ttl: Duration) -> Self { self.max_time_to_live = ttl; self }
    pub fn with_session_file(mut self, path: impl Into<PathBuf>) -> Self { self.session_file = Some(path.into()); self }
    pub fn with_ledger_file(mut self, path: impl Into<PathBuf>) -> Self { self.ledger_file = Some(path.into()); self }

    /// Defaults overridden by `UTK_*` variables (after loading `.env`).
    pub fn from_env() -> ClientResult<Self> {
        load_dotenv(".env");
        let mut config = Self::default();
        if let Ok(url) = std::env::var("UTK_IDENTITY_PROVIDER") {
            config.identity_provider = url;
        }
        if let Ok(id) = std::env::var("UTK_LEDGER_CANISTER_ID") {
            let id = Principal::from_text(id.trim())
                .map_err(|e| ClientError::Config(format!("UTK_LEDGER_CANISTER_ID: {e}")))?;
            config.ledger_canister_id = Some(id);
        }
        if let Ok(symbol) = std::env::var("UTK_TOKEN_SYMBOL") {
            config.token_symbol = symbol;
        }
        if let Ok(secs) = std::env::var("UTK_MAX_TTL_SECS") {
            let secs: u64 = secs.trim().parse()
                .map_err(|e| ClientError::Config(format!("UTK_MAX_TTL_SECS: {e}")))?;
            config.max_time_to_live = Duration::from_secs(secs);
        }
        if let Ok(path) = std::env::var("UTK_SESSION_FILE") {
            config.session_file = Some(path.into());
        }
        if let Ok(path) = std::env::var("UTK_LEDGER_FILE") {
            config.ledger_file = Some(path.into());
        }
        Ok(config)
    }

    /// `<data_local_dir>/<app>`, or `UTK_ROOT/<app>` when set.
    #[cfg(feature = "native")]
    pub fn data_dir(&self) -> PathBuf {
        let root = std::env::var("UTK_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| dirs::data_local_dir().unwrap_or_else(|| PathBuf::from(".")));
        root.join(&self.app)
    }
}

/// Set variables from a `KEY=value` file without overriding the environment.
fn load_dotenv(path: &str) {
    let Ok(contents) = std::fs::read_to_string(path) else { return };
    for line in contents.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            if !value.is_empty() && std::env::var(key.trim()).is_err() {
                std::env::set_var(key.trim(), value);
            }
        }
    }
}
