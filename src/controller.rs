//! WalletController - what a UI drives.
//!
//! Wires one `WalletState` through the session, sync and executor. Operation
//! forms stay with the caller and are lent per submission.

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::executor::{OperationExecutor, Submission};
use crate::identity::{IdentityProvider, LoginOptions};
use crate::ledger::LedgerTransport;
use crate::session::AuthSession;
use crate::state::{OperationForm, StateHandle, WalletState};
use std::sync::Arc;

pub struct WalletController {
    config: ClientConfig,
    state: StateHandle,
    session: AuthSession,
    executor: OperationExecutor,
}

impl WalletController {
    pub fn new(config: ClientConfig, provider: Arc<dyn IdentityProvider>, transport: Arc<dyn LedgerTransport>) -> Self {
        let state = StateHandle::new();
        let options = LoginOptions {
            identity_provider: config.identity_provider.clone(),
            max_time_to_live: config.max_time_to_live,
        };
        let session = AuthSession::new(provider, transport, options, state.clone());
        let executor = OperationExecutor::new(state.clone());
        Self { config, state, session, executor }
    }

    pub fn config(&self) -> &ClientConfig { &self.config }
    pub fn session(&self) -> &AuthSession { &self.session }
    pub fn state(&self) -> &StateHandle { &self.state }
    pub fn snapshot(&self) -> WalletState { self.state.snapshot() }

    pub async fn init(&self) { self.session.init().await }
    pub async fn login(&self) -> ClientResult<()> { self.session.login().await }
    pub async fn logout(&self) -> ClientResult<()> { self.session.logout().await }
    pub async fn whoami(&self) { self.session.whoami().await }

    pub async fn refresh(&self) {
        let actor = self.session.actor();
        self.session.sync().refresh_all(actor.as_deref()).await;
    }

    pub async fn mine(&self, form: &mut OperationForm) -> Submission {
        let actor = self.session.actor();
        self.executor.mine(actor.as_deref(), form).await
    }

    pub async fn send(&self, form: &mut OperationForm) -> Submission {
        let actor = self.session.actor();
        self.executor.send(actor.as_deref(), form).await
    }

    pub async fn sell(&self, form: &mut OperationForm) -> Submission {
        let actor = self.session.actor();
        self.executor.sell(actor.as_deref(), form).await
    }
}
