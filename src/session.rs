//! AuthSession - login lifecycle and ownership of the current `ActorProxy`.
//!
//! ```text
//! Unauthenticated ──login()──▶ Authenticating ──success──▶ Authenticated
//!        ▲                            │                          │
//!        └────────── failure ─────────┘                          │
//!        └──────────────────────── logout() ─────────────────────┘
//! ```
//!
//! Every (re)initialization builds a fresh proxy for the provider's current
//! identity and swaps it in whole. Calls still running on the old proxy finish
//! against the old identity; their results are dropped as stale.

use crate::actor::ActorProxy;
use crate::error::ClientResult;
use crate::identity::{IdentityProvider, LoginOptions};
use crate::ledger::LedgerTransport;
use crate::state::{AuthPhase, StateHandle};
use crate::sync::SyncController;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

pub const PRINCIPAL_LOADING: &str = "Loading...";
pub const PRINCIPAL_ERROR: &str = "Error fetching principal";

pub struct AuthSession {
    provider: Arc<dyn IdentityProvider>,
    transport: Arc<dyn LedgerTransport>,
    options: LoginOptions,
    state: StateHandle,
    sync: SyncController,
    actor: RwLock<Option<Arc<ActorProxy>>>,
    client_ready: AtomicBool,
    generations: AtomicU64,
}

impl AuthSession {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        transport: Arc<dyn LedgerTransport>,
        options: LoginOptions,
        state: StateHandle,
    ) -> Self {
        let sync = SyncController::new(state.clone());
        Self {
            provider,
            transport,
            options,
            state,
            sync,
            actor: RwLock::new(None),
            client_ready: AtomicBool::new(false),
            generations: AtomicU64::new(0),
        }
    }

    /// The live proxy, if initialization has run.
    pub fn actor(&self) -> Option<Arc<ActorProxy>> {
        self.actor.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    /// Build a proxy for the current identity and, when a provider session
    /// already exists, enter `Authenticated` and populate state.
    pub async fn init(&self) {
        self.client_ready.store(true, Ordering::SeqCst);
        let identity = self.provider.identity();
        let generation = self.generations.fetch_add(1, Ordering::SeqCst) + 1;
        let actor = Arc::new(ActorProxy::new(identity.clone(), self.transport.clone(), generation));
        let authenticated = self.provider.is_authenticated().await;

        self.swap_actor(Some(actor.clone()));
        let principal = identity.principal().to_text();
        self.state.update(|s| {
            s.set_generation(generation);
            s.set_session(Some(identity), authenticated);
            if authenticated {
                s.set_principal(principal.as_str());
            } else {
                s.set_principal("");
                s.clear_wallet();
            }
        });

        if authenticated {
            tracing::info!(%principal, generation, "session authenticated");
            self.sync.refresh_all(Some(actor.as_ref())).await;
        } else {
            tracing::info!(generation, "session unauthenticated");
        }
    }

    /// Run the provider's authorization flow, then re-initialize.
    /// Does nothing before `init` has created the provider client.
    pub async fn login(&self) -> ClientResult<()> {
        if !self.client_ready.load(Ordering::SeqCst) {
            return Ok(());
        }
        let previous = self.state.update(|s| {
            let previous = s.phase();
            s.set_phase(AuthPhase::Authenticating);
            previous
        });
        tracing::info!(provider = %self.options.identity_provider, "login started");
        match self.provider.login(&self.options).await {
            Ok(()) => {
                self.init().await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                self.state.update(|s| s.set_phase(previous));
                Err(e)
            }
        }
    }

    pub async fn logout(&self) -> ClientResult<()> {
        if !self.client_ready.load(Ordering::SeqCst) {
            return Ok(());
        }
        self.provider.logout().await?;
        self.swap_actor(None);
        tracing::info!("logged out");
        self.init().await;
        Ok(())
    }

    /// Ask the ledger who we are; the displayed principal reads `"Loading..."`
    /// meanwhile and an explicit error placeholder on failure.
    pub async fn whoami(&self) {
        let Some(actor) = self.actor() else { return };
        self.state.update(|s| s.set_principal(PRINCIPAL_LOADING));
        let result = actor.whoami().await;
        self.state.update(|s| {
            if s.generation() != actor.generation() {
                return;
            }
            match result {
                Ok(principal) => s.set_principal(principal.to_text()),
                Err(e) => {
                    tracing::warn!(error = %e, "whoami failed");
                    s.set_principal(PRINCIPAL_ERROR);
                }
            }
        });
    }

    pub fn sync(&self) -> &SyncController { &self.sync }

    fn swap_actor(&self, actor: Option<Arc<ActorProxy>>) {
        *self.actor.write().unwrap_or_else(|p| p.into_inner()) = actor;
    }
}
