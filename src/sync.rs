//! SyncController - best-effort reads from the ledger into `WalletState`.
//!
//! Each fetch is independent: one remote read, overwrite on success, reset to
//! the default on failure. Errors stop here.

use crate::actor::ActorProxy;
use crate::state::{StateHandle, WalletState};

/// Which fields a refresh re-reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncFields {
    pub balance: bool,
    pub total_supply: bool,
    pub transactions: bool,
}

impl SyncFields {
    pub const ALL: Self = Self { balance: true, total_supply: true, transactions: true };
    /// What a transfer can change.
    pub const BALANCE_AND_HISTORY: Self = Self { balance: true, total_supply: false, transactions: true };
}

#[derive(Debug, Clone)]
pub struct SyncController {
    state: StateHandle,
}

impl SyncController {
    pub fn new(state: StateHandle) -> Self { Self { state } }

    pub async fn fetch_balance(&self, actor: Option<&ActorProxy>) {
        let Some(actor) = actor else { return };
        self.state.update(|s| s.begin_read());
        let result = actor.get_my_balance().await;
        self.state.update(|s| {
            s.end_read();
            if is_stale(s, actor, "balance") {
                return;
            }
            match result {
                Ok(balance) => s.set_balance(balance),
                Err(e) => {
                    tracing::warn!(error = %e, "balance fetch failed");
                    s.set_balance(0);
                }
            }
        });
    }

    pub async fn fetch_total_supply(&self, actor: Option<&ActorProxy>) {
        let Some(actor) = actor else { return };
        let result = actor.get_total_supply().await;
        self.state.update(|s| {
            if is_stale(s, actor, "total supply") {
                return;
            }
            match result {
                Ok(supply) => s.set_total_supply(supply),
                Err(e) => {
                    tracing::warn!(error = %e, "total supply fetch failed");
                    s.set_total_supply(0);
                }
            }
        });
    }

    /// Stores history most recent first.
    pub async fn fetch_transactions(&self, actor: Option<&ActorProxy>) {
        let Some(actor) = actor else { return };
        let result = actor.get_my_transactions().await;
        self.state.update(|s| {
            if is_stale(s, actor, "transactions") {
                return;
            }
            match result {
                Ok(mut txs) => {
                    txs.reverse();
                    s.set_transactions(txs);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "transactions fetch failed");
                    s.set_transactions(Vec::new());
                }
            }
        });
    }

    /// Issue the selected fetches concurrently.
    pub async fn refresh(&self, actor: Option<&ActorProxy>, fields: SyncFields) {
        let balance = async {
            if fields.balance {
                self.fetch_balance(actor).await;
            }
        };
        let supply = async {
            if fields.total_supply {
                self.fetch_total_supply(actor).await;
            }
        };
        let transactions = async {
            if fields.transactions {
                self.fetch_transactions(actor).await;
            }
        };
        tokio::join!(balance, supply, transactions);
    }

    pub async fn refresh_all(&self, actor: Option<&ActorProxy>) { self.refresh(actor, SyncFields::ALL).await }
}

/// Replies from a superseded proxy belong to an identity nobody shows anymore.
fn is_stale(state: &WalletState, actor: &ActorProxy, field: &str) -> bool {
    let stale = state.generation() != actor.generation();
    if stale {
        tracing::debug!(field, reply_generation = actor.generation(), current = state.generation(), "dropping stale reply");
    }
    stale
}
