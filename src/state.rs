//! WalletState - the one state record the controller owns.
//!
//! Presentation reads clones; writes go through the named transitions below,
//! reachable only from inside the crate.

use crate::identity::Identity;
use crate::ledger::Transaction;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthPhase {
    #[default]
    Unauthenticated,
    Authenticating,
    Authenticated,
}

impl AuthPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthPhase::Unauthenticated => "unauthenticated",
            AuthPhase::Authenticating => "authenticating",
            AuthPhase::Authenticated => "authenticated",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct WalletState {
    identity: Option<Identity>,
    principal: String,
    phase: AuthPhase,
    balance: u64,
    total_supply: u64,
    transactions: Vec<Transaction>,
    reads_in_flight: usize,
    busy: bool,
    generation: u64,
}

impl WalletState {
    pub fn identity(&self) -> Option<&Identity> { self.identity.as_ref() }
    /// Displayed identifier; `"Loading..."` while a whoami is pending.
    pub fn principal(&self) -> &str { &self.principal }
    pub fn phase(&self) -> AuthPhase { self.phase }
    pub fn is_authenticated(&self) -> bool { self.phase == AuthPhase::Authenticated }
    pub fn balance(&self) -> u64 { self.balance }
    pub fn total_supply(&self) -> u64 { self.total_supply }
    /// Most recent first.
    pub fn transactions(&self) -> &[Transaction] { &self.transactions }
    pub fn is_busy(&self) -> bool { self.busy }
    pub fn is_loading(&self) -> bool { self.busy || self.reads_in_flight > 0 }
    pub fn generation(&self) -> u64 { self.generation }

    pub(crate) fn set_session(&mut self, identity: Option<Identity>, authenticated: bool) {
        self.identity = identity;
        self.phase = if authenticated { AuthPhase::Authenticated } else { AuthPhase::Unauthenticated };
    }
    pub(crate) fn set_phase(&mut self, phase: AuthPhase) { self.phase = phase; }
    pub(crate) fn set_principal(&mut self, principal: impl Into<String>) { self.principal = principal.into(); }
    pub(crate) fn set_balance(&mut self, balance: u64) { self.balance = balance; }
    pub(crate) fn set_total_supply(&mut self, supply: u64) { self.total_supply = supply; }
    pub(crate) fn set_transactions(&mut self, transactions: Vec<Transaction>) { self.transactions = transactions; }
    /// Drop cached ledger data when nobody is signed in.
    pub(crate) fn clear_wallet(&mut self) {
        self.balance = 0;
        self.total_supply = 0;
        self.transactions.clear();
    }
    pub(crate) fn set_busy(&mut self, busy: bool) { self.busy = busy; }
    pub(crate) fn set_generation(&mut self, generation: u64) { self.generation = generation; }
    pub(crate) fn begin_read(&mut self) { self.reads_in_flight += 1; }
    pub(crate) fn end_read(&mut self) { self.reads_in_flight = self.reads_in_flight.saturating_sub(1); }
}

/// Shared handle. Never hold the lock across an `.await`.
#[derive(Debug, Clone, Default)]
pub struct StateHandle(Arc<Mutex<WalletState>>);

impl StateHandle {
    pub fn new() -> Self { Self::default() }

    pub fn snapshot(&self) -> WalletState { self.lock().clone() }

    pub(crate) fn update<R>(&self, f: impl FnOnce(&mut WalletState) -> R) -> R { f(&mut self.lock()) }

    pub fn read<R>(&self, f: impl FnOnce(&WalletState) -> R) -> R { f(&self.lock()) }

    fn lock(&self) -> MutexGuard<'_, WalletState> { self.0.lock().unwrap_or_else(|p| p.into_inner()) }
}

/// Input for one operation panel. Owned by the UI; lent to the executor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationForm {
    pub amount: String,
    pub recipient: Option<String>,
    pub result_message: String,
}

impl OperationForm {
    pub fn new(amount: impl Into<String>) -> Self { Self { amount: amount.into(), ..Default::default() } }

    pub fn transfer(recipient: impl Into<String>, amount: impl Into<String>) -> Self {
        Self { amount: amount.into(), recipient: Some(recipient.into()), result_message: String::new() }
    }

    pub(crate) fn clear_inputs(&mut self) {
        self.amount.clear();
        if let Some(recipient) = self.recipient.as_mut() {
            recipient.clear();
        }
    }
}
