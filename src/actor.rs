//! ActorProxy - a ledger call channel bound to one identity.
//!
//! Built without I/O. When the identity changes a new proxy replaces the
//! old one; a superseded proxy is never reused for new calls.

use crate::error::TransportError;
use crate::identity::Identity;
use crate::ledger::{LedgerTransport, Transaction};
use crate::principal::Principal;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

pub struct ActorProxy {
    identity: Identity,
    caller: Principal,
    transport: Arc<dyn LedgerTransport>,
    generation: u64,
}

impl ActorProxy {
    pub fn new(identity: Identity, transport: Arc<dyn LedgerTransport>, generation: u64) -> Self {
        let caller = identity.principal();
        Self { identity, caller, transport, generation }
    }

    pub fn identity(&self) -> &Identity { &self.identity }
    pub fn caller(&self) -> &Principal { &self.caller }
    pub fn generation(&self) -> u64 { self.generation }

    pub async fn whoami(&self) -> Result<Principal, TransportError> { self.transport.whoami(&self.caller).await }

    pub async fn get_my_balance(&self) -> Result<u64, TransportError> { self.transport.get_my_balance(&self.caller).await }

    pub async fn get_total_supply(&self) -> Result<u64, TransportError> { self.transport.get_total_supply(&self.caller).await }

    pub async fn get_my_transactions(&self) -> Result<Vec<Transaction>, TransportError> {
        self.transport.get_my_transactions(&self.caller).await
    }

    pub async fn mine_tokens(&self, amount: u64) -> Result<Value, TransportError> {
        self.transport.mine_tokens(&self.caller, amount).await
    }

    pub async fn send_tokens(&self, to: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.transport.send_tokens(&self.caller, to, amount).await
    }

    pub async fn sell_tokens(&self, amount: u64) -> Result<Value, TransportError> {
        self.transport.sell_tokens(&self.caller, amount).await
    }
}

impl fmt::Debug for ActorProxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActorProxy").field("caller", &self.caller).field("generation", &self.generation).finish()
    }
}
