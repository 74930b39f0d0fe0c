//! Ledger boundary - the remote service holding balances, supply and history.
//!
//! # Contract
//!
//! | Call | Returns |
//! |------|---------|
//! | `whoami` | caller principal |
//! | `get_my_balance` | caller balance |
//! | `get_total_supply` | total supply |
//! | `get_my_transactions` | caller history, ledger order (oldest first) |
//! | `mine_tokens(n)` | raw outcome |
//! | `send_tokens(to, n)` | raw outcome |
//! | `sell_tokens(n)` | raw outcome |
//!
//! Mutations return the raw JSON outcome untouched; `outcome::Outcome`
//! decodes it.

mod local;

pub use local::LocalLedger;

use crate::error::TransportError;
use crate::principal::Principal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind { Mine, Send, Receive, Sell }

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self { TxKind::Mine => "mine", TxKind::Send => "send", TxKind::Receive => "receive", TxKind::Sell => "sell" }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "tx_type")]
    pub kind: TxKind,
    pub amount: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<Principal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Principal>,
    /// Nanoseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Calls into the ledger on behalf of `caller`.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    async fn whoami(&self, caller: &Principal) -> Result<Principal, TransportError>;
    async fn get_my_balance(&self, caller: &Principal) -> Result<u64, TransportError>;
    async fn get_total_supply(&self, caller: &Principal) -> Result<u64, TransportError>;
    async fn get_my_transactions(&self, caller: &Principal) -> Result<Vec<Transaction>, TransportError>;
    async fn mine_tokens(&self, caller: &Principal, amount: u64) -> Result<Value, TransportError>;
    async fn send_tokens(&self, caller: &Principal, to: &Principal, amount: u64) -> Result<Value, TransportError>;
    async fn sell_tokens(&self, caller: &Principal, amount: u64) -> Result<Value, TransportError>;
}
