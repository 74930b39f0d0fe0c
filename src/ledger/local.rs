//! LocalLedger - in-process ledger for development and tests.
//!
//! Mirrors the remote service's reply shapes: `mine_tokens` answers with a
//! bare string, `send_tokens`/`sell_tokens` with `{"Ok": ..}`/`{"Err": ..}`.

use super::{LedgerTransport, Transaction, TxKind};
use crate::error::{ClientResult, TransportError};
use crate::principal::Principal;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Book {
    balances: HashMap<Principal, u64>,
    total_supply: u64,
    history: HashMap<Principal, Vec<Transaction>>,
    #[serde(default)]
    last_timestamp: u64,
}

impl Book {
    fn next_timestamp(&mut self) -> u64 {
        let now = chrono::Utc::now().timestamp_nanos_opt().unwrap_or(0).max(0) as u64;
        self.last_timestamp = now.max(self.last_timestamp.saturating_add(1));
        self.last_timestamp
    }

    fn balance(&self, who: &Principal) -> u64 { self.balances.get(who).copied().unwrap_or(0) }

    fn record(&mut self, who: &Principal, tx: Transaction) {
        self.history.entry(who.clone()).or_default().push(tx);
    }
}

#[derive(Debug)]
pub struct LocalLedger {
    symbol: String,
    book: Mutex<Book>,
    offline: AtomicBool,
}

impl Default for LocalLedger {
    fn default() -> Self { Self::new() }
}

impl LocalLedger {
    pub fn new() -> Self {
        Self { symbol: "UTK".into(), book: Mutex::new(Book::default()), offline: AtomicBool::new(false) }
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self { self.symbol = symbol.into(); self }

    /// Load a snapshot written by [`LocalLedger::save`], or start empty.
    pub fn open(path: &Path) -> ClientResult<Self> {
        let ledger = Self::new();
        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            *ledger.lock() = serde_json::from_str(&raw)?;
        }
        Ok(ledger)
    }

    pub fn save(&self, path: &Path) -> ClientResult<()> {
        let raw = serde_json::to_string_pretty(&*self.lock())?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, raw)?;
        Ok(())
    }

    /// While offline every call fails with `TransportError::Unreachable`.
    pub fn set_offline(&self, offline: bool) { self.offline.store(offline, Ordering::SeqCst); }

    pub fn balance_of(&self, who: &Principal) -> u64 { self.lock().balance(who) }

    pub fn total_supply(&self) -> u64 { self.lock().total_supply }

    fn lock(&self) -> std::sync::MutexGuard<'_, Book> {
        self.book.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn reachable(&self) -> Result<(), TransportError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("local ledger offline".into()));
        }
        Ok(())
    }
}

fn reject(caller: &Principal, amount: u64) -> Option<Value> {
    if caller.is_anonymous() {
        return Some(json!({"Err": "Anonymous caller"}));
    }
    if amount == 0 {
        return Some(json!({"Err": "Amount must be positive"}));
    }
    None
}

#[async_trait]
impl LedgerTransport for LocalLedger {
    async fn whoami(&self, caller: &Principal) -> Result<Principal, TransportError> {
        self.reachable()?;
        Ok(caller.clone())
    }

    async fn get_my_balance(&self, caller: &Principal) -> Result<u64, TransportError> {
        self.reachable()?;
        Ok(self.lock().balance(caller))
    }

    async fn get_total_supply(&self, _caller: &Principal) -> Result<u64, TransportError> {
        self.reachable()?;
        Ok(self.lock().total_supply)
    }

    async fn get_my_transactions(&self, caller: &Principal) -> Result<Vec<Transaction>, TransportError> {
        self.reachable()?;
        Ok(self.lock().history.get(caller).cloned().unwrap_or_default())
    }

    async fn mine_tokens(&self, caller: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.reachable()?;
        if let Some(err) = reject(caller, amount) {
            return Ok(err);
        }
        let mut book = self.lock();
        let (Some(balance), Some(supply)) = (book.balance(caller).checked_add(amount), book.total_supply.checked_add(amount)) else {
            return Ok(json!({"Err": "Supply overflow"}));
        };
        book.balances.insert(caller.clone(), balance);
        book.total_supply = supply;
        let timestamp = book.next_timestamp();
        book.record(caller, Transaction { kind: TxKind::Mine, amount, from: None, to: Some(caller.clone()), timestamp });
        Ok(Value::String(format!("Minted {} {}", amount, self.symbol)))
    }

    async fn send_tokens(&self, caller: &Principal, to: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.reachable()?;
        if let Some(err) = reject(caller, amount) {
            return Ok(err);
        }
        if caller == to {
            return Ok(json!({"Err": "Cannot send to yourself"}));
        }
        let mut book = self.lock();
        let from_balance = book.balance(caller);
        if from_balance < amount {
            return Ok(json!({"Err": "Insufficient balance"}));
        }
        let Some(to_balance) = book.balance(to).checked_add(amount) else {
            return Ok(json!({"Err": "Recipient balance overflow"}));
        };
        book.balances.insert(caller.clone(), from_balance - amount);
        book.balances.insert(to.clone(), to_balance);
        let timestamp = book.next_timestamp();
        let (from, dest) = (Some(caller.clone()), Some(to.clone()));
        book.record(caller, Transaction { kind: TxKind::Send, amount, from: from.clone(), to: dest.clone(), timestamp });
        book.record(to, Transaction { kind: TxKind::Receive, amount, from, to: dest, timestamp });
        Ok(json!({"Ok": format!("Sent {} {} to {}", amount, self.symbol, to)}))
    }

    async fn sell_tokens(&self, caller: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.reachable()?;
        if let Some(err) = reject(caller, amount) {
            return Ok(err);
        }
        let mut book = self.lock();
        let balance = book.balance(caller);
        if balance < amount {
            return Ok(json!({"Err": "Insufficient balance"}));
        }
        book.balances.insert(caller.clone(), balance - amount);
        book.total_supply = book.total_supply.saturating_sub(amount);
        let timestamp = book.next_timestamp();
        book.record(caller, Transaction { kind: TxKind::Sell, amount, from: Some(caller.clone()), to: None, timestamp });
        Ok(json!({"Ok": format!("Sold {} {}", amount, self.symbol)}))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Principal { Principal::self_authenticating(b"alice") }
    fn bob() -> Principal { Principal::self_authenticating(b"bob") }

    #[tokio::test]
    async fn mine_send_sell_accounting() {
        let ledger = LocalLedger::new();
        assert_eq!(ledger.mine_tokens(&alice(), 100).await.unwrap(), json!("Minted 100 UTK"));
        assert_eq!(ledger.send_tokens(&alice(), &bob(), 30).await.unwrap()["Ok"].as_str().map(|s| s.starts_with("Sent 30 UTK")), Some(true));
        assert_eq!(ledger.sell_tokens(&alice(), 20).await.unwrap(), json!({"Ok": "Sold 20 UTK"}));

        assert_eq!(ledger.balance_of(&alice()), 50);
        assert_eq!(ledger.balance_of(&bob()), 30);
        assert_eq!(ledger.total_supply(), 80);

        let history = ledger.get_my_transactions(&alice()).await.unwrap();
        let kinds: Vec<_> = history.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![TxKind::Mine, TxKind::Send, TxKind::Sell]);
        assert!(history.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(ledger.get_my_transactions(&bob()).await.unwrap()[0].kind, TxKind::Receive);
    }

    #[tokio::test]
    async fn business_failures_leave_book_untouched() {
        let ledger = LocalLedger::new();
        ledger.mine_tokens(&alice(), 10).await.unwrap();
        assert_eq!(ledger.sell_tokens(&alice(), 11).await.unwrap(), json!({"Err": "Insufficient balance"}));
        assert_eq!(ledger.send_tokens(&alice(), &bob(), 11).await.unwrap(), json!({"Err": "Insufficient balance"}));
        assert_eq!(ledger.mine_tokens(&Principal::anonymous(), 5).await.unwrap(), json!({"Err": "Anonymous caller"}));
        assert_eq!(ledger.balance_of(&alice()), 10);
        assert_eq!(ledger.total_supply(), 10);
    }

    #[tokio::test]
    async fn offline_fails_every_call() {
        let ledger = LocalLedger::new();
        ledger.set_offline(true);
        assert!(matches!(ledger.get_my_balance(&alice()).await, Err(TransportError::Unreachable(_))));
        assert!(ledger.mine_tokens(&alice(), 1).await.is_err());
        ledger.set_offline(false);
        assert_eq!(ledger.get_my_balance(&alice()).await, Ok(0));
    }

    #[tokio::test]
    async fn snapshot_survives_reopen() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("ledger.json");
        let ledger = LocalLedger::open(&path).expect("open");
        ledger.mine_tokens(&alice(), 42).await.unwrap();
        ledger.save(&path).expect("save");

        let reopened = LocalLedger::open(&path).expect("reopen");
        assert_eq!(reopened.balance_of(&alice()), 42);
        assert_eq!(reopened.get_my_transactions(&alice()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn saturated_clock_in_snapshot_does_not_panic() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let path = dir.path().join("ledger.json");
        let book = json!({"balances": {}, "total_supply": 0, "history": {}, "last_timestamp": u64::MAX});
        std::fs::write(&path, book.to_string()).expect("write");

        let ledger = LocalLedger::open(&path).expect("open");
        assert_eq!(ledger.mine_tokens(&alice(), 1).await.unwrap(), json!("Minted 1 UTK"));
        assert_eq!(ledger.get_my_transactions(&alice()).await.unwrap()[0].timestamp, u64::MAX);
    }
}
