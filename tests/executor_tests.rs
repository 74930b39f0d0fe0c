//! Executor Tests: submission discipline against a scripted ledger
//!
//! These tests verify:
//! 1. Local validation never reaches the ledger
//! 2. One submission at a time across mine, send and sell
//! 3. Transport failures keep the inputs and still resync
//! 4. Read failures and stale replies
//! 5. whoami placeholder while pending

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use utk_client::executor::{MSG_INVALID_AMOUNT, MSG_INVALID_PRINCIPAL, MSG_INVALID_TRANSFER};
use utk_client::session::PRINCIPAL_LOADING;
use utk_client::{
    ClientConfig, Identity, LedgerTransport, LocalIdentityProvider, LocalLedger, OperationExecutor, OperationForm,
    Outcome, Principal, StateHandle, Submission, Transaction, TransportError, WalletController,
};

const PASSPHRASE: &str = "executor passphrase";

/// Wraps the local ledger, records every call, and fails or stalls on request.
#[derive(Default)]
struct ScriptedLedger {
    inner: LocalLedger,
    calls: Mutex<Vec<&'static str>>,
    fail_reads: AtomicBool,
    fail_mutations: AtomicBool,
    hold_mine: AtomicBool,
    hold_whoami: AtomicBool,
    entered: Notify,
    release: Notify,
}

impl ScriptedLedger {
    fn record(&self, call: &'static str) { self.calls.lock().unwrap().push(call); }

    fn calls(&self) -> Vec<&'static str> { self.calls.lock().unwrap().clone() }

    fn clear_calls(&self) { self.calls.lock().unwrap().clear(); }

    fn read(&self, call: &'static str) -> Result<(), TransportError> {
        self.record(call);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("scripted read failure".into()));
        }
        Ok(())
    }

    fn mutate(&self, call: &'static str) -> Result<(), TransportError> {
        self.record(call);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(TransportError::Unreachable("scripted mutation failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl LedgerTransport for ScriptedLedger {
    async fn whoami(&self, caller: &Principal) -> Result<Principal, TransportError> {
        self.read("whoami")?;
        if self.hold_whoami.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.whoami(caller).await
    }

    async fn get_my_balance(&self, caller: &Principal) -> Result<u64, TransportError> {
        self.read("get_my_balance")?;
        self.inner.get_my_balance(caller).await
    }

    async fn get_total_supply(&self, caller: &Principal) -> Result<u64, TransportError> {
        self.read("get_total_supply")?;
        self.inner.get_total_supply(caller).await
    }

    async fn get_my_transactions(&self, caller: &Principal) -> Result<Vec<Transaction>, TransportError> {
        self.read("get_my_transactions")?;
        self.inner.get_my_transactions(caller).await
    }

    async fn mine_tokens(&self, caller: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.mutate("mine_tokens")?;
        if self.hold_mine.load(Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.mine_tokens(caller, amount).await
    }

    async fn send_tokens(&self, caller: &Principal, to: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.mutate("send_tokens")?;
        self.inner.send_tokens(caller, to, amount).await
    }

    async fn sell_tokens(&self, caller: &Principal, amount: u64) -> Result<Value, TransportError> {
        self.mutate("sell_tokens")?;
        self.inner.sell_tokens(caller, amount).await
    }
}

async fn setup() -> (WalletController, Arc<ScriptedLedger>) {
    let ledger = Arc::new(ScriptedLedger::default());
    let controller = WalletController::new(
        ClientConfig::default(),
        Arc::new(LocalIdentityProvider::new(PASSPHRASE)),
        ledger.clone(),
    );
    controller.init().await;
    controller.login().await.expect("login");
    ledger.clear_calls();
    (controller, ledger)
}

fn me() -> Principal { Identity::from_passphrase(PASSPHRASE).principal() }

/// Test: no call channel means nothing happens
#[tokio::test]
async fn no_actor_skips() {
    let executor = OperationExecutor::new(StateHandle::new());
    let mut form = OperationForm::new("10");
    assert_eq!(executor.mine(None, &mut form).await, Submission::Skipped);
    assert_eq!(form, OperationForm::new("10"));
}

/// Test: invalid input sets the message and issues no ledger call
#[tokio::test]
async fn validation_issues_no_calls() {
    let (controller, ledger) = setup().await;

    let recipient = Principal::self_authenticating(b"someone").to_text();
    for amount in ["", "abc", "0", "-5", "2.5"] {
        let mut form = OperationForm::new(amount);
        assert_eq!(controller.mine(&mut form).await, Submission::Invalid(MSG_INVALID_AMOUNT));
        assert_eq!(form.result_message, MSG_INVALID_AMOUNT);
        assert_eq!(form.amount, amount);

        let mut form = OperationForm::new(amount);
        assert_eq!(controller.sell(&mut form).await, Submission::Invalid(MSG_INVALID_AMOUNT));
        assert_eq!(form.result_message, MSG_INVALID_AMOUNT);
        assert_eq!(form.amount, amount);

        let mut form = OperationForm::transfer(recipient.clone(), amount);
        assert_eq!(controller.send(&mut form).await, Submission::Invalid(MSG_INVALID_TRANSFER));
        assert_eq!(form.result_message, MSG_INVALID_TRANSFER);
        assert_eq!(form.recipient.as_deref(), Some(recipient.as_str()));
    }

    let mut form = OperationForm::transfer("", "10");
    assert_eq!(controller.send(&mut form).await, Submission::Invalid(MSG_INVALID_TRANSFER));

    let mut form = OperationForm::transfer("   ", "10");
    assert_eq!(controller.send(&mut form).await, Submission::Invalid(MSG_INVALID_PRINCIPAL));

    let mut form = OperationForm::transfer("not a principal", "10");
    assert_eq!(controller.send(&mut form).await, Submission::Invalid(MSG_INVALID_PRINCIPAL));
    assert_eq!(form.result_message, MSG_INVALID_PRINCIPAL);
    assert_eq!(form.recipient.as_deref(), Some("not a principal"));

    assert!(ledger.calls().is_empty());
    assert!(!controller.snapshot().is_busy());
}

/// Test: a submission in flight turns the next one away without touching its form
#[tokio::test]
async fn overlapping_submission_is_busy() {
    let (controller, ledger) = setup().await;
    ledger.hold_mine.store(true, Ordering::SeqCst);

    let mut mine_form = OperationForm::new("10");
    let mut sell_form = OperationForm::new("3");
    sell_form.result_message = "previous".into();

    let (mined, sold) = tokio::join!(controller.mine(&mut mine_form), async {
        ledger.entered.notified().await;
        assert!(controller.snapshot().is_busy());
        assert!(controller.snapshot().is_loading());
        let sold = controller.sell(&mut sell_form).await;
        ledger.release.notify_one();
        sold
    });

    assert_eq!(sold, Submission::Busy);
    assert_eq!(sell_form.amount, "3");
    assert_eq!(sell_form.result_message, "previous");
    assert_eq!(mined, Submission::Completed(Outcome::Plain("Minted 10 UTK".into())));
    assert!(!ledger.calls().contains(&"sell_tokens"));

    let snap = controller.snapshot();
    assert!(!snap.is_busy());
    assert_eq!(snap.balance(), 10);

    // Flag released: the next submission goes through.
    ledger.hold_mine.store(false, Ordering::SeqCst);
    let mut form = OperationForm::new("3");
    assert!(matches!(controller.sell(&mut form).await, Submission::Completed(Outcome::Success(_))));
}

/// Test: the principal reads "Loading..." while whoami is in flight
#[tokio::test]
async fn whoami_shows_loading_while_pending() {
    let (controller, ledger) = setup().await;
    ledger.hold_whoami.store(true, Ordering::SeqCst);

    let ((), pending) = tokio::join!(controller.whoami(), async {
        ledger.entered.notified().await;
        let pending = controller.snapshot().principal().to_string();
        ledger.release.notify_one();
        pending
    });

    assert_eq!(pending, PRINCIPAL_LOADING);
    assert_eq!(controller.snapshot().principal(), me().to_text());
    assert_eq!(ledger.calls(), vec!["whoami"]);
}

/// Test: transport failure keeps inputs, sets the op message, still resyncs
#[tokio::test]
async fn transport_failure_keeps_inputs_and_resyncs() {
    let (controller, ledger) = setup().await;
    ledger.fail_mutations.store(true, Ordering::SeqCst);

    let mut form = OperationForm::new("5");
    let submission = controller.mine(&mut form).await;
    assert!(matches!(submission, Submission::TransportFailed(TransportError::Unreachable(_))));
    assert_eq!(form.result_message, "Error mining tokens");
    assert_eq!(form.amount, "5");
    assert!(!controller.snapshot().is_busy());

    let calls = ledger.calls();
    assert_eq!(calls[0], "mine_tokens");
    assert!(calls.contains(&"get_my_balance"));
    assert!(calls.contains(&"get_total_supply"));
    assert!(calls.contains(&"get_my_transactions"));

    let recipient = Principal::self_authenticating(b"someone");
    let mut form = OperationForm::transfer(recipient.to_text(), "5");
    controller.send(&mut form).await;
    assert_eq!(form.result_message, "Error sending tokens");

    let mut form = OperationForm::new("5");
    controller.sell(&mut form).await;
    assert_eq!(form.result_message, "Error selling tokens");
}

/// Test: a transfer resync skips the supply read
#[tokio::test]
async fn send_resync_skips_supply() {
    let (controller, ledger) = setup().await;
    controller.mine(&mut OperationForm::new("10")).await;
    ledger.clear_calls();

    let recipient = Principal::self_authenticating(b"someone");
    controller.send(&mut OperationForm::transfer(recipient.to_text(), "4")).await;
    let calls = ledger.calls();
    assert!(calls.contains(&"get_my_balance"));
    assert!(calls.contains(&"get_my_transactions"));
    assert!(!calls.contains(&"get_total_supply"));
}

/// Test: sending to yourself is the ledger's call, shown as an error message
#[tokio::test]
async fn self_transfer_is_declined() {
    let (controller, _) = setup().await;
    controller.mine(&mut OperationForm::new("10")).await;
    let mut form = OperationForm::transfer(me().to_text(), "4");
    let submission = controller.send(&mut form).await;
    assert_eq!(submission, Submission::Completed(Outcome::Failure("Cannot send to yourself".into())));
    assert_eq!(form.result_message, "Error: Cannot send to yourself");
    assert_eq!(controller.snapshot().balance(), 10);
}

/// Test: a failed read resets the field to its default
#[tokio::test]
async fn read_failure_resets_fields() {
    let (controller, ledger) = setup().await;
    controller.mine(&mut OperationForm::new("25")).await;
    assert_eq!(controller.snapshot().balance(), 25);

    ledger.fail_reads.store(true, Ordering::SeqCst);
    controller.refresh().await;
    let snap = controller.snapshot();
    assert_eq!(snap.balance(), 0);
    assert_eq!(snap.total_supply(), 0);
    assert!(snap.transactions().is_empty());
    assert!(!snap.is_loading());
}

/// Test: replies through a superseded channel do not reach state
#[tokio::test]
async fn stale_channel_reply_is_dropped() {
    let (controller, _) = setup().await;
    controller.mine(&mut OperationForm::new("25")).await;
    let old = controller.session().actor().expect("actor");

    controller.logout().await.expect("logout");
    assert_eq!(controller.snapshot().balance(), 0);

    controller.session().sync().refresh_all(Some(old.as_ref())).await;
    assert_eq!(controller.snapshot().balance(), 0);
    assert!(controller.snapshot().transactions().is_empty());
}
