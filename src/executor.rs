//! OperationExecutor - validate, submit, interpret, resync.
//!
//! One busy flag covers mine, send and sell: while any submission is in
//! flight the others are turned away. The flag is released when the
//! submission future finishes or is dropped, never by a timeout.

use crate::actor::ActorProxy;
use crate::error::TransportError;
use crate::outcome::Outcome;
use crate::principal::Principal;
use crate::state::{OperationForm, StateHandle};
use crate::sync::{SyncController, SyncFields};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const MSG_INVALID_AMOUNT: &str = "Enter a valid amount.";
pub const MSG_INVALID_TRANSFER: &str = "Enter a valid principal and amount.";
pub const MSG_INVALID_PRINCIPAL: &str = "Invalid principal format. Please check and try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation { Mine, Send, Sell }

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self { Operation::Mine => "mine", Operation::Send => "send", Operation::Sell => "sell" }
    }

    fn transport_failure_message(&self) -> &'static str {
        match self {
            Operation::Mine => "Error mining tokens",
            Operation::Send => "Error sending tokens",
            Operation::Sell => "Error selling tokens",
        }
    }

    /// Transfers leave the supply alone.
    fn resync_fields(&self) -> SyncFields {
        match self {
            Operation::Mine | Operation::Sell => SyncFields::ALL,
            Operation::Send => SyncFields::BALANCE_AND_HISTORY,
        }
    }
}

/// What happened to one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// No call channel yet.
    Skipped,
    /// Another submission is in flight; the form was not touched.
    Busy,
    /// Rejected locally, no call issued.
    Invalid(&'static str),
    /// The ledger answered, possibly with a business failure.
    Completed(Outcome),
    TransportFailed(TransportError),
}

#[derive(Debug)]
enum Request {
    Mine(u64),
    Send(Principal, u64),
    Sell(u64),
}

#[derive(Debug, Clone)]
pub struct OperationExecutor {
    state: StateHandle,
    sync: SyncController,
    busy: Arc<AtomicBool>,
}

struct BusyGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a StateHandle,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
        self.state.update(|s| s.set_busy(false));
    }
}

impl OperationExecutor {
    pub fn new(state: StateHandle) -> Self {
        let sync = SyncController::new(state.clone());
        Self { state, sync, busy: Arc::new(AtomicBool::new(false)) }
    }

    pub fn is_busy(&self) -> bool { self.busy.load(Ordering::SeqCst) }

    pub async fn mine(&self, actor: Option<&ActorProxy>, form: &mut OperationForm) -> Submission {
        self.submit(Operation::Mine, actor, form).await
    }

    pub async fn send(&self, actor: Option<&ActorProxy>, form: &mut OperationForm) -> Submission {
        self.submit(Operation::Send, actor, form).await
    }

    pub async fn sell(&self, actor: Option<&ActorProxy>, form: &mut OperationForm) -> Submission {
        self.submit(Operation::Sell, actor, form).await
    }

    pub async fn submit(&self, op: Operation, actor: Option<&ActorProxy>, form: &mut OperationForm) -> Submission {
        let Some(actor) = actor else { return Submission::Skipped };
        let Some(_guard) = self.try_acquire() else {
            tracing::debug!(op = op.as_str(), "submission rejected, another operation in flight");
            return Submission::Busy;
        };

        form.result_message.clear();
        let request = match validate(op, form) {
            Ok(request) => request,
            Err(message) => {
                form.result_message = message.to_string();
                return Submission::Invalid(message);
            }
        };

        tracing::info!(op = op.as_str(), ?request, "submitting");
        let reply = match &request {
            Request::Mine(amount) => actor.mine_tokens(*amount).await,
            Request::Send(to, amount) => actor.send_tokens(to, *amount).await,
            Request::Sell(amount) => actor.sell_tokens(*amount).await,
        };

        let submission = match reply {
            Ok(raw) => {
                let outcome = Outcome::decode(&raw);
                if outcome.is_failure() {
                    tracing::info!(op = op.as_str(), outcome = %outcome, "ledger declined");
                }
                form.result_message = outcome.message();
                Submission::Completed(outcome)
            }
            Err(e) => {
                tracing::warn!(op = op.as_str(), error = %e, "submission failed");
                form.result_message = op.transport_failure_message().to_string();
                Submission::TransportFailed(e)
            }
        };

        // The ledger may have recorded part of a failed call; always re-read.
        self.sync.refresh(Some(actor), op.resync_fields()).await;

        if matches!(submission, Submission::Completed(_)) {
            form.clear_inputs();
        }
        submission
    }

    fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        self.busy.compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst).ok()?;
        self.state.update(|s| s.set_busy(true));
        Some(BusyGuard { flag: &self.busy, state: &self.state })
    }
}

/// Positive whole number, surrounding whitespace ignored.
pub fn parse_amount(text: &str) -> Option<u64> {
    text.trim().parse::<u64>().ok().filter(|n| *n > 0)
}

fn validate(op: Operation, form: &OperationForm) -> Result<Request, &'static str> {
    match op {
        Operation::Mine => parse_amount(&form.amount).map(Request::Mine).ok_or(MSG_INVALID_AMOUNT),
        Operation::Sell => parse_amount(&form.amount).map(Request::Sell).ok_or(MSG_INVALID_AMOUNT),
        Operation::Send => {
            // Whitespace counts as an entered recipient; it then fails to parse.
            let recipient = form.recipient.as_deref().unwrap_or_default();
            let amount = parse_amount(&form.amount);
            let (false, Some(amount)) = (recipient.is_empty(), amount) else {
                return Err(MSG_INVALID_TRANSFER);
            };
            let to = Principal::from_text(recipient.trim()).map_err(|_| MSG_INVALID_PRINCIPAL)?;
            Ok(Request::Send(to, amount))
        }
    }
}
