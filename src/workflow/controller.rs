//! Submission state machine.
//!
//! ```text
//! Idle ──connect──▶ Connecting ──▶ Connected ──submit──▶ AwaitingSignature
//!   │                   │                                     │
//!   └─▶ WalletNotFound  └─▶ Rejected            Rejected ◀────┤
//!                                    DuplicateSubmission ◀────┤
//!                                                             ▼
//!                         Confirmed ◀── wait ── Pending(hash) ──▶ Rejected
//! ```
//!
//! A failed attempt stays in its error state until the caller acts again.
//! Dropping a `submit` future mid-attempt ends that attempt as `Rejected`.
//! Uniqueness is left entirely to the ledger; nothing here remembers which
//! content identifiers were submitted.

use alloy::primitives::Address;
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::evaluation::EvaluationResult;
use crate::ledger::{LedgerClient, SubmissionError, WalletError, WalletSession};
use crate::observability::metrics;
use crate::workflow::status::{SubmissionStatus, NOT_CONNECTED_WARNING};

/// Rejection reason recorded when a submit future is dropped mid-attempt.
pub const ABANDONED_REASON: &str = "submission abandoned before completion";

/// What a call to [`SubmissionController::submit`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// No account held; the ledger was not called.
    NotConnected,
    /// An attempt is already outstanding; the ledger was not called.
    InFlight,
    /// The attempt ran to this terminal status.
    Finished(SubmissionStatus),
}

/// Drives wallet connection and a single write-once submission.
pub struct SubmissionController {
    wallet: WalletSession,
    ledger: LedgerClient,
    status_tx: watch::Sender<SubmissionStatus>,
    notice: Option<String>,
}

impl SubmissionController {
    pub fn new(wallet: WalletSession, ledger: LedgerClient) -> Self {
        let (status_tx, _) = watch::channel(SubmissionStatus::Idle);
        Self {
            wallet,
            ledger,
            status_tx,
            notice: None,
        }
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status_tx.borrow().clone()
    }

    /// Observe status changes, including those made while `submit` is suspended.
    pub fn subscribe(&self) -> watch::Receiver<SubmissionStatus> {
        self.status_tx.subscribe()
    }

    /// Address of the connected account, if any.
    pub fn account(&self) -> Option<Address> {
        self.wallet.identity().map(|identity| identity.address())
    }

    /// A warning or rejection raised without a state change.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Whether the submit action should be enabled.
    pub fn can_submit(&self) -> bool {
        let status = self.status();
        self.account().is_some()
            && !status.is_in_flight()
            && status != SubmissionStatus::Connecting
    }

    /// The line a user interface shows.
    pub fn status_line(&self) -> String {
        match &self.notice {
            Some(notice) => notice.clone(),
            None => self.status().to_string(),
        }
    }

    fn transition(&mut self, next: SubmissionStatus) {
        self.notice = None;
        publish(&self.status_tx, next);
    }

    /// Connect the wallet.
    pub async fn connect(&mut self) -> SubmissionStatus {
        if !self.wallet.is_available() {
            tracing::warn!("No wallet provider present");
            self.transition(SubmissionStatus::WalletNotFound);
            return self.status();
        }

        self.transition(SubmissionStatus::Connecting);

        match self.wallet.connect().await {
            Ok(identity) => self.transition(SubmissionStatus::Connected(identity.address())),
            Err(WalletError::UserRejected(reason)) => {
                let fallback = match self.account() {
                    Some(address) => SubmissionStatus::Connected(address),
                    None => SubmissionStatus::Idle,
                };
                self.transition(fallback);
                self.notice = Some(format!("Wallet connection rejected: {}", reason));
            }
            Err(WalletError::Unavailable) => self.transition(SubmissionStatus::WalletNotFound),
            Err(e) => self.transition(SubmissionStatus::Rejected(e.to_string())),
        }

        self.status()
    }

    /// Submit `result` to the ledger and wait for the outcome.
    pub async fn submit(&mut self, result: &EvaluationResult) -> SubmitOutcome {
        let Some(identity) = self.wallet.identity().cloned() else {
            tracing::warn!(cid = %result.content_id(), "Submit attempted without a connected wallet");
            self.notice = Some(NOT_CONNECTED_WARNING.to_string());
            return SubmitOutcome::NotConnected;
        };

        if self.status().is_in_flight() {
            tracing::warn!(cid = %result.content_id(), "Submission already in flight");
            return SubmitOutcome::InFlight;
        }

        let attempt_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "submission",
            attempt_id = %attempt_id,
            cid = %result.content_id(),
            sender = %identity.address()
        );

        self.notice = None;
        let status_tx = &self.status_tx;
        let ledger = &self.ledger;

        async move {
            let mut guard = AttemptGuard::new(status_tx);
            publish(status_tx, SubmissionStatus::AwaitingSignature);

            let sent = ledger
                .store_result(
                    &identity,
                    result.content_id().as_str(),
                    result.score(),
                    result.decision().as_str(),
                )
                .await;

            let final_status = match sent {
                Err(e) => Self::status_for(e),
                Ok(pending) => {
                    let hash = pending.hash();
                    publish(status_tx, SubmissionStatus::Pending(hash));
                    tracing::info!(tx_hash = %hash, "Waiting for confirmation");
                    match pending.wait().await {
                        Ok(hash) => SubmissionStatus::Confirmed(hash),
                        Err(e) => Self::status_for(e),
                    }
                }
            };

            metrics::record_submission(final_status.label());
            tracing::info!(outcome = final_status.label(), "Submission finished");
            guard.finish(final_status.clone());
            SubmitOutcome::Finished(final_status)
        }
        .instrument(span)
        .await
    }

    fn status_for(error: SubmissionError) -> SubmissionStatus {
        match error {
            SubmissionError::Duplicate => SubmissionStatus::DuplicateSubmission,
            SubmissionError::Rejected(reason) => SubmissionStatus::Rejected(reason),
        }
    }
}

fn publish(status_tx: &watch::Sender<SubmissionStatus>, next: SubmissionStatus) {
    tracing::debug!(from = status_tx.borrow().label(), to = next.label(), "Status transition");
    status_tx.send_replace(next);
}

/// Moves an attempt whose future is dropped before finishing (a caller-side
/// timeout, say) to `Rejected`, so the controller does not stay in flight.
struct AttemptGuard<'a> {
    status_tx: &'a watch::Sender<SubmissionStatus>,
    finished: bool,
}

impl<'a> AttemptGuard<'a> {
    fn new(status_tx: &'a watch::Sender<SubmissionStatus>) -> Self {
        Self {
            status_tx,
            finished: false,
        }
    }

    fn finish(&mut self, status: SubmissionStatus) {
        self.finished = true;
        publish(self.status_tx, status);
    }
}

impl Drop for AttemptGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        tracing::warn!("Submission abandoned before completion");
        metrics::record_submission("abandoned");
        publish(
            self.status_tx,
            SubmissionStatus::Rejected(ABANDONED_REASON.to_string()),
        );
    }
}

impl std::fmt::Debug for SubmissionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionController")
            .field("status", &self.status())
            .field("account", &self.account())
            .field("notice", &self.notice)
            .finish()
    }
}
