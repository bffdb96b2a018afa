//! Approval session: the state machine owning one transaction intent's
//! lifecycle from awaiting approval through signing, confirmation, and
//! reconciliation.
use crate::config::Config;
use crate::confirm::{self, Confirmation};
use crate::enrich;
use crate::error::ApprovalError;
use crate::guards;
use crate::merge;
use crate::poller;
use crate::services::{
    EntityContext, ExecutionOutcome, LocalSigner, MirrorService, Notification, NotificationSink,
    ScheduleInfoService, TransactionDecoder, WalletSigner,
};
use crate::transaction::{IntentSource, ParsedTransaction, ScheduleOp, TransactionIntent};
use crate::utils;
use serde_json::Value;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalPhase {
    Signing,
    Submitting,
    Confirming,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ApprovalState {
    #[default]
    AwaitingApproval,
    Approving(ApprovalPhase),
    /// Signed but not yet confirmed executed; only the scheduled-sign path
    /// passes through here while the poller watches for execution.
    Approved,
    Executed,
    AlreadyExecuted,
    Expired,
    /// Not terminal: the user may approve again to retry.
    Failed,
}

impl ApprovalState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Executed | Self::AlreadyExecuted | Self::Expired)
    }

    pub fn allows_approval(self) -> bool {
        matches!(self, Self::AwaitingApproval | Self::Failed)
    }
}

/// Which signer executes on approval. Wallet signers are pinned to the
/// wallet's network and can only contribute the payer's signature; local
/// signers hold their own key and already imply server-side confirmation.
#[derive(Clone)]
pub enum Signer {
    Wallet(Arc<dyn WalletSigner>),
    Local(Arc<dyn LocalSigner>),
}

/// The external collaborators one session dispatches into.
#[derive(Clone)]
pub struct Services {
    pub signer: Signer,
    pub schedule: Arc<dyn ScheduleInfoService>,
    pub mirror: Arc<dyn MirrorService>,
    pub notifier: Arc<dyn NotificationSink>,
    pub decoder: Option<Arc<dyn TransactionDecoder>>,
}

/// Observable state of one approval session.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    pub lifecycle: ApprovalState,
    pub snapshot: Option<ParsedTransaction>,
    pub outcome: Option<ExecutionOutcome>,
    pub error: Option<String>,
    pub schedule_expired: bool,
}

pub(crate) struct SessionInner {
    pub(crate) intent: TransactionIntent,
    pub(crate) services: Services,
    pub(crate) config: Config,
    state: Mutex<SessionState>,
    disposed: AtomicBool,
    poller: Mutex<Option<JoinHandle<()>>>,
    enrichment_started: Mutex<HashSet<String>>,
}

impl SessionInner {
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    pub(crate) fn lifecycle(&self) -> ApprovalState {
        self.lock_state().lifecycle
    }

    pub(crate) fn update_snapshot(&self, snapshot: ParsedTransaction) {
        if self.is_disposed() {
            return;
        }
        self.lock_state().snapshot = Some(snapshot);
    }

    /// The schedule was consumed, deleted, or pruned outside this session.
    pub(crate) fn mark_schedule_settled(&self, executed_date: Option<&str>) {
        if self.is_disposed() {
            return;
        }
        {
            let mut state = self.lock_state();
            if state.lifecycle.is_terminal() {
                return;
            }
            state.lifecycle = ApprovalState::AlreadyExecuted;
            state.error = None;
        }
        let detail = executed_date
            .map(|date| format!(" at {date}"))
            .unwrap_or_default();
        self.services.notifier.notify(Notification::info(
            "Scheduled transaction settled",
            format!("The scheduled transaction has already been executed{detail}."),
        ));
    }

    pub(crate) fn mark_schedule_expired(&self) {
        if self.is_disposed() {
            return;
        }
        {
            let mut state = self.lock_state();
            state.schedule_expired = true;
            if state.lifecycle.is_terminal() {
                return;
            }
            state.lifecycle = ApprovalState::Expired;
            state.error = Some(ApprovalError::ScheduleExpired.to_string());
        }
        self.services.notifier.notify(Notification::warning(
            "Scheduled transaction expired",
            "This scheduled transaction is past its execution window and can no longer be executed.",
        ));
    }

    pub(crate) fn stop_poller(&self) {
        let handle = self
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(handle) = handle {
            handle.abort();
        }
    }

    /// Dispatch enrichment for a transaction id at most once, no matter how
    /// many paths report success for it.
    pub(crate) fn trigger_enrichment(self: &Arc<Self>, transaction_id: String) {
        {
            let mut started = self
                .enrichment_started
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if !started.insert(transaction_id.clone()) {
                return;
            }
        }
        let inner = Arc::clone(self);
        tokio::spawn(run_enrichment(inner, transaction_id));
    }

    pub(crate) fn decoded_payer(&self, bytes: &[u8]) -> Option<String> {
        self.services
            .decoder
            .as_ref()
            .and_then(|decoder| decoder.payer_account(bytes))
    }

    fn known_transaction_type(&self) -> Option<String> {
        self.lock_state()
            .snapshot
            .as_ref()
            .map(|snapshot| snapshot.transaction_type.clone())
    }

    pub(crate) fn entity_context(&self) -> Option<EntityContext> {
        self.intent.description.as_ref().map(|description| EntityContext {
            name: None,
            description: Some(description.clone()),
        })
    }
}

/// One in-flight transaction intent, from `AwaitingApproval` to settlement.
///
/// Sessions are independent of each other; all shared collaborators are
/// behind `Arc`s and the registry/merger are pure. Dropping or disposing a
/// session cancels its poller and silences any still-pending async results.
pub struct ApprovalSession {
    inner: Arc<SessionInner>,
}

impl ApprovalSession {
    pub fn new(intent: TransactionIntent, services: Services, config: Config) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                intent,
                services,
                config,
                state: Mutex::new(SessionState::default()),
                disposed: AtomicBool::new(false),
                poller: Mutex::new(None),
                enrichment_started: Mutex::new(HashSet::new()),
            }),
        }
    }

    pub fn intent(&self) -> &TransactionIntent {
        &self.inner.intent
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock_state().clone()
    }

    /// Load the initial snapshot: decode byte payloads eagerly, or begin
    /// polling a scheduled transaction. Must run inside a tokio runtime.
    pub fn start(&self) {
        match &self.inner.intent.source {
            IntentSource::Bytes(bytes) => {
                if let Some(decoder) = &self.inner.services.decoder {
                    match decoder.decode(bytes) {
                        Ok(snapshot) => self.inner.update_snapshot(snapshot),
                        Err(error) => {
                            // Advisory only; the signer may still accept them.
                            tracing::warn!("transaction bytes could not be decoded: {error:#}");
                        }
                    }
                }
            }
            IntentSource::Schedule(_) => self.spawn_poller(),
        }
    }

    fn spawn_poller(&self) {
        let mut slot = self
            .inner
            .poller
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.take() {
            previous.abort();
        }
        *slot = Some(tokio::spawn(poller::run(Arc::clone(&self.inner))));
    }

    /// Run the guard checks and dispatch to the signer. Guard failures block
    /// locally and leave the session in `AwaitingApproval`; execution
    /// failures land in `Failed` with retry re-enabled.
    pub async fn approve(&self) -> anyhow::Result<SessionState> {
        let inner = &self.inner;
        if inner.is_disposed() {
            anyhow::bail!("approval session has been disposed");
        }
        {
            let mut state = inner.lock_state();
            if !state.lifecycle.allows_approval() {
                return Ok(state.clone());
            }
            if state.schedule_expired {
                state.lifecycle = ApprovalState::Expired;
                state.error = Some(ApprovalError::ScheduleExpired.to_string());
                return Ok(state.clone());
            }
            state.error = None;
            state.lifecycle = ApprovalState::Approving(ApprovalPhase::Signing);
        }
        tracing::info!(network = %inner.intent.network, "approval requested");

        match (&inner.intent.source, &inner.services.signer) {
            (IntentSource::Schedule(schedule_id), Signer::Wallet(wallet)) => {
                if let Err(error) = guards::check_network(wallet.network(), inner.intent.network) {
                    return Ok(self.block_dispatch(error));
                }
                self.enter_phase(ApprovalPhase::Submitting);
                let (call, on_success) = match inner.intent.schedule_op {
                    ScheduleOp::Sign => (
                        wallet.execute_schedule_sign(schedule_id).await,
                        ApprovalState::Approved,
                    ),
                    ScheduleOp::Delete => (
                        wallet.execute_schedule_delete(schedule_id).await,
                        ApprovalState::Executed,
                    ),
                };
                self.settle(call, on_success);
            }
            (IntentSource::Schedule(schedule_id), Signer::Local(local)) => {
                self.enter_phase(ApprovalPhase::Submitting);
                let call = match inner.intent.schedule_op {
                    ScheduleOp::Sign => local.execute_scheduled_transaction(schedule_id).await,
                    ScheduleOp::Delete => local.delete_scheduled_transaction(schedule_id).await,
                };
                self.settle(call, ApprovalState::Executed);
            }
            (IntentSource::Bytes(bytes), Signer::Wallet(wallet)) => {
                if let Err(error) = guards::check_network(wallet.network(), inner.intent.network) {
                    return Ok(self.block_dispatch(error));
                }
                let payer = inner.decoded_payer(bytes);
                if let Err(error) =
                    guards::check_payer(payer.as_deref(), wallet.account_id().as_deref())
                {
                    return Ok(self.block_dispatch(error));
                }
                let transaction_type = inner.known_transaction_type();
                if let Err(error) = guards::check_wallet_capability(transaction_type.as_deref()) {
                    return Ok(self.block_dispatch(error));
                }
                self.enter_phase(ApprovalPhase::Submitting);
                let call = wallet.execute_from_bytes(bytes).await;
                self.settle_with_confirmation(call).await;
            }
            (IntentSource::Bytes(bytes), Signer::Local(local)) => {
                let payer = inner.decoded_payer(bytes);
                if let Err(error) =
                    guards::check_payer(payer.as_deref(), local.account_id().as_deref())
                {
                    return Ok(self.block_dispatch(error));
                }
                self.enter_phase(ApprovalPhase::Submitting);
                let context = inner.entity_context();
                let call = local.execute_transaction_bytes(bytes, context.as_ref()).await;
                self.settle(call, ApprovalState::Executed);
            }
        }

        Ok(self.state())
    }

    /// Dismiss without executing. The poller stops and no further state
    /// mutation or notification happens for this session.
    pub fn reject(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.stop_poller();
        self.inner.services.notifier.notify(Notification::info(
            "Transaction dismissed",
            "The transaction request was dismissed without executing.",
        ));
    }

    /// Tear the session down: cancels the poller and causes any in-flight
    /// signer, confirmation, or mirror result to be discarded on arrival.
    pub fn dispose(&self) {
        self.inner.disposed.store(true, Ordering::SeqCst);
        self.inner.stop_poller();
    }

    fn enter_phase(&self, phase: ApprovalPhase) {
        self.inner.lock_state().lifecycle = ApprovalState::Approving(phase);
    }

    fn block_dispatch(&self, error: ApprovalError) -> SessionState {
        tracing::info!(%error, "guard check blocked dispatch");
        let state = {
            let mut state = self.inner.lock_state();
            state.lifecycle = ApprovalState::AwaitingApproval;
            state.error = Some(error.to_string());
            state.clone()
        };
        self.inner.services.notifier.notify(Notification::error(
            "Cannot execute transaction",
            error.to_string(),
        ));
        state
    }

    fn settle(&self, call: anyhow::Result<ExecutionOutcome>, on_success: ApprovalState) {
        let outcome = match call {
            Ok(outcome) => outcome,
            Err(error) => ExecutionOutcome::failed(format!("{error:#}")),
        };
        if self.inner.is_disposed() {
            return;
        }
        if outcome.success {
            self.complete_success(outcome, on_success);
        } else {
            self.complete_failure(outcome);
        }
    }

    async fn settle_with_confirmation(&self, call: anyhow::Result<ExecutionOutcome>) {
        let outcome = match call {
            Ok(outcome) => outcome,
            Err(error) => ExecutionOutcome::failed(format!("{error:#}")),
        };
        if self.inner.is_disposed() {
            return;
        }
        if !outcome.success {
            return self.complete_failure(outcome);
        }

        let Some(transaction_id) = outcome.transaction_id.clone() else {
            return self.complete_failure(ExecutionOutcome {
                success: false,
                error: Some("signer reported success without a transaction id".to_string()),
                ..outcome
            });
        };

        self.enter_phase(ApprovalPhase::Confirming);
        self.inner.lock_state().outcome = Some(outcome.clone());

        let confirmation = confirm::wait_for_confirmation(
            self.inner.services.mirror.as_ref(),
            &transaction_id,
            self.inner.intent.network,
            &self.inner.config,
        )
        .await;
        if self.inner.is_disposed() {
            return;
        }

        match confirmation {
            Confirmation::Confirmed(_) => self.complete_success(outcome, ApprovalState::Executed),
            Confirmation::Rejected(status) => {
                let error = match ApprovalError::classify(&status) {
                    ApprovalError::GenericFailure(status) => {
                        ApprovalError::MirrorNotConfirmed(status)
                    }
                    other => other,
                };
                self.fail_confirmation(outcome, error);
            }
            Confirmation::TimedOut => self.fail_confirmation(
                outcome,
                ApprovalError::MirrorNotConfirmed("not confirmed".to_string()),
            ),
        }
    }

    fn complete_success(&self, outcome: ExecutionOutcome, on_success: ApprovalState) {
        let transaction_id = outcome.transaction_id.clone();
        {
            let mut state = self.inner.lock_state();
            state.outcome = Some(outcome);
            state.lifecycle = on_success;
            state.error = None;
        }
        tracing::info!(state = ?on_success, "signer call succeeded");

        match on_success {
            ApprovalState::Executed | ApprovalState::AlreadyExecuted => {
                self.inner.stop_poller();
                match transaction_id {
                    Some(transaction_id) => self.inner.trigger_enrichment(transaction_id),
                    None => self.inner.services.notifier.notify(Notification::success(
                        "Transaction executed",
                        "Transaction executed successfully.",
                    )),
                }
            }
            ApprovalState::Approved => {
                // The poller keeps watching for the schedule to execute.
                self.inner.services.notifier.notify(Notification::info(
                    "Schedule signed",
                    "Signature submitted. Waiting for the schedule to collect the remaining signatures.",
                ));
            }
            _ => {}
        }
    }

    fn complete_failure(&self, outcome: ExecutionOutcome) {
        let raw = outcome.failure_text();
        let error = ApprovalError::classify(&raw);
        tracing::info!(%error, "signer call failed");

        if error.is_settled_elsewhere() {
            let transaction_id = outcome
                .transaction_id
                .clone()
                .or_else(|| utils::extract_transaction_id(&raw));
            {
                let mut state = self.inner.lock_state();
                state.lifecycle = ApprovalState::AlreadyExecuted;
                state.error = Some(error.to_string());
                let mut outcome = outcome;
                outcome.transaction_id = transaction_id.clone();
                state.outcome = Some(outcome);
            }
            self.inner.stop_poller();
            match transaction_id {
                Some(transaction_id) => self.inner.trigger_enrichment(transaction_id),
                None => self.inner.services.notifier.notify(Notification::info(
                    "Transaction already executed",
                    error.to_string(),
                )),
            }
            return;
        }

        if error == ApprovalError::ScheduleExpired {
            {
                let mut state = self.inner.lock_state();
                state.lifecycle = ApprovalState::Expired;
                state.schedule_expired = true;
                state.error = Some(error.to_string());
                state.outcome = Some(outcome);
            }
            self.inner.stop_poller();
            self.inner.services.notifier.notify(Notification::warning(
                "Scheduled transaction expired",
                error.to_string(),
            ));
            return;
        }

        {
            let mut state = self.inner.lock_state();
            state.lifecycle = ApprovalState::Failed;
            state.error = Some(error.to_string());
            state.outcome = Some(outcome);
        }
        self.inner.services.notifier.notify(Notification::error(
            "Transaction failed",
            error.to_string(),
        ));
    }

    fn fail_confirmation(&self, outcome: ExecutionOutcome, error: ApprovalError) {
        {
            let mut state = self.inner.lock_state();
            state.lifecycle = ApprovalState::Failed;
            state.error = Some(error.to_string());
            state.outcome = Some(outcome);
        }
        self.inner.services.notifier.notify(Notification::error(
            "Transaction not confirmed",
            format!("{error}. Request new transaction bytes and try again."),
        ));
    }
}

impl Drop for ApprovalSession {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Best-effort reconciliation after a successful execution: wait out the
/// mirror's indexing delay, fetch the finalized record, enrich and merge it
/// with the original snapshot, then report the generated success message.
/// Failures here never fail the approval; the message falls back to the
/// original snapshot.
async fn run_enrichment(inner: Arc<SessionInner>, transaction_id: String) {
    tokio::time::sleep(inner.config.enrichment_initial_delay).await;
    let normalized = utils::normalize_transaction_id_for_mirror(&transaction_id).into_owned();
    let network = inner.intent.network;

    let mut record = None;
    for attempt in 1..=inner.config.enrichment_attempts {
        if inner.is_disposed() {
            return;
        }
        match inner.services.mirror.get_transaction(&normalized, network).await {
            Ok(Some(found)) => {
                tracing::debug!(%transaction_id, attempt, "mirror record located");
                record = Some(found);
                break;
            }
            Ok(None) => {
                tracing::debug!(%transaction_id, attempt, "transaction not yet indexed by mirror");
            }
            Err(error) => {
                tracing::debug!(%transaction_id, attempt, "mirror lookup failed: {error:#}");
            }
        }
        tokio::time::sleep(inner.config.enrichment_retry_interval).await;
    }

    let original = inner.lock_state().snapshot.clone();

    let (snapshot, message) = match record {
        Some(record) => {
            let enhanced = enrich::snapshot_from_record(&record, original.as_ref());
            let mut merged = merge::merge(&enhanced, original.as_ref());
            if let Some((entity_id, _)) = enrich::created_entity(&merged) {
                let context = inner.entity_context();
                let name = utils::derive_entity_name(context.as_ref(), &entity_id);
                merged
                    .details
                    .insert("entityName".to_string(), Value::String(name));
            }
            let message = enrich::handler_for(&merged.transaction_type)
                .success_message(Some(&merged), &transaction_id);
            (Some(merged), message)
        }
        None => {
            tracing::warn!(
                %transaction_id,
                "mirror record unavailable, reporting from the original snapshot"
            );
            let tag = original
                .as_ref()
                .map(|original| original.transaction_type.clone())
                .unwrap_or_default();
            let message =
                enrich::handler_for(&tag).success_message(original.as_ref(), &transaction_id);
            (None, message)
        }
    };

    if inner.is_disposed() {
        return;
    }
    if let Some(snapshot) = snapshot {
        inner.lock_state().snapshot = Some(snapshot);
    }
    inner
        .services
        .notifier
        .notify(Notification::success("Transaction executed", message));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_and_retry_states() {
        assert!(ApprovalState::Executed.is_terminal());
        assert!(ApprovalState::AlreadyExecuted.is_terminal());
        assert!(ApprovalState::Expired.is_terminal());
        assert!(!ApprovalState::Failed.is_terminal());
        assert!(!ApprovalState::Approved.is_terminal());

        assert!(ApprovalState::AwaitingApproval.allows_approval());
        assert!(ApprovalState::Failed.allows_approval());
        assert!(!ApprovalState::Approving(ApprovalPhase::Confirming).allows_approval());
        assert!(!ApprovalState::Expired.allows_approval());
    }
}
