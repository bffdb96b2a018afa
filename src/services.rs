//! Collaborator interfaces at the engine boundary
//!
//! The engine owns no wire format. Signers, the schedule-info service, and
//! the mirror node are consumed through these traits; hosts plug in bridge
//! implementations and tests plug in mocks.
use crate::transaction::Network;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Result of one execute/sign/delete attempt, as reported by a signer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionOutcome {
    pub success: bool,
    pub transaction_id: Option<String>,
    pub error: Option<String>,
    /// Ledger status code when the signer surfaced one, e.g. `SCHEDULE_EXPIRED`.
    pub status: Option<String>,
}

impl ExecutionOutcome {
    pub fn ok(transaction_id: impl Into<String>) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id.into()),
            ..Self::default()
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// The text used for failure classification: the structured status code
    /// when present, otherwise the free-text error.
    pub fn failure_text(&self) -> String {
        match (&self.status, &self.error) {
            (Some(status), Some(error)) => format!("{status}: {error}"),
            (Some(status), None) => status.clone(),
            (None, Some(error)) => error.clone(),
            (None, None) => "unknown failure".to_string(),
        }
    }
}

/// Current status and decoded body of a scheduled transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleInfo {
    /// Decoded body of the inner transaction, in the snapshot wire shape.
    pub transaction_body: Value,
    pub memo: Option<String>,
    pub expiration_time: Option<String>,
    /// Creation time as reported by the service; drives the age/expiry policy.
    pub consensus_timestamp: Option<String>,
    pub executed_timestamp: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleStatus {
    pub executed: bool,
    pub executed_date: Option<String>,
}

/// A finalized transaction as republished by the mirror node after consensus.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorRecord {
    /// Transaction-type tag, e.g. `TOKENCREATION`.
    pub name: Option<String>,
    pub entity_id: Option<String>,
    /// Consensus result, `SUCCESS` or a failure status.
    pub result: Option<String>,
    pub transaction_id: Option<String>,
    pub consensus_timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

/// Fire-and-forget human-readable outcome surfaced to the user.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub duration: Option<Duration>,
}

impl Notification {
    fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            duration: None,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title, message)
    }

    pub fn warning(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, title, message)
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}

/// Best-effort naming hints for an entity a transaction is about to create.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntityContext {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// A wallet-style signer: the user's wallet signs and submits, so the signer
/// is pinned to whatever network and account the wallet is connected to.
#[async_trait]
pub trait WalletSigner: Send + Sync {
    fn account_id(&self) -> Option<String>;
    fn network(&self) -> Network;
    async fn execute_from_bytes(&self, bytes: &[u8]) -> anyhow::Result<ExecutionOutcome>;
    async fn execute_schedule_sign(&self, schedule_id: &str) -> anyhow::Result<ExecutionOutcome>;
    async fn execute_schedule_delete(&self, schedule_id: &str)
    -> anyhow::Result<ExecutionOutcome>;
}

/// A locally-held-key signer. Its success already implies server-side
/// confirmation, so no mirror confirmation pass is needed.
#[async_trait]
pub trait LocalSigner: Send + Sync {
    fn account_id(&self) -> Option<String>;
    async fn execute_transaction_bytes(
        &self,
        bytes: &[u8],
        context: Option<&EntityContext>,
    ) -> anyhow::Result<ExecutionOutcome>;
    async fn execute_scheduled_transaction(
        &self,
        schedule_id: &str,
    ) -> anyhow::Result<ExecutionOutcome>;
    async fn delete_scheduled_transaction(
        &self,
        schedule_id: &str,
    ) -> anyhow::Result<ExecutionOutcome>;
}

/// Read-side lookups for a scheduled transaction. `Ok(None)` from
/// `get_schedule_info` means the schedule is unknown or pruned, which the
/// engine treats as terminal; an `Err` is a transient transport failure.
#[async_trait]
pub trait ScheduleInfoService: Send + Sync {
    async fn get_schedule_info(
        &self,
        schedule_id: &str,
        network: Network,
    ) -> anyhow::Result<Option<ScheduleInfo>>;
    async fn get_scheduled_transaction_status(
        &self,
        schedule_id: &str,
        network: Network,
    ) -> anyhow::Result<ScheduleStatus>;
}

/// Finalized-transaction lookup. Takes the mirror-normalized id form.
#[async_trait]
pub trait MirrorService: Send + Sync {
    async fn get_transaction(
        &self,
        transaction_id: &str,
        network: Network,
    ) -> anyhow::Result<Option<MirrorRecord>>;
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Decodes raw transaction bytes into a snapshot and extracts the embedded
/// payer when determinable.
pub trait TransactionDecoder: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> anyhow::Result<crate::transaction::ParsedTransaction>;
    fn payer_account(&self, bytes: &[u8]) -> Option<String>;
}
