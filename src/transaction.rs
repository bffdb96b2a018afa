//! Core transaction intent and parsed snapshot types
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Open string-keyed map used for `details` and the type-specific sections.
pub type Fields = BTreeMap<String, Value>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Mainnet,
    Testnet,
}

impl Network {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }

    /// Missing input defaults to testnet, matching the desktop client.
    pub fn try_from_str(value: Option<&str>) -> anyhow::Result<Self> {
        match value.map(|value| value.to_ascii_lowercase()).as_deref() {
            Some("mainnet") => Ok(Self::Mainnet),
            Some("testnet") | None => Ok(Self::Testnet),
            Some(other) => Err(anyhow::anyhow!("Unsupported ledger network: {other}")),
        }
    }
}

impl std::fmt::Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to do with a schedule-sourced intent on approval.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScheduleOp {
    #[default]
    Sign,
    Delete,
}

/// Where the transaction under approval comes from. The enum guarantees that
/// exactly one of schedule id / transaction bytes is present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IntentSource {
    Bytes(Vec<u8>),
    Schedule(String),
}

/// Identifies what is being approved. Immutable for the life of one session.
#[derive(Clone, Debug, PartialEq)]
pub struct TransactionIntent {
    pub source: IntentSource,
    pub schedule_op: ScheduleOp,
    pub message_id: Option<String>,
    pub network: Network,
    pub description: Option<String>,
}

impl TransactionIntent {
    pub fn from_bytes(bytes: Vec<u8>, network: Network) -> Self {
        Self {
            source: IntentSource::Bytes(bytes),
            schedule_op: ScheduleOp::default(),
            message_id: None,
            network,
            description: None,
        }
    }

    pub fn for_schedule(schedule_id: impl Into<String>, network: Network) -> Self {
        Self {
            source: IntentSource::Schedule(schedule_id.into()),
            schedule_op: ScheduleOp::default(),
            message_id: None,
            network,
            description: None,
        }
    }

    pub fn with_schedule_op(mut self, op: ScheduleOp) -> Self {
        self.schedule_op = op;
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = Some(message_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn schedule_id(&self) -> Option<&str> {
        match &self.source {
            IntentSource::Schedule(schedule_id) => Some(schedule_id),
            IntentSource::Bytes(_) => None,
        }
    }

    pub fn transaction_bytes(&self) -> Option<&[u8]> {
        match &self.source {
            IntentSource::Bytes(bytes) => Some(bytes),
            IntentSource::Schedule(_) => None,
        }
    }

    pub fn is_schedule(&self) -> bool {
        matches!(self.source, IntentSource::Schedule(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub account_id: String,
    pub amount: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenTransfer {
    pub token_id: String,
    pub account_id: String,
    pub amount: i64,
}

/// Decoded transaction content. Two snapshots of the same transaction can
/// exist at once: the original (decoded pre-execution) and the enhanced one
/// (decoded post-execution from the mirror record, which carries the
/// ledger-assigned identifiers the original could not know).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParsedTransaction {
    #[serde(rename = "type")]
    pub transaction_type: String,
    pub human_readable_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memo: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub details: Fields,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfers: Option<Vec<Transfer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_transfers: Option<Vec<TokenTransfer>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_creation: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_create_topic: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_submit_message: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_update_topic: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consensus_delete_topic: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub crypto_create_account: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_create: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract_call: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_create: Option<Fields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_create: Option<Fields>,
    /// Arbitrary caller-added top-level fields (e.g. `hbarTransfers`). These
    /// are never merged; the enhanced side wins wholesale.
    #[serde(flatten)]
    pub extra: Fields,
}

/// The fixed set of type-specific sub-records a snapshot may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Section {
    TokenCreation,
    ConsensusCreateTopic,
    ConsensusSubmitMessage,
    ConsensusUpdateTopic,
    ConsensusDeleteTopic,
    CryptoCreateAccount,
    ContractCreate,
    ContractCall,
    ScheduleCreate,
    FileCreate,
}

impl Section {
    pub const ALL: [Section; 10] = [
        Section::TokenCreation,
        Section::ConsensusCreateTopic,
        Section::ConsensusSubmitMessage,
        Section::ConsensusUpdateTopic,
        Section::ConsensusDeleteTopic,
        Section::CryptoCreateAccount,
        Section::ContractCreate,
        Section::ContractCall,
        Section::ScheduleCreate,
        Section::FileCreate,
    ];

    pub fn get(self, snapshot: &ParsedTransaction) -> Option<&Fields> {
        match self {
            Section::TokenCreation => snapshot.token_creation.as_ref(),
            Section::ConsensusCreateTopic => snapshot.consensus_create_topic.as_ref(),
            Section::ConsensusSubmitMessage => snapshot.consensus_submit_message.as_ref(),
            Section::ConsensusUpdateTopic => snapshot.consensus_update_topic.as_ref(),
            Section::ConsensusDeleteTopic => snapshot.consensus_delete_topic.as_ref(),
            Section::CryptoCreateAccount => snapshot.crypto_create_account.as_ref(),
            Section::ContractCreate => snapshot.contract_create.as_ref(),
            Section::ContractCall => snapshot.contract_call.as_ref(),
            Section::ScheduleCreate => snapshot.schedule_create.as_ref(),
            Section::FileCreate => snapshot.file_create.as_ref(),
        }
    }

    pub fn slot_mut(self, snapshot: &mut ParsedTransaction) -> &mut Option<Fields> {
        match self {
            Section::TokenCreation => &mut snapshot.token_creation,
            Section::ConsensusCreateTopic => &mut snapshot.consensus_create_topic,
            Section::ConsensusSubmitMessage => &mut snapshot.consensus_submit_message,
            Section::ConsensusUpdateTopic => &mut snapshot.consensus_update_topic,
            Section::ConsensusDeleteTopic => &mut snapshot.consensus_delete_topic,
            Section::CryptoCreateAccount => &mut snapshot.crypto_create_account,
            Section::ContractCreate => &mut snapshot.contract_create,
            Section::ContractCall => &mut snapshot.contract_call,
            Section::ScheduleCreate => &mut snapshot.schedule_create,
            Section::FileCreate => &mut snapshot.file_create,
        }
    }
}
