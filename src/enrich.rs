//! Enrichment registry: per transaction-type mapping of mirror records back
//! into domain fields and success messages
//!
//! Lookup is case-insensitive and total: unknown tags resolve to a default
//! handler, so callers never need a missing-handler path.
use crate::services::MirrorRecord;
use crate::transaction::{ParsedTransaction, Section};
use serde_json::Value;

/// The kinds of ledger entities a "create"-style transaction can produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreatedKind {
    Token,
    Topic,
    Account,
    Contract,
    Schedule,
    File,
}

impl CreatedKind {
    pub fn section(self) -> Section {
        match self {
            Self::Token => Section::TokenCreation,
            Self::Topic => Section::ConsensusCreateTopic,
            Self::Account => Section::CryptoCreateAccount,
            Self::Contract => Section::ContractCreate,
            Self::Schedule => Section::ScheduleCreate,
            Self::File => Section::FileCreate,
        }
    }

    /// Key the entity id is published under in `details`.
    pub fn details_key(self) -> &'static str {
        match self {
            Self::Token => "createdTokenId",
            Self::Topic => "createdTopicId",
            Self::Account => "createdAccountId",
            Self::Contract => "createdContractId",
            Self::Schedule => "createdScheduleId",
            Self::File => "createdFileId",
        }
    }

    /// Id field inside the matching type-specific section.
    pub fn id_field(self) -> &'static str {
        match self {
            Self::Token => "tokenId",
            Self::Topic => "topicId",
            Self::Account => "accountId",
            Self::Contract => "contractId",
            Self::Schedule => "scheduleId",
            Self::File => "fileId",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Token => "Token",
            Self::Topic => "Topic",
            Self::Account => "Account",
            Self::Contract => "Contract",
            Self::Schedule => "Schedule",
            Self::File => "File",
        }
    }
}

/// Handler record resolved from a transaction-type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Handler {
    /// Create-style types: copy the ledger-assigned entity id into the
    /// snapshot's details and matching section.
    Create(CreatedKind),
    /// Consensus message submission: copy the topic id and backfill message
    /// defaults when absent.
    SubmitMessage,
    /// Mint/burn/call/sign/delete style operations that create nothing.
    Operational,
    /// Universal fallback for unrecognized tags.
    Default,
}

/// Resolve the handler for a transaction-type tag. Never misses.
pub fn handler_for(transaction_type: &str) -> Handler {
    match transaction_type.trim().to_ascii_uppercase().as_str() {
        "TOKENCREATION" | "TOKENCREATE" => Handler::Create(CreatedKind::Token),
        "CONSENSUSCREATETOPIC" => Handler::Create(CreatedKind::Topic),
        "CRYPTOCREATEACCOUNT" => Handler::Create(CreatedKind::Account),
        "CONTRACTCREATEINSTANCE" | "CONTRACTCREATE" => Handler::Create(CreatedKind::Contract),
        "SCHEDULECREATE" => Handler::Create(CreatedKind::Schedule),
        "FILECREATE" => Handler::Create(CreatedKind::File),
        "CONSENSUSSUBMITMESSAGE" => Handler::SubmitMessage,
        "CRYPTOTRANSFER" | "TOKENMINT" | "TOKENBURN" | "CONTRACTCALL" | "SCHEDULESIGN"
        | "SCHEDULEDELETE" | "FILEAPPEND" | "FILEUPDATE" | "FILEDELETE"
        | "CONSENSUSUPDATETOPIC" | "CONSENSUSDELETETOPIC" => Handler::Operational,
        _ => Handler::Default,
    }
}

impl Handler {
    /// Fold the mirror record's facts into `target`. Fields the original
    /// snapshot already carries win, except the entity id field, where the
    /// newly observed ledger value always wins. Tolerates records without an
    /// entity id (no-op) and never panics.
    pub fn enrich(
        &self,
        target: &mut ParsedTransaction,
        record: &MirrorRecord,
        original: Option<&ParsedTransaction>,
    ) {
        let entity_id = match record.entity_id.as_deref() {
            Some(entity_id) if !entity_id.is_empty() => entity_id,
            _ => return,
        };

        match self {
            Handler::Create(kind) => {
                let slot = kind.section().slot_mut(target);
                let mut fields = slot.take().unwrap_or_default();
                if let Some(original_fields) = original.and_then(|o| kind.section().get(o)) {
                    for (key, value) in original_fields {
                        fields.insert(key.clone(), value.clone());
                    }
                }
                fields.insert(
                    kind.id_field().to_string(),
                    Value::String(entity_id.to_string()),
                );
                *slot = Some(fields);
                target.details.insert(
                    kind.details_key().to_string(),
                    Value::String(entity_id.to_string()),
                );
            }
            Handler::SubmitMessage => {
                let fields = Section::ConsensusSubmitMessage
                    .slot_mut(target)
                    .get_or_insert_with(Default::default);
                fields.insert(
                    "topicId".to_string(),
                    Value::String(entity_id.to_string()),
                );
                fields
                    .entry("message".to_string())
                    .or_insert_with(|| Value::String("Message submitted successfully".to_string()));
                fields
                    .entry("messageEncoding".to_string())
                    .or_insert_with(|| Value::String("utf8".to_string()));
            }
            Handler::Operational => {}
            Handler::Default => {
                target
                    .details
                    .insert("entityId".to_string(), Value::String(entity_id.to_string()));
            }
        }
    }

    /// Human-readable confirmation line. Always non-empty, even for an absent
    /// snapshot; unknown shapes fall back to a generic completion message.
    pub fn success_message(
        &self,
        snapshot: Option<&ParsedTransaction>,
        transaction_id: &str,
    ) -> String {
        match self {
            Handler::Create(kind) => {
                if let Some(id) = snapshot.and_then(|snapshot| created_id(snapshot, *kind)) {
                    let label = kind.label();
                    match kind {
                        CreatedKind::Contract => {
                            format!("Contract deployed successfully! Contract ID: {id}")
                        }
                        CreatedKind::Schedule => {
                            format!("Transaction scheduled successfully! Schedule ID: {id}")
                        }
                        _ => format!("{label} created successfully! {label} ID: {id}"),
                    }
                } else {
                    generic_message(snapshot, transaction_id)
                }
            }
            Handler::SubmitMessage => {
                let topic_id = snapshot
                    .and_then(|snapshot| Section::ConsensusSubmitMessage.get(snapshot))
                    .and_then(|fields| fields.get("topicId"))
                    .and_then(Value::as_str);
                match topic_id {
                    Some(topic_id) => format!(
                        "Message submitted to topic {topic_id} successfully! Transaction ID: {transaction_id}"
                    ),
                    None => generic_message(snapshot, transaction_id),
                }
            }
            Handler::Operational | Handler::Default => transfer_message(snapshot, transaction_id),
        }
    }
}

/// Build the enhanced snapshot for a finalized mirror record: a fresh
/// snapshot tagged from the record (falling back to the original's tag),
/// enriched through the type's handler.
pub fn snapshot_from_record(
    record: &MirrorRecord,
    original: Option<&ParsedTransaction>,
) -> ParsedTransaction {
    let tag = record
        .name
        .clone()
        .filter(|name| !name.trim().is_empty())
        .or_else(|| original.map(|original| original.transaction_type.clone()))
        .unwrap_or_default();

    let mut enhanced = ParsedTransaction {
        transaction_type: tag.clone(),
        human_readable_type: display_type_name(&tag),
        ..ParsedTransaction::default()
    };
    handler_for(&tag).enrich(&mut enhanced, record, original);
    enhanced
}

/// The ledger entity a snapshot reports as created, if any: `(id, kind)`.
pub fn created_entity(snapshot: &ParsedTransaction) -> Option<(String, CreatedKind)> {
    match handler_for(&snapshot.transaction_type) {
        Handler::Create(kind) => created_id(snapshot, kind).map(|id| (id, kind)),
        _ => None,
    }
}

fn created_id(snapshot: &ParsedTransaction, kind: CreatedKind) -> Option<String> {
    if let Some(id) = kind
        .section()
        .get(snapshot)
        .and_then(|fields| fields.get(kind.id_field()))
        .and_then(Value::as_str)
    {
        return Some(id.to_string());
    }
    snapshot
        .details
        .get(kind.details_key())
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn transfer_message(snapshot: Option<&ParsedTransaction>, transaction_id: &str) -> String {
    if let Some(snapshot) = snapshot {
        if let Some(token_transfers) = &snapshot.token_transfers {
            if !token_transfers.is_empty() {
                return format!(
                    "Transferred {} token(s) successfully! Transaction ID: {transaction_id}",
                    token_transfers.len()
                );
            }
        }
        if let Some(transfers) = &snapshot.transfers {
            if !transfers.is_empty() {
                return format!("HBAR transferred successfully! Transaction ID: {transaction_id}");
            }
        }
    }
    generic_message(snapshot, transaction_id)
}

fn generic_message(snapshot: Option<&ParsedTransaction>, transaction_id: &str) -> String {
    let label = snapshot
        .map(|snapshot| {
            if !snapshot.human_readable_type.trim().is_empty() {
                snapshot.human_readable_type.clone()
            } else if !snapshot.transaction_type.trim().is_empty() {
                display_type_name(&snapshot.transaction_type)
            } else {
                "Transaction".to_string()
            }
        })
        .unwrap_or_else(|| "Transaction".to_string());
    format!("{label} completed. Transaction ID: {transaction_id}")
}

/// Friendly display name for a transaction-type tag.
pub fn display_type_name(transaction_type: &str) -> String {
    match transaction_type.trim().to_ascii_uppercase().as_str() {
        "TOKENCREATION" | "TOKENCREATE" => "Token Creation",
        "CRYPTOTRANSFER" => "Transfer",
        "CONSENSUSCREATETOPIC" => "Topic Creation",
        "CONSENSUSSUBMITMESSAGE" => "Topic Message",
        "CONSENSUSUPDATETOPIC" => "Topic Update",
        "CONSENSUSDELETETOPIC" => "Topic Deletion",
        "CRYPTOCREATEACCOUNT" => "Account Creation",
        "CONTRACTCREATEINSTANCE" | "CONTRACTCREATE" => "Contract Deployment",
        "CONTRACTCALL" => "Contract Call",
        "SCHEDULECREATE" => "Schedule Creation",
        "SCHEDULESIGN" => "Schedule Sign",
        "SCHEDULEDELETE" => "Schedule Deletion",
        "TOKENMINT" => "Token Mint",
        "TOKENBURN" => "Token Burn",
        "TOKENASSOCIATE" => "Token Association",
        "TOKENDISSOCIATE" => "Token Dissociation",
        "FILECREATE" => "File Creation",
        "FILEAPPEND" => "File Append",
        "FILEUPDATE" => "File Update",
        "FILEDELETE" => "File Deletion",
        "" => "Transaction",
        _ => return transaction_type.trim().to_string(),
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn submit_message_enrichment_backfills_defaults() {
        let mut snapshot = ParsedTransaction {
            transaction_type: "CONSENSUSSUBMITMESSAGE".to_string(),
            consensus_submit_message: Some(Default::default()),
            ..ParsedTransaction::default()
        };
        let record = MirrorRecord {
            entity_id: Some("0.0.567890".to_string()),
            ..MirrorRecord::default()
        };

        handler_for("CONSENSUSSUBMITMESSAGE").enrich(&mut snapshot, &record, None);

        let fields = snapshot.consensus_submit_message.unwrap();
        assert_eq!(fields.get("topicId"), Some(&json!("0.0.567890")));
        assert_eq!(
            fields.get("message"),
            Some(&json!("Message submitted successfully"))
        );
        assert_eq!(fields.get("messageEncoding"), Some(&json!("utf8")));
    }

    #[test]
    fn create_enrichment_preserves_original_fields_but_id_wins() {
        let mut target = ParsedTransaction::default();
        let original = ParsedTransaction {
            token_creation: Some(
                [
                    ("name".to_string(), json!("Demo")),
                    ("tokenId".to_string(), json!("0.0.1")),
                ]
                .into_iter()
                .collect(),
            ),
            ..ParsedTransaction::default()
        };
        let record = MirrorRecord {
            entity_id: Some("0.0.4242".to_string()),
            ..MirrorRecord::default()
        };

        handler_for("tokencreation").enrich(&mut target, &record, Some(&original));

        let fields = target.token_creation.unwrap();
        assert_eq!(fields.get("name"), Some(&json!("Demo")));
        assert_eq!(fields.get("tokenId"), Some(&json!("0.0.4242")));
        assert_eq!(
            target.details.get("createdTokenId"),
            Some(&json!("0.0.4242"))
        );
    }

    #[test]
    fn default_handler_copies_entity_id_only() {
        let mut snapshot = ParsedTransaction::default();
        let record = MirrorRecord {
            entity_id: Some("0.0.99".to_string()),
            ..MirrorRecord::default()
        };

        handler_for("SOMETHINGNEW").enrich(&mut snapshot, &record, None);
        assert_eq!(snapshot.details.get("entityId"), Some(&json!("0.0.99")));
        assert!(snapshot.token_creation.is_none());
    }

    #[test]
    fn success_messages_never_come_back_empty() {
        for tag in ["TOKENCREATION", "cryptotransfer", "", "UNKNOWN_TYPE"] {
            let message = handler_for(tag).success_message(None, "0.0.1@2.3");
            assert!(!message.is_empty(), "empty message for tag {tag:?}");
        }
    }

    #[test]
    fn transfer_messages_distinguish_token_and_hbar() {
        use crate::transaction::{TokenTransfer, Transfer};

        let token = ParsedTransaction {
            transaction_type: "CRYPTOTRANSFER".to_string(),
            token_transfers: Some(vec![TokenTransfer {
                token_id: "0.0.7".to_string(),
                account_id: "0.0.8".to_string(),
                amount: 5,
            }]),
            ..ParsedTransaction::default()
        };
        let message = handler_for("CRYPTOTRANSFER").success_message(Some(&token), "tx");
        assert!(message.contains("1 token(s)"), "{message}");

        let hbar = ParsedTransaction {
            transaction_type: "CRYPTOTRANSFER".to_string(),
            transfers: Some(vec![Transfer {
                account_id: "0.0.8".to_string(),
                amount: -100,
            }]),
            ..ParsedTransaction::default()
        };
        let message = handler_for("CRYPTOTRANSFER").success_message(Some(&hbar), "tx");
        assert!(message.starts_with("HBAR transferred"), "{message}");
    }
}
