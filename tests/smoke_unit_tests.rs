//! Smoke tests over the pure pieces: the enrichment registry, failure
//! classification, merge policy, and id handling.
use serde_json::json;
use transaction_approval::enrich::{self, handler_for, CreatedKind, Handler};
use transaction_approval::error::ApprovalError;
use transaction_approval::merge;
use transaction_approval::services::MirrorRecord;
use transaction_approval::transaction::{Network, ParsedTransaction, TransactionIntent};
use transaction_approval::utils;

#[test]
fn token_creation_record_enriches_ids_and_message() {
    let original = ParsedTransaction {
        transaction_type: "TOKENCREATION".to_string(),
        human_readable_type: "Token Creation".to_string(),
        token_creation: Some(
            [
                ("name".to_string(), json!("Demo")),
                ("symbol".to_string(), json!("DMO")),
            ]
            .into_iter()
            .collect(),
        ),
        ..ParsedTransaction::default()
    };
    let record = MirrorRecord {
        name: Some("TOKENCREATION".to_string()),
        entity_id: Some("0.0.4242".to_string()),
        result: Some("SUCCESS".to_string()),
        ..MirrorRecord::default()
    };

    let enhanced = enrich::snapshot_from_record(&record, Some(&original));
    let merged = merge::merge(&enhanced, Some(&original));

    assert_eq!(merged.details.get("createdTokenId"), Some(&json!("0.0.4242")));
    let fields = merged.token_creation.as_ref().unwrap();
    assert_eq!(fields.get("tokenId"), Some(&json!("0.0.4242")));
    assert_eq!(fields.get("name"), Some(&json!("Demo")));

    let message = handler_for(&merged.transaction_type)
        .success_message(Some(&merged), "0.0.5005@1700000000.000000001");
    assert_eq!(message, "Token created successfully! Token ID: 0.0.4242");
}

#[test]
fn registry_lookup_is_case_insensitive_and_total() {
    assert_eq!(
        handler_for("tokencreation"),
        Handler::Create(CreatedKind::Token)
    );
    assert_eq!(
        handler_for("  ContractCreateInstance  "),
        Handler::Create(CreatedKind::Contract)
    );
    assert_eq!(handler_for("CONSENSUSSUBMITMESSAGE"), Handler::SubmitMessage);
    assert_eq!(handler_for("TOKENMINT"), Handler::Operational);
    assert_eq!(handler_for("SCHEDULESIGN"), Handler::Operational);
    assert_eq!(handler_for("NEVER_HEARD_OF_IT"), Handler::Default);
    assert_eq!(handler_for(""), Handler::Default);
}

#[test]
fn submit_message_success_message_names_topic_and_transaction() {
    let snapshot = ParsedTransaction {
        transaction_type: "CONSENSUSSUBMITMESSAGE".to_string(),
        consensus_submit_message: Some(
            [("topicId".to_string(), json!("0.0.777"))].into_iter().collect(),
        ),
        ..ParsedTransaction::default()
    };
    let message =
        handler_for("CONSENSUSSUBMITMESSAGE").success_message(Some(&snapshot), "0.0.1@2.3");
    assert_eq!(
        message,
        "Message submitted to topic 0.0.777 successfully! Transaction ID: 0.0.1@2.3"
    );
}

#[test]
fn created_entity_reads_section_then_details() {
    let from_section = ParsedTransaction {
        transaction_type: "CONSENSUSCREATETOPIC".to_string(),
        consensus_create_topic: Some(
            [("topicId".to_string(), json!("0.0.31"))].into_iter().collect(),
        ),
        ..ParsedTransaction::default()
    };
    assert_eq!(
        enrich::created_entity(&from_section),
        Some(("0.0.31".to_string(), CreatedKind::Topic))
    );

    let from_details = ParsedTransaction {
        transaction_type: "SCHEDULECREATE".to_string(),
        details: [("createdScheduleId".to_string(), json!("0.0.88"))]
            .into_iter()
            .collect(),
        ..ParsedTransaction::default()
    };
    assert_eq!(
        enrich::created_entity(&from_details),
        Some(("0.0.88".to_string(), CreatedKind::Schedule))
    );

    assert_eq!(enrich::created_entity(&ParsedTransaction::default()), None);
}

#[test]
fn settled_elsewhere_covers_the_moot_failures() {
    for raw in [
        "SCHEDULE_ALREADY_EXECUTED",
        "INVALID_SCHEDULE_ID",
        "SCHEDULE_ALREADY_DELETED",
        "the schedule was already executed yesterday",
    ] {
        assert!(
            ApprovalError::classify(raw).is_settled_elsewhere(),
            "{raw} should classify as settled elsewhere"
        );
    }
    for raw in ["SCHEDULE_EXPIRED", "INSUFFICIENT_TX_FEE", "whatever"] {
        assert!(!ApprovalError::classify(raw).is_settled_elsewhere(), "{raw}");
    }
}

#[test]
fn status_text_takes_priority_in_combined_failures() {
    // A structured status code wins even when the free text would match a
    // different category.
    let combined = "SCHEDULE_EXPIRED: request timed out while submitting";
    assert_eq!(
        ApprovalError::classify(combined),
        ApprovalError::ScheduleExpired
    );
}

#[test]
fn mirror_id_normalization_round_trips_through_extraction() {
    let message = "already executed by 0.0.5005@1700000000.000000001";
    let extracted = utils::extract_transaction_id(message).unwrap();
    assert_eq!(
        utils::normalize_transaction_id_for_mirror(&extracted),
        "0.0.5005-1700000000-000000001"
    );
}

#[test]
fn intent_builders_carry_metadata() {
    let intent = TransactionIntent::for_schedule("0.0.42", Network::Mainnet)
        .with_message_id("msg-7")
        .with_description("sign the treasury schedule");
    assert!(intent.is_schedule());
    assert_eq!(intent.message_id.as_deref(), Some("msg-7"));
    assert_eq!(intent.network, Network::Mainnet);

    let bytes = TransactionIntent::from_bytes(vec![0xde, 0xad], Network::Testnet);
    assert_eq!(bytes.transaction_bytes(), Some(&[0xde, 0xad][..]));
}

#[test]
fn display_names_cover_known_tags_and_pass_through_unknown() {
    assert_eq!(enrich::display_type_name("CRYPTOTRANSFER"), "Transfer");
    assert_eq!(
        enrich::display_type_name("contractcreateinstance"),
        "Contract Deployment"
    );
    assert_eq!(enrich::display_type_name(""), "Transaction");
    assert_eq!(enrich::display_type_name("CUSTOMTHING"), "CUSTOMTHING");
}
