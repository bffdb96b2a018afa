//! Utility functions for transaction ids, consensus timestamps, and entity naming

use crate::services::EntityContext;
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// Convert a ledger transaction id (`0.0.x@seconds.nanos`) into the
/// `0.0.x-seconds-nanos` form the mirror REST API expects. Ids that are
/// already normalized pass through unchanged.
pub fn normalize_transaction_id_for_mirror(transaction_id: &str) -> Cow<'_, str> {
    let Some((account, remainder)) = transaction_id.split_once('@') else {
        return Cow::Borrowed(transaction_id);
    };

    if account.is_empty() || remainder.is_empty() {
        return Cow::Owned(transaction_id.replace('@', "-"));
    }

    match remainder.split_once('.') {
        Some((seconds, nanos)) if !seconds.is_empty() && !nanos.is_empty() => {
            // Stray extra dots in the nanos part get collapsed.
            let nanos = nanos.replace('.', "");
            Cow::Owned(format!("{account}-{seconds}-{nanos}"))
        }
        _ => Cow::Owned(format!("{account}-{}", remainder.replace('.', "-"))),
    }
}

/// Pull a `shard.realm.num@seconds.nanos` transaction id out of a free-text
/// failure message, if one is present.
pub fn extract_transaction_id(message: &str) -> Option<String> {
    for (at, _) in message.match_indices('@') {
        let bytes = message.as_bytes();

        let mut start = at;
        while start > 0 && (bytes[start - 1].is_ascii_digit() || bytes[start - 1] == b'.') {
            start -= 1;
        }
        let account = &message[start..at];

        let mut end = at + 1;
        while end < bytes.len() && (bytes[end].is_ascii_digit() || bytes[end] == b'.') {
            end += 1;
        }
        let stamp = message[at + 1..end].trim_end_matches('.');

        let account_is_valid = account.split('.').count() == 3
            && account
                .split('.')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()));

        if account_is_valid && !stamp.is_empty() {
            return Some(format!("{account}@{stamp}"));
        }
    }
    None
}

/// Parse a mirror-style consensus timestamp (`seconds.nanos`) into UTC time.
pub fn parse_consensus_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let (seconds, nanos) = match value.split_once('.') {
        Some((seconds, nanos)) => (seconds, nanos),
        None => (value, "0"),
    };
    let seconds: i64 = seconds.trim().parse().ok()?;
    // Nanos may arrive with fewer than nine digits; right-pad to scale.
    let mut nanos = nanos.trim().to_string();
    if nanos.len() > 9 {
        nanos.truncate(9);
    }
    while nanos.len() < 9 {
        nanos.push('0');
    }
    let nanos: u32 = nanos.parse().ok()?;
    DateTime::from_timestamp(seconds, nanos)
}

/// Best-effort display name for a newly created entity: an explicit context
/// name wins, then an indicator word in the description ("token Foo"), then
/// the entity id itself.
pub fn derive_entity_name(context: Option<&EntityContext>, entity_id: &str) -> String {
    if let Some(name) = context.and_then(|context| context.name.as_deref()) {
        let trimmed = name.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    if let Some(description) = context.and_then(|context| context.description.as_deref()) {
        let tokens: Vec<&str> = description.split_whitespace().collect();
        for window in tokens.windows(2) {
            let indicator = window[0]
                .trim_matches(|c: char| !c.is_ascii_alphabetic())
                .to_ascii_lowercase();
            if is_entity_indicator(&indicator) {
                let candidate = window[1].trim_matches(|c: char| !is_allowed_entity_char(c));
                if !candidate.trim().is_empty() {
                    return candidate.trim().to_string();
                }
            }
        }
    }

    entity_id.to_string()
}

fn is_entity_indicator(value: &str) -> bool {
    matches!(
        value,
        "token" | "account" | "topic" | "schedule" | "contract" | "file"
    )
}

fn is_allowed_entity_char(character: char) -> bool {
    character.is_ascii_alphanumeric() || character == '_' || character == '-'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_id_is_normalized_for_mirror_lookup() {
        assert_eq!(
            normalize_transaction_id_for_mirror("0.0.5005@1700000000.000000001"),
            "0.0.5005-1700000000-000000001"
        );
        assert_eq!(
            normalize_transaction_id_for_mirror("0.0.5005-1700000000-000000001"),
            "0.0.5005-1700000000-000000001"
        );
    }

    #[test]
    fn transaction_id_is_extracted_from_error_text() {
        let message = "Schedule 0.0.77 already executed by 0.0.5005@1700000000.000000001, nothing to do";
        assert_eq!(
            extract_transaction_id(message).as_deref(),
            Some("0.0.5005@1700000000.000000001")
        );
        assert_eq!(extract_transaction_id("no id in here"), None);
        assert_eq!(extract_transaction_id("user@example.com"), None);
    }

    #[test]
    fn consensus_timestamps_parse_with_partial_nanos() {
        let parsed = parse_consensus_timestamp("1700000000.5").unwrap();
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        assert_eq!(parsed.timestamp_subsec_nanos(), 500_000_000);

        assert!(parse_consensus_timestamp("garbage").is_none());
    }

    #[test]
    fn entity_name_prefers_context_then_description_then_id() {
        let named = EntityContext {
            name: Some("DemoToken".to_string()),
            description: None,
        };
        assert_eq!(derive_entity_name(Some(&named), "0.0.1234"), "DemoToken");

        let described = EntityContext {
            name: None,
            description: Some("create a token SuperCoin with 8 decimals".to_string()),
        };
        assert_eq!(derive_entity_name(Some(&described), "0.0.1234"), "SuperCoin");

        assert_eq!(derive_entity_name(None, "0.0.9999"), "0.0.9999");
    }
}
