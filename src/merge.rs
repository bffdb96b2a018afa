//! Merge policy for reconciling enhanced and original snapshots
use crate::transaction::{Fields, ParsedTransaction, Section};

/// Combine an enhanced (post-execution, mirror-derived) snapshot with the
/// original (pre-execution) snapshot of the same transaction.
///
/// `details` and the type-specific sections are shallow-unioned with the
/// enhanced value winning on conflict; keys only the original knows are
/// preserved. Every other top-level field is taken from the enhanced side
/// alone, so stale pre-execution arrays are never resurrected. Neither input
/// is mutated.
pub fn merge(
    enhanced: &ParsedTransaction,
    original: Option<&ParsedTransaction>,
) -> ParsedTransaction {
    let mut merged = enhanced.clone();
    let Some(original) = original else {
        return merged;
    };

    union_into(&mut merged.details, &original.details);

    for section in Section::ALL {
        let Some(original_fields) = section.get(original) else {
            continue;
        };
        let slot = section.slot_mut(&mut merged);
        match slot.as_mut() {
            Some(target) => union_into(target, original_fields),
            None => *slot = Some(original_fields.clone()),
        }
    }

    merged
}

/// Copy keys from `original` that `target` does not already have.
fn union_into(target: &mut Fields, original: &Fields) {
    for (key, value) in original {
        target
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn missing_original_returns_enhanced_unchanged() {
        let enhanced = ParsedTransaction {
            transaction_type: "TOKENCREATION".to_string(),
            details: fields(&[("createdTokenId", json!("0.0.777"))]),
            ..ParsedTransaction::default()
        };
        assert_eq!(merge(&enhanced, None), enhanced);
    }

    #[test]
    fn enhanced_wins_on_conflict_and_original_fields_survive() {
        let enhanced = ParsedTransaction {
            details: fields(&[("name", json!("Enhanced"))]),
            token_creation: Some(fields(&[
                ("name", json!("Enhanced")),
                ("symbol", json!("ENH")),
            ])),
            ..ParsedTransaction::default()
        };
        let original = ParsedTransaction {
            details: fields(&[("initialSupply", json!(1000))]),
            token_creation: Some(fields(&[("decimals", json!(8))])),
            ..ParsedTransaction::default()
        };

        let merged = merge(&enhanced, Some(&original));

        assert_eq!(
            merged.details,
            fields(&[("name", json!("Enhanced")), ("initialSupply", json!(1000))])
        );
        assert_eq!(
            merged.token_creation.unwrap(),
            fields(&[
                ("decimals", json!(8)),
                ("name", json!("Enhanced")),
                ("symbol", json!("ENH")),
            ])
        );
    }

    #[test]
    fn non_mergeable_fields_come_from_enhanced_only() {
        let enhanced = ParsedTransaction::default();
        let original = ParsedTransaction {
            memo: Some("old memo".to_string()),
            transfers: Some(vec![]),
            extra: {
                let mut extra = BTreeMap::new();
                extra.insert("hbarTransfers".to_string(), json!([{"amount": 1}]));
                extra
            },
            ..ParsedTransaction::default()
        };

        let merged = merge(&enhanced, Some(&original));
        assert_eq!(merged.memo, None);
        assert_eq!(merged.transfers, None);
        assert!(merged.extra.is_empty());
    }
}
