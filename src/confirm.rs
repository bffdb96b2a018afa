//! Bounded wait for mirror-side confirmation of a submitted transaction
//!
//! Submission success alone can mask a downstream rejection, so the wallet
//! bytes path holds off declaring success until the mirror node records the
//! transaction.
use crate::config::Config;
use crate::services::{MirrorRecord, MirrorService};
use crate::transaction::Network;
use crate::utils::normalize_transaction_id_for_mirror;
use tokio::time::Instant;

#[derive(Clone, Debug, PartialEq)]
pub enum Confirmation {
    /// The mirror recorded the transaction with a `SUCCESS` result.
    Confirmed(MirrorRecord),
    /// The mirror recorded a non-success result (the contained status).
    Rejected(String),
    /// No record appeared within the timeout.
    TimedOut,
}

/// Poll the mirror service for `transaction_id` until it reports a result or
/// the configured timeout elapses. Lookup errors are treated like a missing
/// record and retried within the window.
pub async fn wait_for_confirmation(
    mirror: &dyn MirrorService,
    transaction_id: &str,
    network: Network,
    config: &Config,
) -> Confirmation {
    let normalized = normalize_transaction_id_for_mirror(transaction_id);
    let deadline = Instant::now() + config.confirmation_timeout;

    loop {
        match mirror.get_transaction(&normalized, network).await {
            Ok(Some(record)) => {
                let result = record.result.clone().unwrap_or_default();
                if result.eq_ignore_ascii_case("SUCCESS") {
                    return Confirmation::Confirmed(record);
                }
                if !result.is_empty() {
                    tracing::info!(%transaction_id, %result, "mirror recorded a failure result");
                    return Confirmation::Rejected(result);
                }
                // Record exists but carries no result yet; keep waiting.
            }
            Ok(None) => {
                tracing::debug!(%transaction_id, "transaction not yet indexed by mirror");
            }
            Err(error) => {
                tracing::debug!(%transaction_id, "mirror lookup failed: {error:#}");
            }
        }

        if Instant::now() + config.confirmation_poll_interval > deadline {
            return Confirmation::TimedOut;
        }
        tokio::time::sleep(config.confirmation_poll_interval).await;
    }
}
