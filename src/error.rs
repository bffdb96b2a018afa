//! User-facing error taxonomy and classification of raw ledger failures
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApprovalError {
    #[error("Wallet is connected to {wallet} but this transaction targets {intent}")]
    NetworkMismatch { wallet: String, intent: String },
    #[error("Transaction payer {payer} does not match the connected account {signer}")]
    PayerMismatch { payer: String, signer: String },
    #[error(
        "{transaction_type} transactions need signatures the wallet cannot provide. \
         Request new transaction bytes or use the local signer."
    )]
    UnsupportedForWallet { transaction_type: String },
    #[error("Transaction has already been executed")]
    AlreadyExecuted,
    #[error("Scheduled transaction has expired")]
    ScheduleExpired,
    #[error("Scheduled transaction was deleted")]
    ScheduleDeleted,
    #[error("Schedule ID is invalid or no longer exists")]
    InvalidScheduleId,
    #[error("Insufficient account balance to pay for this transaction")]
    InsufficientBalance,
    #[error("Transaction expired before reaching consensus")]
    TransactionExpired,
    #[error("Transaction is malformed or could not be decoded")]
    MalformedTransaction,
    #[error("Network error while contacting the ledger: {0}")]
    NetworkError(String),
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
    #[error("Transaction was submitted but not confirmed by the mirror node: {0}")]
    MirrorNotConfirmed(String),
    #[error("Transaction failed: {0}")]
    GenericFailure(String),
}

impl ApprovalError {
    /// Classify a raw signer/ledger failure string into a category.
    ///
    /// The substrings matched here mirror the status codes and free-text
    /// fragments the wallet relays verbatim, so classification stays stable
    /// across signer versions that lack structured error kinds.
    pub fn classify(raw: &str) -> Self {
        let upper = raw.to_ascii_uppercase();

        if upper.contains("INVALID_SCHEDULE_ID") {
            return Self::InvalidScheduleId;
        }
        if upper.contains("SCHEDULE_ALREADY_EXECUTED") || upper.contains("ALREADY EXECUTED") {
            return Self::AlreadyExecuted;
        }
        if upper.contains("SCHEDULE_ALREADY_DELETED") || upper.contains("SCHEDULE_DELETED") {
            return Self::ScheduleDeleted;
        }
        if upper.contains("SCHEDULE_EXPIRED") {
            return Self::ScheduleExpired;
        }
        if upper.contains("PAYER_MISMATCH") {
            return Self::PayerMismatch {
                payer: "unknown".to_string(),
                signer: "unknown".to_string(),
            };
        }
        if upper.contains("INSUFFICIENT_PAYER_BALANCE")
            || upper.contains("INSUFFICIENT_ACCOUNT_BALANCE")
            || upper.contains("INSUFFICIENT_TX_FEE")
        {
            return Self::InsufficientBalance;
        }
        if upper.contains("TRANSACTION_EXPIRED") {
            return Self::TransactionExpired;
        }
        if upper.contains("INVALID_TRANSACTION")
            || upper.contains("MALFORMED")
            || upper.contains("FAILED TO PARSE")
            || upper.contains("FAILED TO DECODE")
        {
            return Self::MalformedTransaction;
        }
        if upper.contains("TIMED OUT")
            || upper.contains("TIMEOUT")
            || upper.contains("CONNECTION")
            || upper.contains("UNAVAILABLE")
            || upper.contains("NETWORK ERROR")
        {
            return Self::NetworkError(raw.to_string());
        }
        if upper.contains("NOT CONFIGURED") || upper.contains("BRIDGE IS NOT READY") {
            return Self::ConfigurationError(raw.to_string());
        }

        Self::GenericFailure(raw.to_string())
    }

    /// True for failures meaning the request is moot rather than erroneous:
    /// the schedule was consumed, deleted, or pruned before our attempt.
    pub fn is_settled_elsewhere(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExecuted | Self::ScheduleDeleted | Self::InvalidScheduleId
        )
    }
}
