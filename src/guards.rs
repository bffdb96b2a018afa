//! Pre-dispatch guard checks
//!
//! Pure predicates that run before any signer call. A failing guard blocks
//! dispatch locally; the signer is never reached.
use crate::error::ApprovalError;
use crate::transaction::Network;

/// A wallet-style signer must be connected to the network the intent targets.
pub fn check_network(wallet: Network, intent: Network) -> Result<(), ApprovalError> {
    if wallet == intent {
        Ok(())
    } else {
        Err(ApprovalError::NetworkMismatch {
            wallet: wallet.to_string(),
            intent: intent.to_string(),
        })
    }
}

/// The payer baked into the transaction bytes should match the account that
/// will sign. Advisory only: when either side is undeterminable the check
/// passes, since decoding is best-effort and not a cryptographic guarantee.
pub fn check_payer(payer: Option<&str>, signer: Option<&str>) -> Result<(), ApprovalError> {
    match (payer, signer) {
        (Some(payer), Some(signer)) if payer != signer => Err(ApprovalError::PayerMismatch {
            payer: payer.to_string(),
            signer: signer.to_string(),
        }),
        _ => Ok(()),
    }
}

/// Wallets can only contribute the payer's signature. Transaction types that
/// routinely need more keys (admin, supply, freeze keys and the like) are
/// blocked up front rather than failing on-ledger. Unknown types pass.
pub fn check_wallet_capability(transaction_type: Option<&str>) -> Result<(), ApprovalError> {
    match transaction_type {
        Some(tag) if !is_likely_payer_only(tag) => Err(ApprovalError::UnsupportedForWallet {
            transaction_type: tag.to_string(),
        }),
        _ => Ok(()),
    }
}

/// True when a transaction of this type is typically executable with just
/// the payer's signature.
pub fn is_likely_payer_only(transaction_type: &str) -> bool {
    matches!(
        transaction_type.trim().to_ascii_uppercase().as_str(),
        "CRYPTOTRANSFER"
            | "TOKENASSOCIATE"
            | "TOKENDISSOCIATE"
            | "CONSENSUSSUBMITMESSAGE"
            | "CRYPTOAPPROVEALLOWANCE"
            | "CRYPTODELETEALLOWANCE"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_mismatch_names_both_networks() {
        assert!(check_network(Network::Testnet, Network::Testnet).is_ok());

        let error = check_network(Network::Mainnet, Network::Testnet).unwrap_err();
        assert_eq!(
            error,
            ApprovalError::NetworkMismatch {
                wallet: "mainnet".to_string(),
                intent: "testnet".to_string(),
            }
        );
    }

    #[test]
    fn payer_guard_fails_open_when_undeterminable() {
        assert!(check_payer(None, Some("0.0.5005")).is_ok());
        assert!(check_payer(Some("0.0.5005"), None).is_ok());
        assert!(check_payer(None, None).is_ok());
        assert!(check_payer(Some("0.0.5005"), Some("0.0.5005")).is_ok());

        let error = check_payer(Some("0.0.1001"), Some("0.0.5005")).unwrap_err();
        assert!(matches!(error, ApprovalError::PayerMismatch { .. }));
    }

    #[test]
    fn wallet_capability_blocks_multi_key_types() {
        assert!(check_wallet_capability(Some("CRYPTOTRANSFER")).is_ok());
        assert!(check_wallet_capability(Some("tokenassociate")).is_ok());
        assert!(check_wallet_capability(None).is_ok());

        let error = check_wallet_capability(Some("TOKENCREATION")).unwrap_err();
        assert_eq!(
            error,
            ApprovalError::UnsupportedForWallet {
                transaction_type: "TOKENCREATION".to_string(),
            }
        );
    }
}
