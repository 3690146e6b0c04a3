//! Submission status and its human-readable rendering.

use alloy::primitives::Address;

use crate::ledger::TxHash;

/// Warning shown when a submit is attempted without a connected account.
pub const NOT_CONNECTED_WARNING: &str = "Please connect wallet first.";

/// Where the current submission attempt stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    WalletNotFound,
    Connecting,
    Connected(Address),
    AwaitingSignature,
    Pending(TxHash),
    Confirmed(TxHash),
    Rejected(String),
    DuplicateSubmission,
}

impl SubmissionStatus {
    /// A ledger call is outstanding; a second submit must not be issued.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::AwaitingSignature | SubmissionStatus::Pending(_)
        )
    }

    /// Terminal for the current attempt.
    pub fn is_final(&self) -> bool {
        matches!(
            self,
            SubmissionStatus::Confirmed(_)
                | SubmissionStatus::Rejected(_)
                | SubmissionStatus::DuplicateSubmission
        )
    }

    /// Short label for metrics and logs.
    pub fn label(&self) -> &'static str {
        match self {
            SubmissionStatus::Idle => "idle",
            SubmissionStatus::WalletNotFound => "wallet_not_found",
            SubmissionStatus::Connecting => "connecting",
            SubmissionStatus::Connected(_) => "connected",
            SubmissionStatus::AwaitingSignature => "awaiting_signature",
            SubmissionStatus::Pending(_) => "pending",
            SubmissionStatus::Confirmed(_) => "confirmed",
            SubmissionStatus::Rejected(_) => "rejected",
            SubmissionStatus::DuplicateSubmission => "duplicate",
        }
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmissionStatus::Idle => write!(f, "Not connected"),
            SubmissionStatus::WalletNotFound => write!(f, "Wallet not detected"),
            SubmissionStatus::Connecting => write!(f, "Connecting to wallet..."),
            SubmissionStatus::Connected(address) => write!(f, "Connected: {}", address),
            SubmissionStatus::AwaitingSignature => write!(f, "Waiting for signature..."),
            SubmissionStatus::Pending(hash) => write!(f, "Waiting for transaction: {}", hash),
            SubmissionStatus::Confirmed(hash) => write!(f, "Success! TX Hash: {}", hash),
            SubmissionStatus::Rejected(reason) => write!(f, "Error: submission failed ({})", reason),
            SubmissionStatus::DuplicateSubmission => write!(
                f,
                "Duplicate submission: this content identifier has already been recorded on the ledger."
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_states() {
        assert!(SubmissionStatus::AwaitingSignature.is_in_flight());
        assert!(SubmissionStatus::Pending(TxHash::ZERO).is_in_flight());
        assert!(!SubmissionStatus::Confirmed(TxHash::ZERO).is_in_flight());
        assert!(!SubmissionStatus::Connected(Address::ZERO).is_in_flight());
    }

    #[test]
    fn test_duplicate_and_generic_messages_differ() {
        let duplicate = SubmissionStatus::DuplicateSubmission.to_string();
        let generic = SubmissionStatus::Rejected("out of gas".into()).to_string();
        assert!(duplicate.contains("already been recorded"));
        assert!(generic.starts_with("Error:"));
        assert!(!generic.contains("already been recorded"));
    }

    #[test]
    fn test_success_line_carries_hash() {
        let hash = TxHash::repeat_byte(0x11);
        let line = SubmissionStatus::Confirmed(hash).to_string();
        assert!(line.contains("Success"));
        assert!(line.contains(&hash.to_string()));
    }
}
