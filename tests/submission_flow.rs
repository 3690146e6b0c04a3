//! End-to-end submission workflow against the in-memory ledger.

use std::sync::Arc;

use alloy::primitives::{Address, U256};
use serde_json::json;

use patent_ledger::evaluation::{ContentId, Decision, EvaluationResult, UpstreamError};
use patent_ledger::ledger::{InMemoryLedger, LedgerClient, WalletSession};
use patent_ledger::workflow::{
    EvaluationOrchestrator, SubmissionController, SubmissionStatus, SubmitOutcome,
    NOT_CONNECTED_WARNING,
};

mod common;

fn unique_report() -> serde_json::Value {
    json!({
        "document_id": "5d41402abc4b2a76",
        "is_unique": true,
        "uniqueness_score": 0.12,
        "agent_judgment": "(a)",
        "matched_patent": {"filename": "US7654321.pdf", "similarity_score": 0.88}
    })
}

#[tokio::test]
async fn test_evaluate_pin_connect_submit_confirms() {
    let ledger = InMemoryLedger::new();
    let account = Address::repeat_byte(0xab);
    let mut controller = common::controller(Some(account), &ledger);
    let uploader = common::ScriptedUploader::new(json!({"cid": "bafy123"}));
    let orchestrator = EvaluationOrchestrator::new(
        common::ScriptedEvaluator::new(unique_report()),
        uploader.clone(),
    );

    let outcome = orchestrator
        .run("D.pdf", b"%PDF-1.4".to_vec(), &mut controller)
        .await
        .unwrap();

    let record = ledger.record("bafy123").expect("result recorded");
    assert_eq!(record.sender, account);
    assert_eq!(record.score, U256::ZERO);
    assert_eq!(record.decision, "Unique");

    assert_eq!(outcome.status, SubmissionStatus::Confirmed(record.tx_hash));
    assert!(outcome.status_line.contains("Success"));
    assert!(outcome.status_line.contains(&record.tx_hash.to_string()));
    assert_eq!(outcome.report.judgment().describe(), "(a) Clearly novel");
    assert_eq!(uploader.calls(), 1);
}

#[tokio::test]
async fn test_same_cid_from_another_account_is_duplicate() {
    let ledger = InMemoryLedger::new();
    let result = EvaluationResult::new(ContentId::new("bafy123"), 0.12, Decision::Unique);

    let mut first = common::controller(Some(Address::repeat_byte(0xab)), &ledger);
    first.connect().await;
    assert!(matches!(
        first.submit(&result).await,
        SubmitOutcome::Finished(SubmissionStatus::Confirmed(_))
    ));

    let mut second = common::controller(Some(Address::repeat_byte(0xcd)), &ledger);
    second.connect().await;
    let outcome = second.submit(&result).await;

    assert_eq!(outcome, SubmitOutcome::Finished(SubmissionStatus::DuplicateSubmission));
    let line = second.status_line();
    assert!(line.contains("already been recorded"));
    assert!(!line.starts_with("Error:"));
    assert_eq!(ledger.record("bafy123").unwrap().sender, Address::repeat_byte(0xab));
}

#[tokio::test]
async fn test_recorded_cid_is_duplicate_for_any_score_and_decision() {
    let ledger = InMemoryLedger::new();
    let mut controller = common::controller(Some(Address::repeat_byte(1)), &ledger);
    controller.connect().await;

    let cids = ["bafy-a", "bafy-b", "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG"];
    for cid in cids {
        let first = EvaluationResult::new(ContentId::new(cid), 0.3, Decision::Unique);
        assert!(matches!(
            controller.submit(&first).await,
            SubmitOutcome::Finished(SubmissionStatus::Confirmed(_))
        ));
    }

    for cid in cids {
        for (score, decision) in [(0.0, Decision::Unique), (0.99, Decision::NotUnique), (1.0, Decision::Unique)] {
            let again = EvaluationResult::new(ContentId::new(cid), score, decision);
            assert_eq!(
                controller.submit(&again).await,
                SubmitOutcome::Finished(SubmissionStatus::DuplicateSubmission),
                "cid {cid} score {score}"
            );
        }
    }
    assert_eq!(ledger.len(), cids.len());
}

#[tokio::test]
async fn test_scores_floor_to_integers_on_ledger() {
    let ledger = InMemoryLedger::new();
    let mut controller = common::controller(Some(Address::repeat_byte(1)), &ledger);
    controller.connect().await;

    for (cid, score) in [("s-087", 0.87), ("s-099", 0.99), ("s-100", 1.0)] {
        let result = EvaluationResult::new(ContentId::new(cid), score, Decision::Unique);
        controller.submit(&result).await;
    }

    assert_eq!(ledger.record("s-087").unwrap().score, U256::ZERO);
    assert_eq!(ledger.record("s-099").unwrap().score, U256::ZERO);
    assert_eq!(ledger.record("s-100").unwrap().score, U256::from(1));
}

#[tokio::test]
async fn test_submit_without_wallet_connection_has_no_side_effects() {
    let ledger = InMemoryLedger::new();
    let mut controller = common::controller(Some(Address::repeat_byte(1)), &ledger);
    let result = EvaluationResult::new(ContentId::new("bafy123"), 0.5, Decision::Unique);

    assert_eq!(controller.submit(&result).await, SubmitOutcome::NotConnected);
    assert_eq!(controller.status(), SubmissionStatus::Idle);
    assert_eq!(controller.status_line(), NOT_CONNECTED_WARNING);
    assert_eq!(ledger.send_calls(), 0);
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_run_without_wallet_reports_wallet_not_found() {
    let ledger = InMemoryLedger::new();
    let mut controller = common::controller(None, &ledger);
    let orchestrator = EvaluationOrchestrator::new(
        common::ScriptedEvaluator::new(unique_report()),
        common::ScriptedUploader::new(json!({"cid": "bafy123"})),
    );

    let outcome = orchestrator
        .run("D.pdf", Vec::new(), &mut controller)
        .await
        .unwrap();

    assert_eq!(outcome.status, SubmissionStatus::WalletNotFound);
    assert_eq!(outcome.status_line, "Wallet not detected");
    assert_eq!(outcome.result.unwrap().content_id().as_str(), "bafy123");
    assert_eq!(ledger.send_calls(), 0);
}

#[tokio::test]
async fn test_run_with_declined_wallet_prompt_shows_rejection() {
    let ledger = InMemoryLedger::new();
    let mut controller = SubmissionController::new(
        WalletSession::new(Some(common::DecliningWallet::new())),
        LedgerClient::new(Arc::new(ledger.clone())),
    );
    let orchestrator = EvaluationOrchestrator::new(
        common::ScriptedEvaluator::new(unique_report()),
        common::ScriptedUploader::new(json!({"cid": "bafy123"})),
    );

    let outcome = orchestrator
        .run("D.pdf", Vec::new(), &mut controller)
        .await
        .unwrap();

    assert_eq!(outcome.status, SubmissionStatus::Idle);
    assert!(outcome.status_line.contains("rejected"));
    assert_ne!(outcome.status_line, NOT_CONNECTED_WARNING);
    assert_eq!(ledger.send_calls(), 0);

    // The user can approve on a second attempt; nothing was left half done.
    assert!(controller.account().is_none());
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_malformed_cid_aborts_before_ledger() {
    for body in [json!({"cid": 12345}), json!({}), json!({"error": "Pinata upload failed"})] {
        let ledger = InMemoryLedger::new();
        let mut controller = common::controller(Some(Address::repeat_byte(1)), &ledger);
        let orchestrator = EvaluationOrchestrator::new(
            common::ScriptedEvaluator::new(unique_report()),
            common::ScriptedUploader::new(body),
        );

        let err = orchestrator
            .run("D.pdf", Vec::new(), &mut controller)
            .await
            .unwrap_err();

        assert!(matches!(err, UpstreamError::Malformed { .. }));
        assert_eq!(controller.status(), SubmissionStatus::Idle);
        assert!(controller.account().is_none());
        assert_eq!(ledger.send_calls(), 0);
    }
}

#[tokio::test]
async fn test_confirmation_failure_is_generic_and_retryable() {
    let ledger = InMemoryLedger::new();
    ledger.fail_next_wait("header not found");
    let mut controller = common::controller(Some(Address::repeat_byte(1)), &ledger);
    controller.connect().await;
    let result = EvaluationResult::new(ContentId::new("bafy-wait"), 0.2, Decision::Unique);

    let outcome = controller.submit(&result).await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Finished(SubmissionStatus::Rejected(ref reason)) if reason.contains("header not found")
    ));
    // Stays in the error state until the caller acts.
    assert!(matches!(controller.status(), SubmissionStatus::Rejected(_)));
    assert!(controller.can_submit());
}
