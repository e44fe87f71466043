//! SignatureIngress contract tests against a live listener: `200`/`"true"`
//! on acceptance, `500`/`"false"` on every failure shape.

use attestor_aggregation::{AggregationScheduler, AggregationStatus, SchedulerHandle};
use attestor_crypto::{BlsKeypair, BlsScheme, BlsSecretKey, DevBls};
use attestor_types::{task_content_digest, OperatorInfo, SignatureSubmission, Task};
use std::collections::HashMap;
use std::sync::Arc;

const METADATA_URL: &str = "https://example.com/task";

async fn serve() -> (String, SchedulerHandle, Arc<dyn BlsScheme>) {
    let scheme: Arc<dyn BlsScheme> = Arc::new(DevBls);
    // The attestation receiver is dropped; these tests only exercise the
    // ingress contract.
    let (scheduler, _attestation_rx, _join) = AggregationScheduler::spawn(scheme.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let app = attestor_node::api::routes(scheduler.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (url, scheduler, scheme)
}

fn keypair(scheme: &dyn BlsScheme, seed: u8) -> BlsKeypair {
    BlsKeypair::from_secret(scheme, BlsSecretKey::from_bytes([seed; 32]))
}

fn operator_info(keypair: &BlsKeypair, stake: u128) -> OperatorInfo {
    OperatorInfo {
        operator_id: keypair.operator_id(),
        pubkey_g1: keypair.public_g1.clone(),
        pubkey_g2: keypair.public_g2.clone(),
        stake_per_quorum: HashMap::from([(0u8, stake)]),
    }
}

fn task(index: u32) -> Task {
    Task {
        index,
        metadata_url: METADATA_URL.to_string(),
        creation_block: 1,
        quorum_numbers: vec![0],
        quorum_threshold_percentages: vec![100],
        timeout_ms: 60_000,
    }
}

fn signed_submission(scheme: &dyn BlsScheme, keypair: &BlsKeypair, index: u32) -> SignatureSubmission {
    let digest = task_content_digest(index, METADATA_URL);
    let point = scheme.sign(keypair.secret(), &digest);
    SignatureSubmission::new(index, METADATA_URL.to_string(), &point, 1, keypair.operator_id())
}

#[tokio::test]
async fn test_health() {
    let (url, _scheduler, _scheme) = serve().await;
    let response = reqwest::get(format!("{}/health", url)).await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "OK");
}

#[tokio::test]
async fn test_missing_coordinate_rejected_before_scheduler() {
    let (url, scheduler, scheme) = serve().await;
    let keypair = keypair(scheme.as_ref(), 1);
    scheduler
        .register_task(task(0), vec![operator_info(&keypair, 100)])
        .await
        .unwrap();

    // Signature body missing its Y coordinate.
    let body = serde_json::json!({
        "task_id": "0",
        "metadata_url": METADATA_URL,
        "signature": { "X": "12345" },
        "block_number": "0x1",
        "operator_id": format!("0x{}", keypair.operator_id().to_hex()),
    });
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{}/signature", url))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "false");

    // The malformed payload never counted: the task is still open and the
    // operator can still sign.
    assert_eq!(
        scheduler.status(0).await,
        Some(AggregationStatus::Open)
    );
    let good = signed_submission(scheme.as_ref(), &keypair, 0);
    let response = client
        .post(format!("{}/signature", url))
        .json(&good)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "true");
}

#[tokio::test]
async fn test_unknown_task_rejected() {
    let (url, _scheduler, scheme) = serve().await;
    let keypair = keypair(scheme.as_ref(), 2);
    let submission = signed_submission(scheme.as_ref(), &keypair, 99);

    let response = reqwest::Client::new()
        .post(format!("{}/signature", url))
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "false");
}

#[tokio::test]
async fn test_duplicate_signer_rejected() {
    let (url, scheduler, scheme) = serve().await;
    let a = keypair(scheme.as_ref(), 1);
    let b = keypair(scheme.as_ref(), 2);
    scheduler
        .register_task(
            task(0),
            vec![operator_info(&a, 50), operator_info(&b, 50)],
        )
        .await
        .unwrap();

    let submission = signed_submission(scheme.as_ref(), &a, 0);
    let client = reqwest::Client::new();

    let first = client
        .post(format!("{}/signature", url))
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), 200);

    let second = client
        .post(format!("{}/signature", url))
        .json(&submission)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), 500);
    assert_eq!(second.text().await.unwrap(), "false");
}

#[tokio::test]
async fn test_non_json_body_rejected() {
    let (url, _scheduler, _scheme) = serve().await;
    let response = reqwest::Client::new()
        .post(format!("{}/signature", url))
        .header("content-type", "application/json")
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(response.text().await.unwrap(), "false");
}
