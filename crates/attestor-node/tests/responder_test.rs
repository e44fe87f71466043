//! OnChainResponder behavior: defensive shape validation, revert-means-
//! discard, and canonical integer formatting of the call payload.

use attestor_chain::{ChainClient, MemoryChain, RespondCall};
use attestor_node::OnChainResponder;
use attestor_types::points::fq_modulus;
use attestor_types::{
    AggregatedAttestation, G1Point, G2Point, NonSignerInfo, TaskParams, TaskResponseData,
};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;

fn attestation(task_index: u32) -> AggregatedAttestation {
    AggregatedAttestation {
        task_index,
        task_response: TaskResponseData {
            task_index,
            approved: true,
            metadata_url: "https://example.com/task".to_string(),
        },
        non_signer_info: NonSignerInfo::default(),
        quorum_apks: vec![G1Point::from_coordinates("11", "22").unwrap()],
        signers_apk_g2: G2Point::zero(),
        aggregate_signature: G1Point::from_coordinates("33", "44").unwrap(),
        quorum_indices: vec![0],
        aggregated_at: Utc::now(),
    }
}

fn responder(chain: Arc<MemoryChain>) -> OnChainResponder {
    let (_tx, rx) = mpsc::unbounded_channel();
    OnChainResponder::new(chain, rx)
}

#[tokio::test]
async fn test_valid_attestation_is_submitted() {
    let chain = Arc::new(MemoryChain::new());
    chain.create_task(&TaskParams::default()).await.unwrap();

    let responder = responder(chain.clone());
    responder.respond(&attestation(0)).await.unwrap();

    let call = chain.response_for(0).await.unwrap();
    assert_eq!(call.aggregate_signature, ("33".to_string(), "44".to_string()));
    assert_eq!(call.quorum_apks, vec![("11".to_string(), "22".to_string())]);
}

#[tokio::test]
async fn test_estimation_revert_discards_without_submitting() {
    let chain = Arc::new(MemoryChain::new());
    chain.create_task(&TaskParams::default()).await.unwrap();

    let responder = responder(chain.clone());
    responder.respond(&attestation(0)).await.unwrap();
    assert_eq!(chain.response_count().await, 1);

    // A second attestation for the same task reverts at gas estimation
    // (replay protection) and is silently dropped, not retried.
    responder.respond(&attestation(0)).await.unwrap();
    assert_eq!(chain.response_count().await, 1);
}

#[tokio::test]
async fn test_unknown_task_revert_discards() {
    let chain = Arc::new(MemoryChain::new());
    let responder = responder(chain.clone());

    responder.respond(&attestation(42)).await.unwrap();
    assert_eq!(chain.response_count().await, 0);
}

#[tokio::test]
async fn test_out_of_field_point_discarded_before_any_chain_call() {
    let chain = Arc::new(MemoryChain::new());
    chain.create_task(&TaskParams::default()).await.unwrap();
    let txs_before = chain.transaction_count().await.unwrap();

    let mut bad = attestation(0);
    bad.quorum_apks = vec![G1Point::new(
        fq_modulus().clone(),
        fq_modulus().clone() + 1u8,
    )];

    let responder = responder(chain.clone());
    responder.respond(&bad).await.unwrap();

    assert_eq!(chain.response_count().await, 0);
    assert_eq!(chain.transaction_count().await.unwrap(), txs_before);
}

#[test]
fn test_respond_call_coordinates_are_canonical_decimal() {
    let attestation = attestation(3);
    let call = RespondCall::from_attestation(&attestation).unwrap();
    assert_eq!(call.task_index(), 3);
    assert_eq!(call.signers_apk_g2.0, ["0".to_string(), "0".to_string()]);
    assert_eq!(call.aggregate_signature.0, "33");
    // Serialized form carries only integer strings, never scientific
    // notation.
    let json = serde_json::to_string(&call).unwrap();
    assert!(!json.contains("e+"));
}
