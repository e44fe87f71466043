use crate::operator::OperatorId;
use crate::points::{G1Point, G2Point};
use crate::task::TaskIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One operator's signature share over a task digest. Consumed exactly once
/// by the aggregation core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialSignature {
    pub task_index: TaskIndex,
    pub operator_id: OperatorId,
    pub point: G1Point,
}

/// The response payload the aggregate signature attests to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskResponseData {
    pub task_index: TaskIndex,
    pub approved: bool,
    pub metadata_url: String,
}

/// Bookkeeping for expected signers that never signed: their positions in
/// the expected-signer ordering plus their G1 public keys, as the verifying
/// contract needs to subtract them from the quorum aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NonSignerInfo {
    pub quorum_bitmap_indices: Vec<u32>,
    pub non_signer_pubkeys: Vec<G1Point>,
}

/// The finalized, quorum-satisfying attestation for one task. Produced
/// exactly once per task index, immutable, consumed exactly once by the
/// on-chain responder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedAttestation {
    pub task_index: TaskIndex,
    pub task_response: TaskResponseData,
    pub non_signer_info: NonSignerInfo,
    pub quorum_apks: Vec<G1Point>,
    pub signers_apk_g2: G2Point,
    pub aggregate_signature: G1Point,
    pub quorum_indices: Vec<u32>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub aggregated_at: DateTime<Utc>,
}

impl AggregatedAttestation {
    /// Shape validation the responder runs before anything goes on-chain:
    /// every point must carry field-sized coordinates.
    pub fn is_well_formed(&self) -> bool {
        self.aggregate_signature.is_well_formed()
            && self.signers_apk_g2.is_well_formed()
            && self.quorum_apks.iter().all(G1Point::is_well_formed)
            && self
                .non_signer_info
                .non_signer_pubkeys
                .iter()
                .all(G1Point::is_well_formed)
    }
}
