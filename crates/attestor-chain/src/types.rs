use attestor_types::{
    canonical_uint_string, AggregatedAttestation, NonSignerInfo, Result, Task, TaskIndex,
    TaskResponseData,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Receipt for a confirmed `createTask` transaction, with the task as the
/// contract assigned it (index and creation block included).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreatedReceipt {
    pub task: Task,
    pub tx_hash: String,
    pub block_number: u64,
}

/// A `NewTaskCreated` event observed while polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTaskEvent {
    pub task: Task,
    pub block_number: u64,
}

/// Receipt for a confirmed transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: String,
    pub block_number: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub confirmed_at: DateTime<Utc>,
}

/// The `respondToTask` call payload with every numeric field already in
/// canonical integer-string form. Built from an attestation immediately
/// before gas estimation; the canonicalization step absorbs scientific
/// notation a crypto backend may have emitted into coordinate strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RespondCall {
    pub task_response: TaskResponseData,
    pub non_signer_bitmap_indices: Vec<u32>,
    pub non_signer_pubkeys: Vec<(String, String)>,
    pub quorum_apks: Vec<(String, String)>,
    pub signers_apk_g2: ([String; 2], [String; 2]),
    pub aggregate_signature: (String, String),
    pub quorum_indices: Vec<u32>,
}

impl RespondCall {
    pub fn from_attestation(attestation: &AggregatedAttestation) -> Result<Self> {
        let canonical_pair = |pair: (String, String)| -> Result<(String, String)> {
            Ok((canonical_uint_string(&pair.0)?, canonical_uint_string(&pair.1)?))
        };

        let NonSignerInfo {
            quorum_bitmap_indices,
            non_signer_pubkeys,
        } = &attestation.non_signer_info;

        let (x, y) = attestation.signers_apk_g2.to_decimal();
        Ok(Self {
            task_response: attestation.task_response.clone(),
            non_signer_bitmap_indices: quorum_bitmap_indices.clone(),
            non_signer_pubkeys: non_signer_pubkeys
                .iter()
                .map(|p| canonical_pair(p.to_decimal()))
                .collect::<Result<_>>()?,
            quorum_apks: attestation
                .quorum_apks
                .iter()
                .map(|p| canonical_pair(p.to_decimal()))
                .collect::<Result<_>>()?,
            signers_apk_g2: (
                [
                    canonical_uint_string(&x[0])?,
                    canonical_uint_string(&x[1])?,
                ],
                [
                    canonical_uint_string(&y[0])?,
                    canonical_uint_string(&y[1])?,
                ],
            ),
            aggregate_signature: canonical_pair(attestation.aggregate_signature.to_decimal())?,
            quorum_indices: attestation.quorum_indices.clone(),
        })
    }

    pub fn task_index(&self) -> TaskIndex {
        self.task_response.task_index
    }
}
