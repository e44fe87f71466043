//! The `POST /signature` wire format, shared by the aggregator's ingress and
//! the operator's submission client.

use crate::attestation::PartialSignature;
use crate::error::{AttestorError, Result};
use crate::operator::OperatorId;
use crate::points::G1Point;
use crate::task::TaskIndex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WirePoint {
    #[serde(rename = "X")]
    pub x: String,
    #[serde(rename = "Y")]
    pub y: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureSubmission {
    /// Decimal string task index.
    pub task_id: String,
    pub metadata_url: String,
    pub signature: WirePoint,
    /// Hex block number of the observed task event, `0x`-prefixed.
    pub block_number: String,
    /// Hex operator id.
    pub operator_id: String,
}

impl SignatureSubmission {
    pub fn new(
        task_index: TaskIndex,
        metadata_url: String,
        signature: &G1Point,
        block_number: u64,
        operator_id: OperatorId,
    ) -> Self {
        let (x, y) = signature.to_decimal();
        Self {
            task_id: task_index.to_string(),
            metadata_url,
            signature: WirePoint { x, y },
            block_number: format!("0x{:x}", block_number),
            operator_id: format!("0x{}", operator_id.to_hex()),
        }
    }

    pub fn task_index(&self) -> Result<TaskIndex> {
        self.task_id.trim().parse().map_err(|_| {
            AttestorError::MalformedSubmission(format!("invalid task_id: {}", self.task_id))
        })
    }

    pub fn block_number(&self) -> Result<u64> {
        let s = self.block_number.trim();
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .ok_or_else(|| {
                AttestorError::MalformedSubmission(format!("invalid block_number: {}", s))
            })?;
        u64::from_str_radix(digits, 16).map_err(|_| {
            AttestorError::MalformedSubmission(format!("invalid block_number: {}", s))
        })
    }

    pub fn operator_id(&self) -> Result<OperatorId> {
        OperatorId::from_hex(&self.operator_id).map_err(|_| {
            AttestorError::MalformedSubmission(format!("invalid operator_id: {}", self.operator_id))
        })
    }

    /// Validate every field and convert into a `PartialSignature`. Fails
    /// without side effects; nothing here touches aggregation state.
    pub fn to_partial_signature(&self) -> Result<PartialSignature> {
        let task_index = self.task_index()?;
        let operator_id = self.operator_id()?;
        self.block_number()?;
        let point = G1Point::from_coordinates(&self.signature.x, &self.signature.y)?;
        if !point.is_well_formed() {
            return Err(AttestorError::MalformedSubmission(
                "signature coordinates exceed the field modulus".to_string(),
            ));
        }
        Ok(PartialSignature {
            task_index,
            operator_id,
            point,
        })
    }
}
