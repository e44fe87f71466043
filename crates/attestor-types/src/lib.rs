pub mod attestation;
pub mod digest;
pub mod encode;
pub mod error;
pub mod operator;
pub mod points;
pub mod task;
pub mod wire;

pub use attestation::{AggregatedAttestation, NonSignerInfo, PartialSignature, TaskResponseData};
pub use digest::{task_content_digest, TaskDigest};
pub use encode::{canonical_uint_string, parse_uint_str};
pub use error::{AttestorError, Result};
pub use operator::{OperatorId, OperatorInfo};
pub use points::{G1Point, G2Point};
pub use task::{Task, TaskIndex, TaskParams};
pub use wire::{SignatureSubmission, WirePoint};
