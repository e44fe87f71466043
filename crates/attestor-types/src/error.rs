use crate::{OperatorId, TaskIndex};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AttestorError {
    #[error("Task {0} is already tracked or settled")]
    DuplicateTask(TaskIndex),

    #[error("Task {0} is not open for aggregation")]
    UnknownTask(TaskIndex),

    #[error("Operator {operator_id} already signed task {task_index}")]
    DuplicateSigner {
        task_index: TaskIndex,
        operator_id: OperatorId,
    },

    #[error("Operator {operator_id} is not an expected signer for task {task_index}")]
    UnknownSigner {
        task_index: TaskIndex,
        operator_id: OperatorId,
    },

    #[error("Malformed submission: {0}")]
    MalformedSubmission(String),

    #[error("Chain RPC error: {0}")]
    ChainRpc(String),

    #[error("Chain revert: {0}")]
    ChainRevert(String),

    #[error("Aggregation failed: {0}")]
    Aggregation(String),

    #[error("Key material error: {0}")]
    KeyMaterial(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for AttestorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AttestorError>;
