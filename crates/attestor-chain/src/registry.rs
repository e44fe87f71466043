use async_trait::async_trait;
use attestor_types::{OperatorId, OperatorInfo, Result};

/// Operator registry and stake table, as this system sees it.
#[async_trait]
pub trait StakeRegistry: Send + Sync {
    /// Snapshot of every operator holding stake in any of the given quorums,
    /// as of `block`. Stake weights in the result are the snapshot values.
    async fn operators_at_block(
        &self,
        quorum_numbers: &[u8],
        block: u64,
    ) -> Result<Vec<OperatorInfo>>;

    /// Look up one operator's registry entry.
    async fn operator_info(&self, operator_id: &OperatorId) -> Result<Option<OperatorInfo>>;

    /// Register the operator if it is not already present. Idempotent.
    async fn ensure_registered(&self, info: OperatorInfo) -> Result<()>;
}
