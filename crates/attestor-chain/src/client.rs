use crate::types::{NewTaskEvent, RespondCall, TaskCreatedReceipt, TxReceipt};
use async_trait::async_trait;
use attestor_types::{Result, TaskParams};

/// The on-chain task manager, as this system sees it. Implementations may
/// fail transiently (`ChainRpc`) or permanently (`ChainRevert`); callers
/// decide per call site whether to retry next tick or discard.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current head block number.
    async fn block_number(&self) -> Result<u64>;

    /// Submit a `createTask` transaction and wait for confirmation. The
    /// returned receipt carries the chain-assigned task index.
    async fn create_task(&self, params: &TaskParams) -> Result<TaskCreatedReceipt>;

    /// `NewTaskCreated` events in `[from_block, to_block]`, both inclusive.
    async fn new_task_events(&self, from_block: u64, to_block: u64) -> Result<Vec<NewTaskEvent>>;

    /// Dry-run gas estimate for `respondToTask`. A `ChainRevert` here means
    /// the contract would reject the call (stale or duplicate response).
    async fn estimate_respond_gas(&self, call: &RespondCall) -> Result<u64>;

    /// Pending transaction count for the aggregator account (the nonce).
    async fn transaction_count(&self) -> Result<u64>;

    /// Current gas price in wei.
    async fn gas_price(&self) -> Result<u128>;

    /// Submit `respondToTask` with an explicit nonce and gas price.
    async fn submit_response(
        &self,
        call: &RespondCall,
        nonce: u64,
        gas_price: u128,
    ) -> Result<TxReceipt>;
}
