//! In-memory chain and registry used by tests and devnet runs. The chain
//! mimics the task manager's replay protection: a second response for the
//! same task index reverts at gas estimation, exactly the failure mode the
//! responder is expected to discard.

use crate::client::ChainClient;
use crate::registry::StakeRegistry;
use crate::types::{NewTaskEvent, RespondCall, TaskCreatedReceipt, TxReceipt};
use async_trait::async_trait;
use attestor_types::{
    AttestorError, OperatorId, OperatorInfo, Result, Task, TaskIndex, TaskParams,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const BASE_RESPOND_GAS: u64 = 120_000;

#[derive(Default)]
struct ChainState {
    height: u64,
    events: Vec<NewTaskEvent>,
    responses: HashMap<TaskIndex, RespondCall>,
    sent_txs: u64,
    rpc_down: bool,
}

#[derive(Clone, Default)]
pub struct MemoryChain {
    state: Arc<RwLock<ChainState>>,
}

impl MemoryChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an RPC outage: every call fails with `ChainRpc` until
    /// restored.
    pub async fn set_rpc_down(&self, down: bool) {
        self.state.write().await.rpc_down = down;
    }

    pub async fn response_for(&self, task_index: TaskIndex) -> Option<RespondCall> {
        self.state.read().await.responses.get(&task_index).cloned()
    }

    pub async fn response_count(&self) -> usize {
        self.state.read().await.responses.len()
    }

    /// Advance the head without emitting events, as a quiet chain would.
    pub async fn mine_block(&self) -> u64 {
        let mut state = self.state.write().await;
        state.height += 1;
        state.height
    }

    fn ensure_up(state: &ChainState) -> Result<()> {
        if state.rpc_down {
            return Err(AttestorError::ChainRpc("connection refused".to_string()));
        }
        Ok(())
    }

    fn tx_hash(state: &ChainState) -> String {
        format!("0x{:064x}", state.sent_txs)
    }
}

#[async_trait]
impl ChainClient for MemoryChain {
    async fn block_number(&self) -> Result<u64> {
        let state = self.state.read().await;
        Self::ensure_up(&state)?;
        Ok(state.height)
    }

    async fn create_task(&self, params: &TaskParams) -> Result<TaskCreatedReceipt> {
        let mut state = self.state.write().await;
        Self::ensure_up(&state)?;

        state.height += 1;
        state.sent_txs += 1;
        let task = Task {
            index: state.events.len() as TaskIndex,
            metadata_url: params.metadata_url.clone(),
            creation_block: state.height,
            quorum_numbers: params.quorum_numbers.clone(),
            quorum_threshold_percentages: params.quorum_threshold_percentages.clone(),
            timeout_ms: params.timeout_ms,
        };
        task.validate()?;

        let block_number = state.height;
        state.events.push(NewTaskEvent {
            task: task.clone(),
            block_number,
        });
        Ok(TaskCreatedReceipt {
            task,
            tx_hash: Self::tx_hash(&state),
            block_number,
        })
    }

    async fn new_task_events(&self, from_block: u64, to_block: u64) -> Result<Vec<NewTaskEvent>> {
        let state = self.state.read().await;
        Self::ensure_up(&state)?;
        Ok(state
            .events
            .iter()
            .filter(|e| e.block_number >= from_block && e.block_number <= to_block)
            .cloned()
            .collect())
    }

    async fn estimate_respond_gas(&self, call: &RespondCall) -> Result<u64> {
        let state = self.state.read().await;
        Self::ensure_up(&state)?;

        let task_index = call.task_index();
        if task_index as usize >= state.events.len() {
            return Err(AttestorError::ChainRevert(format!(
                "unknown task {}",
                task_index
            )));
        }
        if state.responses.contains_key(&task_index) {
            return Err(AttestorError::ChainRevert(format!(
                "task {} already has a response",
                task_index
            )));
        }
        Ok(BASE_RESPOND_GAS + 5_000 * call.non_signer_pubkeys.len() as u64)
    }

    async fn transaction_count(&self) -> Result<u64> {
        let state = self.state.read().await;
        Self::ensure_up(&state)?;
        Ok(state.sent_txs)
    }

    async fn gas_price(&self) -> Result<u128> {
        let state = self.state.read().await;
        Self::ensure_up(&state)?;
        Ok(1_000_000_000)
    }

    async fn submit_response(
        &self,
        call: &RespondCall,
        _nonce: u64,
        _gas_price: u128,
    ) -> Result<TxReceipt> {
        let mut state = self.state.write().await;
        Self::ensure_up(&state)?;

        let task_index = call.task_index();
        if state.responses.contains_key(&task_index) {
            return Err(AttestorError::ChainRevert(format!(
                "task {} already has a response",
                task_index
            )));
        }
        state.height += 1;
        state.sent_txs += 1;
        state.responses.insert(task_index, call.clone());
        Ok(TxReceipt {
            tx_hash: Self::tx_hash(&state),
            block_number: state.height,
            confirmed_at: Utc::now(),
        })
    }
}

#[derive(Clone, Default)]
pub struct MemoryRegistry {
    operators: Arc<RwLock<HashMap<OperatorId, OperatorInfo>>>,
}

impl MemoryRegistry {
    pub fn new(operators: Vec<OperatorInfo>) -> Self {
        let map = operators
            .into_iter()
            .map(|info| (info.operator_id, info))
            .collect();
        Self {
            operators: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait]
impl StakeRegistry for MemoryRegistry {
    async fn operators_at_block(
        &self,
        quorum_numbers: &[u8],
        _block: u64,
    ) -> Result<Vec<OperatorInfo>> {
        let operators = self.operators.read().await;
        let mut matched: Vec<OperatorInfo> = operators
            .values()
            .filter(|info| quorum_numbers.iter().any(|&q| info.participates_in(q)))
            .cloned()
            .collect();
        // Deterministic snapshot ordering so bitmap indices are stable.
        matched.sort_by_key(|info| *info.operator_id.as_bytes());
        Ok(matched)
    }

    async fn operator_info(&self, operator_id: &OperatorId) -> Result<Option<OperatorInfo>> {
        Ok(self.operators.read().await.get(operator_id).cloned())
    }

    async fn ensure_registered(&self, info: OperatorInfo) -> Result<()> {
        self.operators
            .write()
            .await
            .entry(info.operator_id)
            .or_insert(info);
        Ok(())
    }
}
