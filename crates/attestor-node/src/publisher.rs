use attestor_aggregation::SchedulerHandle;
use attestor_chain::{ChainClient, StakeRegistry};
use attestor_types::{Result, TaskIndex, TaskParams};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{info, warn};

/// Creates a new task on-chain at a fixed interval and registers it with the
/// aggregation scheduler. A failed tick is logged and skipped; the next tick
/// starts fresh rather than piling retries onto a wedged nonce.
pub struct TaskPublisher {
    chain: Arc<dyn ChainClient>,
    registry: Arc<dyn StakeRegistry>,
    scheduler: SchedulerHandle,
    params: TaskParams,
    interval: Duration,
}

impl TaskPublisher {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        registry: Arc<dyn StakeRegistry>,
        scheduler: SchedulerHandle,
        params: TaskParams,
        interval: Duration,
    ) -> Self {
        Self {
            chain,
            registry,
            scheduler,
            params,
            interval,
        }
    }

    pub async fn run(self) {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.publish_once().await {
                warn!(error = %e, "Task publication failed, skipping this tick");
            }
        }
    }

    /// One tick: create the task, wait for confirmation, snapshot the
    /// expected signers at the creation block, open aggregation.
    pub async fn publish_once(&self) -> Result<TaskIndex> {
        let receipt = self.chain.create_task(&self.params).await?;
        let task = receipt.task;
        let index = task.index;
        info!(
            task_index = index,
            tx_hash = %receipt.tx_hash,
            creation_block = task.creation_block,
            "New task created on-chain"
        );

        let expected_signers = self
            .registry
            .operators_at_block(&task.quorum_numbers, task.creation_block)
            .await?;
        self.scheduler.register_task(task, expected_signers).await?;
        Ok(index)
    }
}
