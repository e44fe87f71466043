//! OperatorWatcher: polls the chain for new tasks, signs each task's content
//! digest, and submits the partial signature to the aggregator's ingress.
//!
//! The block cursor only advances after a successful poll, so a transient
//! RPC failure neither skips nor double-counts events. Submissions are
//! delayed a few seconds so the aggregator's own task registration always
//! wins the race; a failed submission is logged and dropped — the missed
//! signature simply never counts toward quorum.

use attestor_chain::{ChainClient, NewTaskEvent};
use attestor_crypto::{BlsKeypair, BlsScheme};
use attestor_types::{task_content_digest, OperatorId, Result, SignatureSubmission};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

pub struct OperatorWatcher {
    chain: Arc<dyn ChainClient>,
    scheme: Arc<dyn BlsScheme>,
    keypair: BlsKeypair,
    operator_id: OperatorId,
    client: reqwest::Client,
    signature_url: String,
    poll_interval: Duration,
    submission_delay: Duration,
    submission_jitter: Duration,
    /// First block of the next poll window, inclusive.
    next_block: u64,
}

impl OperatorWatcher {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chain: Arc<dyn ChainClient>,
        scheme: Arc<dyn BlsScheme>,
        keypair: BlsKeypair,
        aggregator_url: &str,
        poll_interval: Duration,
        submission_delay: Duration,
        submission_jitter: Duration,
    ) -> Self {
        let operator_id = keypair.operator_id();
        Self {
            chain,
            scheme,
            keypair,
            operator_id,
            client: reqwest::Client::new(),
            signature_url: format!("{}/signature", aggregator_url.trim_end_matches('/')),
            poll_interval,
            submission_delay,
            submission_jitter,
            next_block: 0,
        }
    }

    pub fn operator_id(&self) -> OperatorId {
        self.operator_id
    }

    pub fn next_block(&self) -> u64 {
        self.next_block
    }

    pub async fn run(mut self) {
        info!(
            operator_id = %self.operator_id,
            url = %self.signature_url,
            "Operator watcher started"
        );
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            if let Err(e) = self.poll_once().await {
                warn!(error = %e, "Task polling failed, retrying next interval");
            }
        }
    }

    /// One poll window: `[next_block, head]`. The cursor moves only when the
    /// whole window was fetched successfully.
    pub async fn poll_once(&mut self) -> Result<usize> {
        let head = self.chain.block_number().await?;
        if head < self.next_block {
            return Ok(0);
        }

        let events = self.chain.new_task_events(self.next_block, head).await?;
        for event in &events {
            let submission = self.sign_event(event);
            info!(
                task_index = event.task.index,
                metadata_url = %event.task.metadata_url,
                "Signed new task, scheduling submission"
            );
            self.dispatch(submission);
        }

        self.next_block = head + 1;
        Ok(events.len())
    }

    /// Sign the canonical content digest of `(task_index, metadata_url)`.
    pub fn sign_event(&self, event: &NewTaskEvent) -> SignatureSubmission {
        let digest = task_content_digest(event.task.index, &event.task.metadata_url);
        let point = self.scheme.sign(self.keypair.secret(), &digest);
        SignatureSubmission::new(
            event.task.index,
            event.task.metadata_url.clone(),
            &point,
            event.block_number,
            self.operator_id,
        )
    }

    /// Deliver after the configured delay plus jitter. Failures are logged
    /// with full context and never retried.
    fn dispatch(&self, submission: SignatureSubmission) {
        let delay = self.submission_delay + self.random_jitter();
        let client = self.client.clone();
        let url = self.signature_url.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let task_id = submission.task_id.clone();
            match client.post(&url).json(&submission).send().await {
                Ok(response) if response.status().is_success() => {
                    info!(task_id = %task_id, "Signature accepted by aggregator");
                }
                Ok(response) => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    error!(
                        task_id = %task_id,
                        %status,
                        body = %body,
                        url = %url,
                        "Aggregator rejected signature"
                    );
                }
                Err(e) => {
                    error!(
                        task_id = %task_id,
                        error = %e,
                        url = %url,
                        "Failed to send signature to aggregator"
                    );
                }
            }
        });
    }

    fn random_jitter(&self) -> Duration {
        let jitter_ms = self.submission_jitter.as_millis() as u64;
        if jitter_ms == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::thread_rng().gen_range(0..=jitter_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attestor_chain::MemoryChain;
    use attestor_crypto::{BlsSecretKey, DevBls};
    use attestor_types::TaskParams;

    fn watcher(chain: Arc<MemoryChain>) -> OperatorWatcher {
        let scheme = Arc::new(DevBls);
        let keypair = BlsKeypair::from_secret(scheme.as_ref(), BlsSecretKey::from_bytes([7; 32]));
        OperatorWatcher::new(
            chain,
            scheme,
            keypair,
            "http://127.0.0.1:1", // never reached in these tests
            Duration::from_secs(5),
            Duration::from_millis(1),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_poll_advances_cursor_and_sees_each_event_once() {
        let chain = Arc::new(MemoryChain::new());
        let mut watcher = watcher(chain.clone());

        chain.create_task(&TaskParams::default()).await.unwrap();
        assert_eq!(watcher.poll_once().await.unwrap(), 1);

        // Nothing new: the same event is not observed twice.
        assert_eq!(watcher.poll_once().await.unwrap(), 0);

        chain.create_task(&TaskParams::default()).await.unwrap();
        assert_eq!(watcher.poll_once().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_rpc_failure_leaves_cursor_for_retry() {
        let chain = Arc::new(MemoryChain::new());
        let mut watcher = watcher(chain.clone());

        chain.create_task(&TaskParams::default()).await.unwrap();
        chain.set_rpc_down(true).await;
        assert!(watcher.poll_once().await.is_err());
        assert_eq!(watcher.next_block(), 0);

        // Once the RPC recovers, the missed event is still in the window.
        chain.set_rpc_down(false).await;
        assert_eq!(watcher.poll_once().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_signature_covers_the_task_digest() {
        let chain = Arc::new(MemoryChain::new());
        let watcher = watcher(chain.clone());

        let receipt = chain.create_task(&TaskParams::default()).await.unwrap();
        let event = NewTaskEvent {
            task: receipt.task.clone(),
            block_number: receipt.block_number,
        };

        let submission = watcher.sign_event(&event);
        let partial = submission.to_partial_signature().unwrap();
        assert_eq!(partial.task_index, receipt.task.index);
        assert_eq!(partial.operator_id, watcher.operator_id());

        let scheme = DevBls;
        let keypair =
            BlsKeypair::from_secret(&scheme, BlsSecretKey::from_bytes([7; 32]));
        let digest = task_content_digest(receipt.task.index, &receipt.task.metadata_url);
        assert_eq!(partial.point, scheme.sign(keypair.secret(), &digest));
    }
}
