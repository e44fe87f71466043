//! OnChainResponder: drains the attestation channel and lands each one on
//! the task manager.
//!
//! Failures discard rather than retry: the contract rejects duplicate or
//! stale responses, so a blind retry would either no-op or make things
//! worse. Alerting on the error logs is the recovery path.

use attestor_chain::{ChainClient, RespondCall};
use attestor_types::{AggregatedAttestation, Result};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub struct OnChainResponder {
    chain: Arc<dyn ChainClient>,
    attestations: mpsc::UnboundedReceiver<AggregatedAttestation>,
}

impl OnChainResponder {
    pub fn new(
        chain: Arc<dyn ChainClient>,
        attestations: mpsc::UnboundedReceiver<AggregatedAttestation>,
    ) -> Self {
        Self {
            chain,
            attestations,
        }
    }

    /// Single consumer, emission order. Runs until the scheduler side of the
    /// channel closes.
    pub async fn run(mut self) {
        while let Some(attestation) = self.attestations.recv().await {
            let task_index = attestation.task_index;
            if let Err(e) = self.respond(&attestation).await {
                error!(task_index, error = %e, "Error submitting task response");
            }
        }
        debug!("Attestation channel closed, responder stopping");
    }

    pub async fn respond(&self, attestation: &AggregatedAttestation) -> Result<()> {
        let task_index = attestation.task_index;

        if !attestation.is_well_formed() {
            warn!(
                task_index,
                "Attestation failed point-shape validation, discarding"
            );
            return Ok(());
        }

        // Coordinates become canonical integer strings here; any scientific
        // notation from the crypto backend is normalized or rejected.
        let call = RespondCall::from_attestation(attestation)?;

        match self.chain.estimate_respond_gas(&call).await {
            Ok(gas) => debug!(task_index, gas, "Gas estimation successful"),
            Err(e) => {
                error!(
                    task_index,
                    error = %e,
                    "Gas estimation failed - likely contract revert, discarding attestation"
                );
                return Ok(());
            }
        }

        let nonce = self.chain.transaction_count().await?;
        let gas_price = self.chain.gas_price().await?;
        let receipt = self.chain.submit_response(&call, nonce, gas_price).await?;
        info!(
            task_index,
            tx_hash = %receipt.tx_hash,
            "Task response registered on-chain"
        );
        Ok(())
    }
}
