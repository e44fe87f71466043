use crate::api;
use crate::config::AggregatorConfig;
use crate::publisher::TaskPublisher;
use crate::responder::OnChainResponder;
use anyhow::Result;
use attestor_aggregation::{AggregationScheduler, SchedulerHandle};
use attestor_chain::{ChainClient, MemoryChain, MemoryRegistry, StakeRegistry};
use attestor_crypto::{BlsScheme, DevBls};
use attestor_types::AttestorError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::info;

/// The aggregator process: scheduler actor, signature ingress, task
/// publisher, and on-chain responder, wired from one config. Collaborators
/// (chain, registry, crypto) are constructed at the entry point and injected
/// here, never reached for globally.
pub struct AggregatorNode {
    config: AggregatorConfig,
    chain: Arc<dyn ChainClient>,
    registry: Arc<dyn StakeRegistry>,
    scheme: Arc<dyn BlsScheme>,
}

impl AggregatorNode {
    /// Build from config alone. Only the in-process memory backend can be
    /// constructed here; a deployment with a real chain endpoint injects its
    /// client through [`AggregatorNode::with_collaborators`].
    pub fn from_config(config: AggregatorConfig) -> Result<Self> {
        config.validate()?;
        match config.chain.backend.as_str() {
            "memory" => {
                let operators = config
                    .chain
                    .operators
                    .iter()
                    .map(|entry| entry.to_operator_info())
                    .collect::<attestor_types::Result<Vec<_>>>()?;
                info!(
                    operators = operators.len(),
                    "Using in-memory chain backend"
                );
                let chain = Arc::new(MemoryChain::new());
                let registry = Arc::new(MemoryRegistry::new(operators));
                Ok(Self::with_collaborators(config, chain, registry, Arc::new(DevBls)))
            }
            other => Err(AttestorError::Config(format!(
                "chain backend '{}' requires an injected ChainClient",
                other
            ))
            .into()),
        }
    }

    pub fn with_collaborators(
        config: AggregatorConfig,
        chain: Arc<dyn ChainClient>,
        registry: Arc<dyn StakeRegistry>,
        scheme: Arc<dyn BlsScheme>,
    ) -> Self {
        Self {
            config,
            chain,
            registry,
            scheme,
        }
    }

    /// Spawn every long-lived activity. The caller owns the handles and
    /// decides when to shut down.
    pub fn start(self) -> NodeHandles {
        let (scheduler, attestation_rx, scheduler_join) =
            AggregationScheduler::spawn(self.scheme);

        let api = api::start_api_server(
            scheduler.clone(),
            self.config.api.host.clone(),
            self.config.api.port,
        );

        let publisher = TaskPublisher::new(
            self.chain.clone(),
            self.registry.clone(),
            scheduler.clone(),
            self.config.task_params(),
            Duration::from_secs(self.config.publisher.interval_secs),
        );
        let publisher_join = tokio::spawn(publisher.run());

        let responder = OnChainResponder::new(self.chain.clone(), attestation_rx);
        let responder_join = tokio::spawn(responder.run());

        info!(
            name = %self.config.node.name,
            api_port = self.config.api.port,
            publish_interval_secs = self.config.publisher.interval_secs,
            "Aggregator started"
        );

        NodeHandles {
            scheduler,
            api,
            publisher: publisher_join,
            responder: responder_join,
            scheduler_join,
        }
    }
}

pub struct NodeHandles {
    pub scheduler: SchedulerHandle,
    api: JoinHandle<()>,
    publisher: JoinHandle<()>,
    responder: JoinHandle<()>,
    scheduler_join: JoinHandle<()>,
}

impl NodeHandles {
    pub fn abort(&self) {
        self.api.abort();
        self.publisher.abort();
        self.responder.abort();
        self.scheduler_join.abort();
    }
}
