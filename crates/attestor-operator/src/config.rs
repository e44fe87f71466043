use attestor_types::{AttestorError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    pub operator: OperatorSettings,
    pub aggregator: AggregatorEndpoint,
    pub chain: ChainConfig,
    pub watcher: WatcherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorSettings {
    /// Hex-encoded BLS secret key file. Missing or undecodable material is
    /// fatal at startup.
    pub key_file: PathBuf,
    pub register_on_startup: bool,
    /// Stake this operator claims per quorum when self-registering on a
    /// devnet registry. Real registries ignore this and use delegations.
    #[serde(default)]
    pub stakes: HashMap<String, u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorEndpoint {
    /// Base URL of the aggregator's signature ingress.
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub backend: String,
    pub rpc_url: Option<String>,
    pub task_manager_address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    pub poll_interval_secs: u64,
    /// Fixed delay before each submission, so the aggregator's own task
    /// registration wins the race against our signature.
    pub submission_delay_ms: u64,
    /// Random extra delay on top, spreading many operators' submissions.
    pub submission_jitter_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            operator: OperatorSettings {
                key_file: PathBuf::from("./operator.blskey"),
                register_on_startup: false,
                stakes: HashMap::new(),
            },
            aggregator: AggregatorEndpoint {
                url: "http://127.0.0.1:8090".to_string(),
            },
            chain: ChainConfig {
                backend: "memory".to_string(),
                rpc_url: None,
                task_manager_address: None,
            },
            watcher: WatcherConfig {
                poll_interval_secs: 5,
                submission_delay_ms: 3_000,
                submission_jitter_ms: 500,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl OperatorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AttestorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| AttestorError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AttestorError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| AttestorError::Config(format!("cannot write {}: {}", path.display(), e)))
    }

    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("AGGREGATOR_URL") {
            self.aggregator.url = url;
        }
        if let Ok(key_file) = env::var("OPERATOR_KEY_FILE") {
            self.operator.key_file = PathBuf::from(key_file);
        }
        if let Ok(interval) = env::var("POLL_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.watcher.poll_interval_secs = secs;
            }
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.aggregator.url.is_empty() {
            return Err(AttestorError::Config(
                "aggregator.url is required".to_string(),
            ));
        }
        if self.watcher.poll_interval_secs == 0 {
            return Err(AttestorError::Config(
                "watcher.poll_interval_secs must be positive".to_string(),
            ));
        }
        match self.chain.backend.as_str() {
            "memory" => Ok(()),
            "rpc" if self.chain.rpc_url.is_none() => Err(AttestorError::Config(
                "chain.rpc_url is required for the rpc backend".to_string(),
            )),
            "rpc" => Ok(()),
            other => Err(AttestorError::Config(format!(
                "unknown chain backend '{}'",
                other
            ))),
        }
    }

    /// Stake table as quorum-number keyed map; bad keys are config errors.
    pub fn stake_per_quorum(&self) -> Result<HashMap<u8, u128>> {
        let mut stakes = HashMap::new();
        for (quorum, stake) in &self.operator.stakes {
            let quorum: u8 = quorum.parse().map_err(|_| {
                AttestorError::Config(format!("invalid quorum number '{}'", quorum))
            })?;
            stakes.insert(quorum, u128::from(*stake));
        }
        Ok(stakes)
    }
}
