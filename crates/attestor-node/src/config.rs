use attestor_crypto::operator_id_from_pubkey;
use attestor_types::{AttestorError, G1Point, G2Point, OperatorInfo, Result, TaskParams};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    pub node: NodeSettings,
    pub api: ApiConfig,
    pub chain: ChainConfig,
    pub publisher: PublisherConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeSettings {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// "memory" runs against the in-process devnet chain. Deployments with a
    /// real endpoint plug their own `ChainClient` at the entry point.
    pub backend: String,
    pub rpc_url: Option<String>,
    pub task_manager_address: Option<String>,
    pub registry_address: Option<String>,
    /// Static stake table for the memory backend.
    #[serde(default)]
    pub operators: Vec<OperatorEntry>,
}

/// One operator in the static devnet stake table: G1/G2 public keys as
/// decimal coordinate strings plus stake per quorum number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorEntry {
    pub pubkey_g1: [String; 2],
    pub pubkey_g2: [[String; 2]; 2],
    pub stakes: HashMap<String, u64>,
}

impl OperatorEntry {
    pub fn to_operator_info(&self) -> Result<OperatorInfo> {
        let pubkey_g1 = G1Point::from_coordinates(&self.pubkey_g1[0], &self.pubkey_g1[1])?;
        let pubkey_g2 = G2Point::new(
            [
                attestor_types::parse_uint_str(&self.pubkey_g2[0][0])?,
                attestor_types::parse_uint_str(&self.pubkey_g2[0][1])?,
            ],
            [
                attestor_types::parse_uint_str(&self.pubkey_g2[1][0])?,
                attestor_types::parse_uint_str(&self.pubkey_g2[1][1])?,
            ],
        );
        let mut stake_per_quorum = HashMap::new();
        for (quorum, stake) in &self.stakes {
            let quorum: u8 = quorum.parse().map_err(|_| {
                AttestorError::Config(format!("invalid quorum number '{}'", quorum))
            })?;
            stake_per_quorum.insert(quorum, u128::from(*stake));
        }
        Ok(OperatorInfo {
            operator_id: operator_id_from_pubkey(&pubkey_g1),
            pubkey_g1,
            pubkey_g2,
            stake_per_quorum,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublisherConfig {
    pub interval_secs: u64,
    pub metadata_url: String,
    pub quorum_numbers: Vec<u8>,
    pub quorum_threshold_percentages: Vec<u8>,
    pub task_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            node: NodeSettings {
                name: "attestor-aggregator".to_string(),
            },
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 8090,
            },
            chain: ChainConfig {
                backend: "memory".to_string(),
                rpc_url: None,
                task_manager_address: None,
                registry_address: None,
                operators: vec![],
            },
            publisher: PublisherConfig {
                interval_secs: 10,
                metadata_url: "https://example.com/task".to_string(),
                quorum_numbers: vec![0],
                quorum_threshold_percentages: vec![100],
                task_timeout_ms: 60_000,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }
}

impl AggregatorConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AttestorError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| AttestorError::Config(format!("invalid {}: {}", path.display(), e)))?;
        Ok(config)
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| AttestorError::Config(e.to_string()))?;
        std::fs::write(path, content)
            .map_err(|e| AttestorError::Config(format!("cannot write {}: {}", path.display(), e)))
    }

    /// Environment overrides, applied between file values and CLI flags.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = env::var("API_PORT") {
            if let Ok(port) = port.parse() {
                self.api.port = port;
            }
        }
        if let Ok(backend) = env::var("CHAIN_BACKEND") {
            self.chain.backend = backend;
        }
        if let Ok(url) = env::var("CHAIN_RPC_URL") {
            self.chain.rpc_url = Some(url);
        }
        if let Ok(interval) = env::var("PUBLISH_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.publisher.interval_secs = secs;
            }
        }
        if let Ok(timeout) = env::var("TASK_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.publisher.task_timeout_ms = ms;
            }
        }
        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Startup validation; failures here must refuse to start the process.
    pub fn validate(&self) -> Result<()> {
        if self.publisher.quorum_numbers.is_empty() {
            return Err(AttestorError::Config(
                "publisher.quorum_numbers must not be empty".to_string(),
            ));
        }
        if self.publisher.quorum_numbers.len() != self.publisher.quorum_threshold_percentages.len()
        {
            return Err(AttestorError::Config(
                "publisher quorum numbers and thresholds must align".to_string(),
            ));
        }
        if self
            .publisher
            .quorum_threshold_percentages
            .iter()
            .any(|&pct| pct > 100)
        {
            return Err(AttestorError::Config(
                "quorum thresholds are percentages, max 100".to_string(),
            ));
        }
        if self.publisher.interval_secs == 0 {
            return Err(AttestorError::Config(
                "publisher.interval_secs must be positive".to_string(),
            ));
        }
        match self.chain.backend.as_str() {
            "memory" => Ok(()),
            "rpc" => {
                if self.chain.rpc_url.is_none() {
                    return Err(AttestorError::Config(
                        "chain.rpc_url is required for the rpc backend".to_string(),
                    ));
                }
                if self.chain.task_manager_address.is_none() {
                    return Err(AttestorError::Config(
                        "chain.task_manager_address is required for the rpc backend".to_string(),
                    ));
                }
                Ok(())
            }
            other => Err(AttestorError::Config(format!(
                "unknown chain backend '{}'",
                other
            ))),
        }
    }

    pub fn task_params(&self) -> TaskParams {
        TaskParams {
            metadata_url: self.publisher.metadata_url.clone(),
            quorum_numbers: self.publisher.quorum_numbers.clone(),
            quorum_threshold_percentages: self.publisher.quorum_threshold_percentages.clone(),
            timeout_ms: self.publisher.task_timeout_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(AggregatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_misaligned_quorums_rejected() {
        let mut config = AggregatorConfig::default();
        config.publisher.quorum_numbers = vec![0, 1];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rpc_backend_requires_endpoint() {
        let mut config = AggregatorConfig::default();
        config.chain.backend = "rpc".to_string();
        assert!(config.validate().is_err());

        config.chain.rpc_url = Some("http://localhost:8545".to_string());
        config.chain.task_manager_address = Some("0x01".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let mut config = AggregatorConfig::default();
        config.chain.backend = "carrier-pigeon".to_string();
        assert!(matches!(
            config.validate(),
            Err(AttestorError::Config(_))
        ));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AggregatorConfig::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let back: AggregatorConfig = toml::from_str(&text).unwrap();
        assert_eq!(back.api.port, config.api.port);
        assert_eq!(back.publisher.quorum_numbers, config.publisher.quorum_numbers);
    }
}
