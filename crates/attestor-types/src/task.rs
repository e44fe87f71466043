use crate::error::{AttestorError, Result};
use serde::{Deserialize, Serialize};

/// Chain-assigned, strictly increasing task identifier.
pub type TaskIndex = u32;

/// An attestation task as created on-chain. Immutable; identity is `index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub index: TaskIndex,
    pub metadata_url: String,
    pub creation_block: u64,
    pub quorum_numbers: Vec<u8>,
    pub quorum_threshold_percentages: Vec<u8>,
    pub timeout_ms: u64,
}

impl Task {
    /// Quorum lists must align and thresholds must be percentages.
    pub fn validate(&self) -> Result<()> {
        if self.quorum_numbers.is_empty() {
            return Err(AttestorError::Config(format!(
                "task {} lists no quorums",
                self.index
            )));
        }
        if self.quorum_numbers.len() != self.quorum_threshold_percentages.len() {
            return Err(AttestorError::Config(format!(
                "task {}: {} quorums but {} thresholds",
                self.index,
                self.quorum_numbers.len(),
                self.quorum_threshold_percentages.len()
            )));
        }
        if let Some(pct) = self
            .quorum_threshold_percentages
            .iter()
            .find(|&&pct| pct > 100)
        {
            return Err(AttestorError::Config(format!(
                "task {}: threshold {}% exceeds 100%",
                self.index, pct
            )));
        }
        Ok(())
    }

    /// Quorum number / required percentage pairs, in task order.
    pub fn quorum_requirements(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.quorum_numbers
            .iter()
            .copied()
            .zip(self.quorum_threshold_percentages.iter().copied())
    }
}

/// Publisher-side parameters for a new task; index and creation block are
/// assigned by the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskParams {
    pub metadata_url: String,
    pub quorum_numbers: Vec<u8>,
    pub quorum_threshold_percentages: Vec<u8>,
    pub timeout_ms: u64,
}

impl Default for TaskParams {
    fn default() -> Self {
        Self {
            metadata_url: "https://example.com/task".to_string(),
            quorum_numbers: vec![0],
            quorum_threshold_percentages: vec![100],
            timeout_ms: 60_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task() -> Task {
        Task {
            index: 1,
            metadata_url: "https://example.com".to_string(),
            creation_block: 10,
            quorum_numbers: vec![0, 1],
            quorum_threshold_percentages: vec![67, 100],
            timeout_ms: 60_000,
        }
    }

    #[test]
    fn test_validate() {
        assert!(task().validate().is_ok());

        let mut misaligned = task();
        misaligned.quorum_threshold_percentages = vec![67];
        assert!(misaligned.validate().is_err());

        let mut over = task();
        over.quorum_threshold_percentages = vec![67, 101];
        assert!(over.validate().is_err());

        let mut empty = task();
        empty.quorum_numbers.clear();
        empty.quorum_threshold_percentages.clear();
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_quorum_requirements_order() {
        let reqs: Vec<_> = task().quorum_requirements().collect();
        assert_eq!(reqs, vec![(0, 67), (1, 100)]);
    }
}
