use crate::task::TaskIndex;
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Content digest of a task, signed by every operator. Operators and the
/// aggregator must compute this identically or no signature ever matches.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskDigest([u8; 32]);

impl TaskDigest {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for TaskDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TaskDigest({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for TaskDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Canonical digest over `(task_index, metadata_url)`.
pub fn task_content_digest(index: TaskIndex, metadata_url: &str) -> TaskDigest {
    let mut hasher = Hasher::new();
    hasher.update(&index.to_be_bytes());
    hasher.update(metadata_url.as_bytes());
    TaskDigest(hasher.finalize().into())
}
