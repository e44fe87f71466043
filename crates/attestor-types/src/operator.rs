use crate::points::{G1Point, G2Point};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperatorId([u8; 32]);

impl OperatorId {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Accepts with or without a `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s)?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OperatorId({}...)", &self.to_hex()[..8])
    }
}

impl fmt::Display for OperatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Registry snapshot entry for one expected signer: identity, public keys,
/// and stake weight per quorum it participates in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorInfo {
    pub operator_id: OperatorId,
    pub pubkey_g1: G1Point,
    pub pubkey_g2: G2Point,
    pub stake_per_quorum: HashMap<u8, u128>,
}

impl OperatorInfo {
    pub fn stake_on(&self, quorum: u8) -> u128 {
        self.stake_per_quorum.get(&quorum).copied().unwrap_or(0)
    }

    pub fn participates_in(&self, quorum: u8) -> bool {
        self.stake_on(quorum) > 0
    }
}
