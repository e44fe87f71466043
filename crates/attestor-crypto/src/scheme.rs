//! The signing/aggregation seam.
//!
//! Point arithmetic and pairing checks live behind `BlsScheme`; the
//! aggregation core only ever asks for "sign this digest" and "fold these
//! points together". Production deployments bind a pairing-backed
//! implementation; tests and devnets use [`crate::DevBls`].

use crate::keys::BlsSecretKey;
use attestor_types::{G1Point, G2Point, TaskDigest};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("Cannot aggregate an empty point set")]
    EmptyAggregation,

    #[error("Key material error: {0}")]
    KeyMaterial(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;

pub trait BlsScheme: Send + Sync {
    /// Derive the G1 and G2 public keys for a secret key.
    fn derive_public(&self, secret: &BlsSecretKey) -> (G1Point, G2Point);

    /// Produce a partial signature over a task digest.
    fn sign(&self, secret: &BlsSecretKey, digest: &TaskDigest) -> G1Point;

    /// Combine partial signatures (or G1 public keys) into one point.
    fn aggregate_g1(&self, points: &[G1Point]) -> Result<G1Point>;

    /// Combine G2 public keys into the signers' aggregate public key.
    fn aggregate_g2(&self, points: &[G2Point]) -> Result<G2Point>;
}
