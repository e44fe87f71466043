//! Deterministic arithmetic stand-in for the BLS collaborator.
//!
//! Points are derived by hashing into the BN254 base field and aggregation
//! is coordinate-wise modular addition, so every bookkeeping path — signing,
//! per-quorum aggregate keys, non-signer complements — runs end-to-end with
//! stable, inspectable values. It is NOT a secure signature scheme and no
//! pairing verification exists here; production deployments bind a
//! pairing-backed `BlsScheme` instead.

use crate::keys::BlsSecretKey;
use crate::scheme::{BlsScheme, CryptoError, Result};
use attestor_types::points::fq_modulus;
use attestor_types::{G1Point, G2Point, TaskDigest};
use num_bigint::BigUint;

#[derive(Debug, Default, Clone)]
pub struct DevBls;

fn field_element(domain: &[u8], parts: &[&[u8]]) -> BigUint {
    let mut hasher = blake3::Hasher::new();
    hasher.update(domain);
    for part in parts {
        hasher.update(part);
    }
    BigUint::from_bytes_be(hasher.finalize().as_bytes()) % fq_modulus()
}

impl BlsScheme for DevBls {
    fn derive_public(&self, secret: &BlsSecretKey) -> (G1Point, G2Point) {
        let sk = secret.as_bytes();
        let g1 = G1Point::new(
            field_element(b"attestor-dev-pub-g1-x", &[sk]),
            field_element(b"attestor-dev-pub-g1-y", &[sk]),
        );
        let g2 = G2Point::new(
            [
                field_element(b"attestor-dev-pub-g2-x0", &[sk]),
                field_element(b"attestor-dev-pub-g2-x1", &[sk]),
            ],
            [
                field_element(b"attestor-dev-pub-g2-y0", &[sk]),
                field_element(b"attestor-dev-pub-g2-y1", &[sk]),
            ],
        );
        (g1, g2)
    }

    fn sign(&self, secret: &BlsSecretKey, digest: &TaskDigest) -> G1Point {
        let sk = secret.as_bytes();
        let msg = digest.as_bytes();
        G1Point::new(
            field_element(b"attestor-dev-sig-x", &[sk, msg]),
            field_element(b"attestor-dev-sig-y", &[sk, msg]),
        )
    }

    fn aggregate_g1(&self, points: &[G1Point]) -> Result<G1Point> {
        if points.is_empty() {
            return Err(CryptoError::EmptyAggregation);
        }
        let modulus = fq_modulus();
        let mut acc = G1Point::zero();
        for p in points {
            acc.x = (acc.x + &p.x) % modulus;
            acc.y = (acc.y + &p.y) % modulus;
        }
        Ok(acc)
    }

    fn aggregate_g2(&self, points: &[G2Point]) -> Result<G2Point> {
        if points.is_empty() {
            return Err(CryptoError::EmptyAggregation);
        }
        let modulus = fq_modulus();
        let mut acc = G2Point::zero();
        for p in points {
            for i in 0..2 {
                acc.x[i] = (std::mem::take(&mut acc.x[i]) + &p.x[i]) % modulus;
                acc.y[i] = (std::mem::take(&mut acc.y[i]) + &p.y[i]) % modulus;
            }
        }
        Ok(acc)
    }
}
