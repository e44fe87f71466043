//! Opaque elliptic-curve points as they travel through this system.
//!
//! The coordinates are plain big integers: curve membership and pairing
//! checks belong to the crypto collaborator, not to this crate. What this
//! crate owns is the wire shape (two decimal-string coordinates for G1,
//! two-element coordinate pairs for G2) and the shape validation the
//! responder performs before anything goes on-chain.

use crate::encode::parse_uint_str;
use crate::error::{AttestorError, Result};
use num_bigint::BigUint;
use num_traits::Zero;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BN254 base-field modulus; coordinates at or above it cannot come from a
/// serialized field element and are rejected as malformed.
static FQ_MODULUS: Lazy<BigUint> = Lazy::new(|| {
    BigUint::parse_bytes(
        b"21888242871839275222246405745257275088696311157297823662689037894645226208583",
        10,
    )
    .expect("modulus literal is valid decimal")
});

pub fn fq_modulus() -> &'static BigUint {
    &FQ_MODULUS
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct G1Point {
    #[serde(with = "biguint_dec")]
    pub x: BigUint,
    #[serde(with = "biguint_dec")]
    pub y: BigUint,
}

impl G1Point {
    pub fn new(x: BigUint, y: BigUint) -> Self {
        Self { x, y }
    }

    /// The identity element, used as the aggregate of an empty signer set.
    pub fn zero() -> Self {
        Self {
            x: BigUint::zero(),
            y: BigUint::zero(),
        }
    }

    pub fn is_zero(&self) -> bool {
        self.x.is_zero() && self.y.is_zero()
    }

    /// Parse a point from string-encoded coordinates (decimal, hex, or
    /// scientific notation).
    pub fn from_coordinates(x: &str, y: &str) -> Result<Self> {
        Ok(Self {
            x: parse_uint_str(x)?,
            y: parse_uint_str(y)?,
        })
    }

    /// Both coordinates fit in the base field. This is a shape check, not a
    /// curve-membership check.
    pub fn is_well_formed(&self) -> bool {
        self.x < *FQ_MODULUS && self.y < *FQ_MODULUS
    }

    /// Canonical integer-string coordinate tuple for transaction payloads.
    pub fn to_decimal(&self) -> (String, String) {
        (self.x.to_str_radix(10), self.y.to_str_radix(10))
    }
}

impl fmt::Debug for G1Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "G1Point(x={}, y={})", self.x, self.y)
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct G2Point {
    #[serde(with = "biguint_dec_pair")]
    pub x: [BigUint; 2],
    #[serde(with = "biguint_dec_pair")]
    pub y: [BigUint; 2],
}

impl G2Point {
    pub fn new(x: [BigUint; 2], y: [BigUint; 2]) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self {
            x: [BigUint::zero(), BigUint::zero()],
            y: [BigUint::zero(), BigUint::zero()],
        }
    }

    /// Every coordinate component fits in the base field.
    pub fn is_well_formed(&self) -> bool {
        self.x.iter().chain(self.y.iter()).all(|c| c < &*FQ_MODULUS)
    }

    /// Canonical integer-string coordinates, X pair then Y pair.
    pub fn to_decimal(&self) -> ([String; 2], [String; 2]) {
        (
            [self.x[0].to_str_radix(10), self.x[1].to_str_radix(10)],
            [self.y[0].to_str_radix(10), self.y[1].to_str_radix(10)],
        )
    }
}

impl fmt::Debug for G2Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "G2Point(x=[{}, {}], y=[{}, {}])",
            self.x[0], self.x[1], self.y[0], self.y[1]
        )
    }
}

mod biguint_dec {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &BigUint, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_str_radix(10))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<BigUint, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_uint_str(&s).map_err(serde::de::Error::custom)
    }
}

mod biguint_dec_pair {
    use super::*;
    use serde::{Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &[BigUint; 2], serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeSeq;
        let mut seq = serializer.serialize_seq(Some(2))?;
        seq.serialize_element(&value[0].to_str_radix(10))?;
        seq.serialize_element(&value[1].to_str_radix(10))?;
        seq.end()
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<[BigUint; 2], D::Error> {
        let parts: Vec<String> = Vec::deserialize(deserializer)?;
        if parts.len() != 2 {
            return Err(serde::de::Error::custom(AttestorError::MalformedSubmission(
                format!("expected two coordinate components, got {}", parts.len()),
            )));
        }
        Ok([
            parse_uint_str(&parts[0]).map_err(serde::de::Error::custom)?,
            parse_uint_str(&parts[1]).map_err(serde::de::Error::custom)?,
        ])
    }
}
