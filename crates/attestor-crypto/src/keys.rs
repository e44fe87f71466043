use crate::scheme::BlsScheme;
use attestor_types::{AttestorError, G1Point, G2Point, OperatorId, Result};
use rand::RngCore;
use std::fmt;
use std::path::Path;

/// 32-byte BLS secret scalar. Debug/Display never print the material.
#[derive(Clone, PartialEq, Eq)]
pub struct BlsSecretKey([u8; 32]);

impl BlsSecretKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl fmt::Debug for BlsSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BlsSecretKey(redacted)")
    }
}

/// A signing identity: secret scalar plus both public keys. The operator id
/// is derived from the G1 public key the same way the registry derives it.
#[derive(Debug, Clone)]
pub struct BlsKeypair {
    secret: BlsSecretKey,
    pub public_g1: G1Point,
    pub public_g2: G2Point,
}

impl BlsKeypair {
    pub fn from_secret(scheme: &dyn BlsScheme, secret: BlsSecretKey) -> Self {
        let (public_g1, public_g2) = scheme.derive_public(&secret);
        Self {
            secret,
            public_g1,
            public_g2,
        }
    }

    pub fn generate(scheme: &dyn BlsScheme) -> Self {
        Self::from_secret(scheme, BlsSecretKey::generate())
    }

    pub fn secret(&self) -> &BlsSecretKey {
        &self.secret
    }

    /// Registry-compatible operator id: hash of the G1 public key.
    pub fn operator_id(&self) -> OperatorId {
        operator_id_from_pubkey(&self.public_g1)
    }

    /// Load a hex-encoded secret key file. Key-store decryption is the
    /// deployment's concern; this reads already-decrypted material and any
    /// failure is fatal at startup.
    pub fn load_from_file(scheme: &dyn BlsScheme, path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            AttestorError::KeyMaterial(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        let bytes = hex::decode(content.trim()).map_err(|e| {
            AttestorError::KeyMaterial(format!("invalid hex in {}: {}", path.display(), e))
        })?;
        let bytes: [u8; 32] = bytes.try_into().map_err(|_| {
            AttestorError::KeyMaterial(format!("{}: expected 32 bytes", path.display()))
        })?;
        Ok(Self::from_secret(scheme, BlsSecretKey::from_bytes(bytes)))
    }

    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        std::fs::write(path, hex::encode(self.secret.as_bytes())).map_err(|e| {
            AttestorError::KeyMaterial(format!("cannot write key file {}: {}", path.display(), e))
        })
    }
}

/// Hash a G1 public key into the fixed-size operator identifier.
pub fn operator_id_from_pubkey(pubkey: &G1Point) -> OperatorId {
    let (x, y) = pubkey.to_decimal();
    let mut hasher = blake3::Hasher::new();
    hasher.update(x.as_bytes());
    hasher.update(b":");
    hasher.update(y.as_bytes());
    OperatorId::from_bytes(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DevBls;

    #[test]
    fn test_keypair_file_roundtrip() {
        let scheme = DevBls::default();
        let keypair = BlsKeypair::generate(&scheme);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operator.blskey");
        keypair.save_to_file(&path).unwrap();

        let loaded = BlsKeypair::load_from_file(&scheme, &path).unwrap();
        assert_eq!(loaded.secret(), keypair.secret());
        assert_eq!(loaded.public_g1, keypair.public_g1);
        assert_eq!(loaded.operator_id(), keypair.operator_id());
    }

    #[test]
    fn test_missing_key_file_is_key_material_error() {
        let scheme = DevBls::default();
        let err = BlsKeypair::load_from_file(&scheme, Path::new("/nonexistent/key")).unwrap_err();
        assert!(matches!(err, AttestorError::KeyMaterial(_)));
    }

    #[test]
    fn test_garbage_key_file_rejected() {
        let scheme = DevBls::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.blskey");
        std::fs::write(&path, "not hex at all").unwrap();
        assert!(BlsKeypair::load_from_file(&scheme, &path).is_err());
    }
}
