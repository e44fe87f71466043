pub mod dev;
pub mod keys;
pub mod scheme;

pub use dev::DevBls;
pub use keys::{operator_id_from_pubkey, BlsKeypair, BlsSecretKey};
pub use scheme::{BlsScheme, CryptoError};
