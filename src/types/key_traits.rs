use crate::crypto::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::types::{Fingerprint, KeyId, KeyVersion};

/// The shared lookup surface of public and secret key packets.
pub trait KeyDetails {
    fn version(&self) -> KeyVersion;

    fn algorithm(&self) -> PublicKeyAlgorithm;

    /// The hash of the canonical key material: MD5 for v2/v3 keys,
    /// SHA-1 for v4 keys.
    fn fingerprint(&self) -> Result<Fingerprint>;

    /// The low 64 bits of the fingerprint.
    fn key_id(&self) -> Result<KeyId> {
        Ok(self.fingerprint()?.key_id())
    }
}
