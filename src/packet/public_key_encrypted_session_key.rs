use std::fmt;
use std::io;

use bytes::Buf;

use crate::crypto::PublicKeyAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{KeyId, Mpi};

/// Public Key Encrypted Session Key Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.1>
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKeyEncryptedSessionKey {
    version: u8,
    id: KeyId,
    algorithm: PublicKeyAlgorithm,
    mpis: Vec<Mpi>,
}

impl PublicKeyEncryptedSessionKey {
    pub fn new(id: KeyId, algorithm: PublicKeyAlgorithm, mpis: Vec<Mpi>) -> Self {
        PublicKeyEncryptedSessionKey {
            version: 3,
            id,
            algorithm,
            mpis,
        }
    }

    /// Parses a `PublicKeyEncryptedSessionKey` packet body.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = i.read_u8()?;
        ensure_eq!(version, 3, "invalid version");

        let id = KeyId::from_slice(&i.read_array::<8>()?)?;
        let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);

        let mut mpis = Vec::new();
        while i.has_remaining() {
            mpis.push(Mpi::from_buf(i)?);
        }

        Ok(PublicKeyEncryptedSessionKey {
            version,
            id,
            algorithm,
            mpis,
        })
    }

    pub fn id(&self) -> &KeyId {
        &self.id
    }

    pub fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    pub fn mpis(&self) -> &[Mpi] {
        &self.mpis
    }
}

impl Serialize for PublicKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version])?;
        writer.write_all(self.id.as_ref())?;
        writer.write_all(&[self.algorithm.into()])?;

        for mpi in &self.mpis {
            mpi.to_writer(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + 8 + 1 + self.mpis.write_len()
    }
}

impl fmt::Debug for PublicKeyEncryptedSessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublicKeyEncryptedSessionKey")
            .field("version", &self.version)
            .field("id", &self.id)
            .field("algorithm", &self.algorithm)
            .field("mpis", &self.mpis)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let pkesk = PublicKeyEncryptedSessionKey::new(
            KeyId::from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]).unwrap(),
            PublicKeyAlgorithm::RSA,
            vec![Mpi::from_slice(&[0x12, 0x34, 0x56])],
        );

        let bytes = pkesk.to_bytes().unwrap();
        assert_eq!(bytes.len(), pkesk.write_len());

        let back = PublicKeyEncryptedSessionKey::from_buf(&mut &bytes[..]).unwrap();
        assert_eq!(pkesk, back);
    }

    #[test]
    fn test_invalid_version() {
        assert!(
            PublicKeyEncryptedSessionKey::from_buf(
                &mut &[2u8, 1, 2, 3, 4, 5, 6, 7, 8, 1, 0, 0][..]
            )
            .is_err()
        );
    }
}
