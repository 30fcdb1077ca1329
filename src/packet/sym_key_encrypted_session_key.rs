use std::fmt;
use std::io;

use bytes::Buf;

use crate::crypto::SymmetricKeyAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::StringToKey;

/// Symmetric-Key Encrypted Session Key Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.3>
///
/// If `encrypted_key` is absent, the string-to-key derived key is used
/// directly as the session key for the declared symmetric algorithm.
#[derive(Clone, PartialEq, Eq)]
pub struct SymKeyEncryptedSessionKey {
    version: u8,
    sym_algorithm: SymmetricKeyAlgorithm,
    s2k: StringToKey,
    encrypted_key: Option<Vec<u8>>,
}

impl SymKeyEncryptedSessionKey {
    pub fn new(
        sym_algorithm: SymmetricKeyAlgorithm,
        s2k: StringToKey,
        encrypted_key: Option<Vec<u8>>,
    ) -> Self {
        SymKeyEncryptedSessionKey {
            version: 4,
            sym_algorithm,
            s2k,
            encrypted_key,
        }
    }

    /// Parses a `SymKeyEncryptedSessionKey` packet body.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = i.read_u8()?;
        ensure_eq!(version, 4, "invalid version");

        let sym_algorithm = SymmetricKeyAlgorithm::from(i.read_u8()?);
        let s2k = StringToKey::from_buf(i)?;

        let encrypted_key = if i.has_remaining() {
            Some(i.rest())
        } else {
            None
        };

        Ok(SymKeyEncryptedSessionKey {
            version,
            sym_algorithm,
            s2k,
            encrypted_key,
        })
    }

    pub fn sym_algorithm(&self) -> SymmetricKeyAlgorithm {
        self.sym_algorithm
    }

    pub fn s2k(&self) -> &StringToKey {
        &self.s2k
    }

    pub fn encrypted_key(&self) -> Option<&[u8]> {
        self.encrypted_key.as_deref()
    }
}

impl Serialize for SymKeyEncryptedSessionKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[self.version, self.sym_algorithm.into()])?;
        self.s2k.to_writer(writer)?;

        if let Some(ref encrypted_key) = self.encrypted_key {
            writer.write_all(encrypted_key)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let mut sum = 2 + self.s2k.write_len();
        if let Some(ref encrypted_key) = self.encrypted_key {
            sum += encrypted_key.len();
        }
        sum
    }
}

impl fmt::Debug for SymKeyEncryptedSessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymKeyEncryptedSessionKey")
            .field("version", &self.version)
            .field("sym_algorithm", &self.sym_algorithm)
            .field("s2k", &self.s2k)
            .field(
                "encrypted_key",
                &self.encrypted_key.as_ref().map(hex::encode),
            )
            .finish()
    }
}
