use std::io;

use bytes::Buf;

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Symmetrically Encrypted Integrity Protected Data Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.13>
///
/// Only version 1 payloads exist; the version octet is checked on parse and
/// never stored. The payload is `cipher-prefix || ciphertext || MDC` under
/// the OpenPGP CFB mode.
#[derive(Clone, PartialEq, Eq)]
pub struct SymEncryptedProtectedData {
    data: Vec<u8>,
}

impl SymEncryptedProtectedData {
    pub fn new(data: Vec<u8>) -> Self {
        SymEncryptedProtectedData { data }
    }

    /// Parses a `SymEncryptedProtectedData` packet body.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = i.read_u8()?;
        if version != 0x01 {
            unsupported_err!("encrypted data version {}", version);
        }

        Ok(SymEncryptedProtectedData { data: i.rest() })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn version(&self) -> u8 {
        1
    }
}

impl Serialize for SymEncryptedProtectedData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[0x01])?;
        writer.write_all(&self.data)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + self.data.len()
    }
}

impl std::fmt::Debug for SymEncryptedProtectedData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SymEncryptedProtectedData({} bytes)",
            self.data.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_check() {
        assert!(SymEncryptedProtectedData::from_buf(&mut &[0x01, 0xAA][..]).is_ok());
        // version 0 (no integrity protection) and anything newer is rejected
        assert!(SymEncryptedProtectedData::from_buf(&mut &[0x00, 0xAA][..]).is_err());
        assert!(SymEncryptedProtectedData::from_buf(&mut &[0x02, 0xAA][..]).is_err());
    }
}
