use std::io;

use bytes::Buf;

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Modification Detection Code Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.14>
#[derive(Clone, PartialEq, Eq)]
pub struct ModDetectionCode {
    /// 20 byte SHA1 hash of the preceding plaintext data.
    hash: [u8; 20],
}

impl ModDetectionCode {
    pub fn new(hash: [u8; 20]) -> Self {
        ModDetectionCode { hash }
    }

    /// Parses a `ModDetectionCode` packet body.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let hash = i.read_array::<20>()?;
        Ok(ModDetectionCode { hash })
    }

    pub fn hash(&self) -> &[u8; 20] {
        &self.hash
    }
}

impl Serialize for ModDetectionCode {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.hash[..])?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.hash.len()
    }
}

impl std::fmt::Debug for ModDetectionCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ModDetectionCode({})", hex::encode(self.hash))
    }
}
