//! Canonical serialization of packet bodies and wire values.

use std::io;

use crate::errors::Result;

/// Types with a canonical byte encoding.
///
/// `write_len` must report exactly the number of bytes `to_writer`
/// produces; packet headers rely on it to size their length fields
/// without a second serialization pass.
pub trait Serialize {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()>;

    /// The exact encoded length in bytes.
    fn write_len(&self) -> usize;

    fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(self.write_len());
        self.to_writer(&mut buf)?;
        debug_assert_eq!(buf.len(), self.write_len());

        Ok(buf)
    }
}

/// Sequences encode as the concatenation of their elements. MPI lists and
/// subpacket areas carry no count of their own on the wire.
impl<T: Serialize> Serialize for Vec<T> {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        for item in self {
            item.to_writer(writer)?;
        }
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.iter().map(Serialize::write_len).sum()
    }
}
