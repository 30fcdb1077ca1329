use std::io;

use bytes::Buf;

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// User ID Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.11>
#[derive(Clone, PartialEq, Eq)]
pub struct UserId {
    /// By convention UTF-8, but not all keys in the wild honor that.
    id: Vec<u8>,
}

impl UserId {
    pub fn from_str(id: &str) -> Self {
        UserId {
            id: id.as_bytes().to_vec(),
        }
    }

    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        Ok(UserId { id: i.rest() })
    }

    pub fn id(&self) -> &[u8] {
        &self.id
    }

    pub fn as_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.id)
    }
}

impl Serialize for UserId {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.id)?;
        Ok(())
    }

    fn write_len(&self) -> usize {
        self.id.len()
    }
}

impl std::fmt::Debug for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "UserId({:?})", self.as_str())
    }
}
