use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, SubsecRound, TimeZone, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Literal Data Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.9>
#[derive(Clone, PartialEq, Eq)]
pub struct LiteralData {
    mode: DataMode,
    /// The filename, may contain non utf-8 bytes
    file_name: Vec<u8>,
    created: DateTime<Utc>,
    data: Vec<u8>,
}

#[derive(Debug, Copy, Clone, FromPrimitive, IntoPrimitive, PartialEq, Eq)]
#[repr(u8)]
pub enum DataMode {
    Binary = b'b',
    Text = b't',
    Utf8 = b'u',

    #[num_enum(catch_all)]
    Other(u8),
}

impl LiteralData {
    /// Creates a literal data packet from the given string.
    pub fn from_str(file_name: impl Into<Vec<u8>>, raw_data: &str) -> Self {
        LiteralData {
            mode: DataMode::Text,
            file_name: file_name.into(),
            created: Utc::now().trunc_subsecs(0),
            data: raw_data.as_bytes().to_vec(),
        }
    }

    /// Creates a literal data packet from the given bytes.
    pub fn from_bytes(file_name: impl Into<Vec<u8>>, data: Vec<u8>) -> Self {
        LiteralData {
            mode: DataMode::Binary,
            file_name: file_name.into(),
            created: Utc::now().trunc_subsecs(0),
            data,
        }
    }

    /// Parses a `LiteralData` packet body.
    pub fn from_buf<B: Buf>(data: &mut B) -> Result<Self> {
        let mode = data.read_u8().map(DataMode::from)?;

        let name_len = data.read_u8()?;
        let name = data.read_take(name_len.into())?;

        let created = data.read_be_u32()?;
        let created = Utc
            .timestamp_opt(created.into(), 0)
            .single()
            .ok_or_else(|| format_err!("invalid created field"))?;

        let data = data.rest();

        Ok(LiteralData {
            mode,
            file_name: name,
            created,
            data,
        })
    }

    pub fn mode(&self) -> DataMode {
        self.mode
    }

    pub fn is_binary(&self) -> bool {
        matches!(self.mode, DataMode::Binary)
    }

    pub fn file_name(&self) -> &[u8] {
        &self.file_name
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Extracts the raw data.
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

impl AsRef<[u8]> for LiteralData {
    #[inline]
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl Serialize for LiteralData {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.mode.into())?;
        writer.write_u8(self.file_name.len().try_into()?)?;
        writer.write_all(&self.file_name)?;
        writer.write_u32::<BigEndian>(self.created.timestamp().try_into()?)?;
        writer.write_all(&self.data)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        1 + 1 + self.file_name.len() + 4 + self.data.len()
    }
}

impl std::fmt::Debug for LiteralData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiteralData")
            .field("mode", &self.mode)
            .field("created", &self.created)
            .field("file_name", &String::from_utf8_lossy(&self.file_name))
            .field("data", &hex::encode(&self.data))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip() {
        let literal = LiteralData::from_str("hello.txt", "hello world");
        assert!(!literal.is_binary());

        let bytes = literal.to_bytes().unwrap();
        assert_eq!(bytes.len(), literal.write_len());

        let back = LiteralData::from_buf(&mut &bytes[..]).unwrap();
        assert_eq!(literal, back);
    }

    #[test]
    fn test_binary_mode() {
        let literal = LiteralData::from_bytes("", vec![0, 1, 2, 255]);
        assert!(literal.is_binary());
        assert_eq!(literal.data(), &[0, 1, 2, 255]);
    }
}
