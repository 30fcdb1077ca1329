use std::io;

use bytes::Buf;
use byteorder::{BigEndian, WriteBytesExt};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

mod key;
mod literal_data;
mod mod_detection_code;
mod public_key_encrypted_session_key;
mod signature;
mod sym_encrypted_protected_data;
mod sym_key_encrypted_session_key;
mod user_id;

pub use self::key::{PlainSecretParams, PublicKey, PublicParams, SecretKey};
pub use self::literal_data::{DataMode, LiteralData};
pub use self::mod_detection_code::ModDetectionCode;
pub use self::public_key_encrypted_session_key::PublicKeyEncryptedSessionKey;
pub use self::signature::{
    Signature, SignatureConfig, SignatureType, SignatureVersion, Subpacket, SubpacketData,
    SubpacketType,
};
pub use self::sym_encrypted_protected_data::SymEncryptedProtectedData;
pub use self::sym_key_encrypted_session_key::SymKeyEncryptedSessionKey;
pub use self::user_id::UserId;

/// Packet tags.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.3>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum Tag {
    PublicKeyEncryptedSessionKey = 1,
    Signature = 2,
    SymKeyEncryptedSessionKey = 3,
    SecretKey = 5,
    PublicKey = 6,
    /// Symmetrically encrypted data without integrity protection. Not supported.
    SymEncryptedData = 9,
    LiteralData = 11,
    UserId = 13,
    SymEncryptedProtectedData = 18,
    ModDetectionCode = 19,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Sum of all packet types that may appear inside a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    PublicKeyEncryptedSessionKey(PublicKeyEncryptedSessionKey),
    Signature(Signature),
    SymKeyEncryptedSessionKey(SymKeyEncryptedSessionKey),
    PublicKey(PublicKey),
    LiteralData(LiteralData),
    UserId(UserId),
    SymEncryptedProtectedData(SymEncryptedProtectedData),
    ModDetectionCode(ModDetectionCode),
}

macro_rules! impl_packet_from {
    ($name:ident => $variant_type:ty) => {
        impl From<$variant_type> for Packet {
            fn from(other: $variant_type) -> Packet {
                Packet::$name(other)
            }
        }
    };
}

impl_packet_from!(PublicKeyEncryptedSessionKey => PublicKeyEncryptedSessionKey);
impl_packet_from!(Signature => Signature);
impl_packet_from!(SymKeyEncryptedSessionKey => SymKeyEncryptedSessionKey);
impl_packet_from!(PublicKey => PublicKey);
impl_packet_from!(LiteralData => LiteralData);
impl_packet_from!(UserId => UserId);
impl_packet_from!(SymEncryptedProtectedData => SymEncryptedProtectedData);
impl_packet_from!(ModDetectionCode => ModDetectionCode);

impl Packet {
    pub fn tag(&self) -> Tag {
        match self {
            Packet::PublicKeyEncryptedSessionKey(_) => Tag::PublicKeyEncryptedSessionKey,
            Packet::Signature(_) => Tag::Signature,
            Packet::SymKeyEncryptedSessionKey(_) => Tag::SymKeyEncryptedSessionKey,
            Packet::PublicKey(_) => Tag::PublicKey,
            Packet::LiteralData(_) => Tag::LiteralData,
            Packet::UserId(_) => Tag::UserId,
            Packet::SymEncryptedProtectedData(_) => Tag::SymEncryptedProtectedData,
            Packet::ModDetectionCode(_) => Tag::ModDetectionCode,
        }
    }

    fn body_len(&self) -> usize {
        match self {
            Packet::PublicKeyEncryptedSessionKey(p) => p.write_len(),
            Packet::Signature(p) => p.write_len(),
            Packet::SymKeyEncryptedSessionKey(p) => p.write_len(),
            Packet::PublicKey(p) => p.write_len(),
            Packet::LiteralData(p) => p.write_len(),
            Packet::UserId(p) => p.write_len(),
            Packet::SymEncryptedProtectedData(p) => p.write_len(),
            Packet::ModDetectionCode(p) => p.write_len(),
        }
    }

    fn body_to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        match self {
            Packet::PublicKeyEncryptedSessionKey(p) => p.to_writer(writer),
            Packet::Signature(p) => p.to_writer(writer),
            Packet::SymKeyEncryptedSessionKey(p) => p.to_writer(writer),
            Packet::PublicKey(p) => p.to_writer(writer),
            Packet::LiteralData(p) => p.to_writer(writer),
            Packet::UserId(p) => p.to_writer(writer),
            Packet::SymEncryptedProtectedData(p) => p.to_writer(writer),
            Packet::ModDetectionCode(p) => p.to_writer(writer),
        }
    }

    /// Parse a single packet, old or new format header.
    /// Ref: <https://tools.ietf.org/html/rfc4880.html#section-4.2>
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Packet> {
        let header = i.read_u8()?;
        ensure!(header & 0x80 != 0, "invalid packet header");

        let (tag, len) = if header & 0x40 != 0 {
            // new format
            let tag = Tag::from(header & 0x3f);
            let olen = i.read_u8()?;
            let len = match olen {
                0..=191 => usize::from(olen),
                192..=223 => ((usize::from(olen) - 192) << 8) + usize::from(i.read_u8()?) + 192,
                255 => i.read_be_u32()? as usize,
                _ => unsupported_err!("partial body lengths"),
            };
            (tag, len)
        } else {
            // old format
            let tag = Tag::from((header >> 2) & 0x0f);
            let len = match header & 0x03 {
                0 => usize::from(i.read_u8()?),
                1 => usize::from(i.read_be_u16()?),
                2 => i.read_be_u32()? as usize,
                _ => unsupported_err!("indeterminate packet length"),
            };
            (tag, len)
        };

        let body = i.read_take(len)?;
        let mut body = &body[..];

        let packet: Packet = match tag {
            Tag::PublicKeyEncryptedSessionKey => {
                PublicKeyEncryptedSessionKey::from_buf(&mut body)?.into()
            }
            Tag::Signature => Signature::from_buf(&mut body)?.into(),
            Tag::SymKeyEncryptedSessionKey => SymKeyEncryptedSessionKey::from_buf(&mut body)?.into(),
            Tag::PublicKey => PublicKey::from_buf(&mut body)?.into(),
            Tag::LiteralData => LiteralData::from_buf(&mut body)?.into(),
            Tag::UserId => UserId::from_buf(&mut body)?.into(),
            Tag::SymEncryptedProtectedData => SymEncryptedProtectedData::from_buf(&mut body)?.into(),
            Tag::ModDetectionCode => ModDetectionCode::from_buf(&mut body)?.into(),
            Tag::SymEncryptedData => {
                unsupported_err!("encrypted data without integrity protection")
            }
            Tag::SecretKey => unsupported_err!("secret key packets in messages"),
            Tag::Other(tag) => unsupported_err!("packet tag {}", tag),
        };

        ensure!(!body.has_remaining(), "packet contained trailing bytes");

        Ok(packet)
    }

    /// Parse a full sequence of packets.
    pub fn many_from_bytes(input: &[u8]) -> Result<Vec<Packet>> {
        let mut buf = input;
        let mut packets = Vec::new();

        while buf.has_remaining() {
            packets.push(Packet::from_buf(&mut buf)?);
        }

        Ok(packets)
    }
}

/// Packets always serialize with a new format header.
impl Serialize for Packet {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(0xC0 | u8::from(self.tag()))?;
        write_packet_length(self.body_len(), writer)?;
        self.body_to_writer(writer)
    }

    fn write_len(&self) -> usize {
        let body_len = self.body_len();
        1 + packet_length_len(body_len) + body_len
    }
}

/// Write a new format packet (or subpacket) length.
pub(crate) fn write_packet_length<W: io::Write>(len: usize, writer: &mut W) -> Result<()> {
    if len < 192 {
        writer.write_u8(len as u8)?;
    } else if len < 8384 {
        writer.write_u8((((len - 192) >> 8) + 192) as u8)?;
        writer.write_u8(((len - 192) & 0xFF) as u8)?;
    } else {
        writer.write_u8(255)?;
        writer.write_u32::<BigEndian>(len.try_into()?)?;
    }

    Ok(())
}

pub(crate) fn packet_length_len(len: usize) -> usize {
    if len < 192 {
        1
    } else if len < 8384 {
        2
    } else {
        5
    }
}
