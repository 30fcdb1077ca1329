use std::fmt;
use std::io;

use byteorder::{BigEndian, ByteOrder, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, TimeZone, Utc};
use num_enum::{FromPrimitive, IntoPrimitive};

use crate::crypto::hash::Hasher;
use crate::crypto::{HashAlgorithm, PublicKeyAlgorithm};
use crate::errors::Result;
use crate::packet::{packet_length_len, write_packet_length};
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{KeyId, Mpi};

/// Available signature versions.
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum SignatureVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Available signature types.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum SignatureType {
    /// Signature of a binary document
    Binary = 0x00,
    /// Signature of a canonical text document
    Text = 0x01,
    Standalone = 0x02,
    CertGeneric = 0x10,
    CertPersona = 0x11,
    CertCasual = 0x12,
    CertPositive = 0x13,
    SubkeyBinding = 0x18,
    KeyBinding = 0x19,
    Key = 0x1F,
    KeyRevocation = 0x20,
    SubkeyRevocation = 0x28,
    CertRevocation = 0x30,
    Timestamp = 0x40,
    ThirdParty = 0x50,

    #[num_enum(catch_all)]
    Other(u8),
}

/// Available signature subpacket types.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-5.2.3.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum SubpacketType {
    SignatureCreationTime = 2,
    Issuer = 16,

    #[num_enum(catch_all)]
    Other(u8),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subpacket {
    pub is_critical: bool,
    pub data: SubpacketData,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubpacketData {
    SignatureCreationTime(DateTime<Utc>),
    Issuer(KeyId),
    /// Any other subpacket, carried as raw bytes.
    Other(u8, Vec<u8>),
}

impl Subpacket {
    pub fn new(data: SubpacketData) -> Self {
        Subpacket {
            is_critical: false,
            data,
        }
    }

    pub fn typ(&self) -> SubpacketType {
        match &self.data {
            SubpacketData::SignatureCreationTime(_) => SubpacketType::SignatureCreationTime,
            SubpacketData::Issuer(_) => SubpacketType::Issuer,
            SubpacketData::Other(typ, _) => SubpacketType::from(*typ),
        }
    }

    fn body_len(&self) -> usize {
        match &self.data {
            SubpacketData::SignatureCreationTime(_) => 4,
            SubpacketData::Issuer(_) => 8,
            SubpacketData::Other(_, body) => body.len(),
        }
    }
}

impl Serialize for Subpacket {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        // length covers the type octet and the body
        write_packet_length(1 + self.body_len(), writer)?;

        let mut typ = u8::from(self.typ());
        if self.is_critical {
            typ |= 0x80;
        }
        writer.write_u8(typ)?;

        match &self.data {
            SubpacketData::SignatureCreationTime(t) => {
                writer.write_u32::<BigEndian>(t.timestamp().try_into()?)?;
            }
            SubpacketData::Issuer(id) => {
                writer.write_all(id.as_ref())?;
            }
            SubpacketData::Other(_, body) => {
                writer.write_all(body)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let body_len = self.body_len();
        packet_length_len(1 + body_len) + 1 + body_len
    }
}

fn read_subpacket_length<B: Buf>(i: &mut B) -> Result<usize> {
    let olen = i.read_u8()?;
    let len = match olen {
        0..=191 => usize::from(olen),
        192..=254 => ((usize::from(olen) - 192) << 8) + usize::from(i.read_u8()?) + 192,
        255 => i.read_be_u32()? as usize,
    };

    Ok(len)
}

fn subpackets_from_buf<B: Buf>(i: &mut B) -> Result<Vec<Subpacket>> {
    let mut subpackets = Vec::new();

    while i.has_remaining() {
        let len = read_subpacket_length(i)?;
        ensure!(len >= 1, "invalid subpacket length");

        let typ = i.read_u8()?;
        let is_critical = typ & 0x80 != 0;
        let typ = typ & 0x7F;
        let body = i.read_take(len - 1)?;

        let data = match SubpacketType::from(typ) {
            SubpacketType::SignatureCreationTime => {
                ensure_eq!(body.len(), 4, "invalid creation time subpacket");
                let ts = BigEndian::read_u32(&body);
                let created = Utc
                    .timestamp_opt(ts.into(), 0)
                    .single()
                    .ok_or_else(|| format_err!("invalid creation time"))?;
                SubpacketData::SignatureCreationTime(created)
            }
            SubpacketType::Issuer => SubpacketData::Issuer(KeyId::from_slice(&body)?),
            SubpacketType::Other(typ) => SubpacketData::Other(typ, body),
        };

        subpackets.push(Subpacket { is_critical, data });
    }

    Ok(subpackets)
}

/// The hashable configuration of a signature: everything except the
/// signature values themselves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureConfig {
    pub version: SignatureVersion,
    pub typ: SignatureType,
    pub pub_alg: PublicKeyAlgorithm,
    pub hash_alg: HashAlgorithm,

    /// v2/v3 signatures only
    pub created: Option<DateTime<Utc>>,
    /// v2/v3 signatures only
    pub issuer_legacy: Option<KeyId>,

    pub hashed_subpackets: Vec<Subpacket>,
    pub unhashed_subpackets: Vec<Subpacket>,
}

impl SignatureConfig {
    pub fn new_v4(
        typ: SignatureType,
        pub_alg: PublicKeyAlgorithm,
        hash_alg: HashAlgorithm,
        hashed_subpackets: Vec<Subpacket>,
        unhashed_subpackets: Vec<Subpacket>,
    ) -> Self {
        SignatureConfig {
            version: SignatureVersion::V4,
            typ,
            pub_alg,
            hash_alg,
            created: None,
            issuer_legacy: None,
            hashed_subpackets,
            unhashed_subpackets,
        }
    }

    /// The key id of the issuing key, if one is recorded.
    pub fn issuer(&self) -> Option<&KeyId> {
        if let Some(ref issuer) = self.issuer_legacy {
            return Some(issuer);
        }

        self.hashed_subpackets
            .iter()
            .chain(self.unhashed_subpackets.iter())
            .find_map(|p| match &p.data {
                SubpacketData::Issuer(id) => Some(id),
                _ => None,
            })
    }

    pub fn created(&self) -> Option<&DateTime<Utc>> {
        if let Some(ref created) = self.created {
            return Some(created);
        }

        self.hashed_subpackets
            .iter()
            .find_map(|p| match &p.data {
                SubpacketData::SignatureCreationTime(t) => Some(t),
                _ => None,
            })
    }

    /// Feed the signature meta data into the hasher, after the signed
    /// content. Returns the number of bytes the v4 trailer counts.
    pub fn hash_signature_data(&self, hasher: &mut Box<dyn Hasher>) -> Result<usize> {
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                let created = self
                    .created
                    .ok_or_else(|| format_err!("missing creation time in v3 signature"))?;

                let mut buf = [0u8; 5];
                buf[0] = self.typ.into();
                BigEndian::write_u32(&mut buf[1..], created.timestamp().try_into()?);

                hasher.update(&buf);

                // no trailer
                Ok(0)
            }
            SignatureVersion::V4 => {
                let mut res = vec![
                    self.version.into(),
                    self.typ.into(),
                    self.pub_alg.into(),
                    self.hash_alg.into(),
                ];

                let mut hashed_subpackets = Vec::new();
                for packet in &self.hashed_subpackets {
                    packet.to_writer(&mut hashed_subpackets)?;
                }

                res.extend(u16::try_from(hashed_subpackets.len())?.to_be_bytes());
                res.extend(hashed_subpackets);

                hasher.update(&res);

                Ok(res.len())
            }
            SignatureVersion::Other(version) => {
                unsupported_err!("signature version {}", version)
            }
        }
    }

    /// The final trailer, hashed after the signature data.
    /// `len` is the length returned by [`hash_signature_data`].
    pub fn trailer(&self, len: usize) -> Result<Vec<u8>> {
        match self.version {
            SignatureVersion::V2 | SignatureVersion::V3 => Ok(Vec::new()),
            SignatureVersion::V4 => {
                let mut trailer = vec![0x04, 0xFF, 0, 0, 0, 0];
                BigEndian::write_u32(&mut trailer[2..], len.try_into()?);
                Ok(trailer)
            }
            SignatureVersion::Other(version) => {
                unsupported_err!("signature version {}", version)
            }
        }
    }
}

/// Signature Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.2>
#[derive(Clone, PartialEq, Eq)]
pub struct Signature {
    pub config: SignatureConfig,

    /// The high 16 bits of the signed hash. Informational only.
    pub signed_hash_value: [u8; 2],
    pub signature: Vec<Mpi>,
}

impl Signature {
    pub fn from_config(
        config: SignatureConfig,
        signed_hash_value: [u8; 2],
        signature: Vec<Mpi>,
    ) -> Self {
        Signature {
            config,
            signed_hash_value,
            signature,
        }
    }

    /// Returns what kind of signature this is.
    pub fn typ(&self) -> SignatureType {
        self.config.typ
    }

    pub fn issuer(&self) -> Option<&KeyId> {
        self.config.issuer()
    }

    /// Parses a `Signature` packet body.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = SignatureVersion::from(i.read_u8()?);

        let config = match version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                let hashed_len = i.read_u8()?;
                ensure_eq!(hashed_len, 5, "invalid hashed material length");

                let typ = SignatureType::from(i.read_u8()?);
                let created = i.read_be_u32()?;
                let created = Utc
                    .timestamp_opt(created.into(), 0)
                    .single()
                    .ok_or_else(|| format_err!("invalid creation time"))?;
                let issuer = KeyId::from_slice(&i.read_array::<8>()?)?;
                let pub_alg = PublicKeyAlgorithm::from(i.read_u8()?);
                let hash_alg = HashAlgorithm::from(i.read_u8()?);

                SignatureConfig {
                    version,
                    typ,
                    pub_alg,
                    hash_alg,
                    created: Some(created),
                    issuer_legacy: Some(issuer),
                    hashed_subpackets: Vec::new(),
                    unhashed_subpackets: Vec::new(),
                }
            }
            SignatureVersion::V4 => {
                let typ = SignatureType::from(i.read_u8()?);
                let pub_alg = PublicKeyAlgorithm::from(i.read_u8()?);
                let hash_alg = HashAlgorithm::from(i.read_u8()?);

                let hashed_len = i.read_be_u16()?;
                let hashed_area = i.read_take(hashed_len.into())?;
                let hashed_subpackets = subpackets_from_buf(&mut &hashed_area[..])?;

                let unhashed_len = i.read_be_u16()?;
                let unhashed_area = i.read_take(unhashed_len.into())?;
                let unhashed_subpackets = subpackets_from_buf(&mut &unhashed_area[..])?;

                SignatureConfig {
                    version,
                    typ,
                    pub_alg,
                    hash_alg,
                    created: None,
                    issuer_legacy: None,
                    hashed_subpackets,
                    unhashed_subpackets,
                }
            }
            SignatureVersion::Other(version) => {
                unsupported_err!("signature version {}", version)
            }
        };

        let signed_hash_value = i.read_array::<2>()?;

        let mut signature = Vec::new();
        while i.has_remaining() {
            signature.push(Mpi::from_buf(i)?);
        }

        Ok(Signature {
            config,
            signed_hash_value,
            signature,
        })
    }
}

impl Serialize for Signature {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.config.version.into())?;

        match self.config.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                let created = self
                    .config
                    .created
                    .ok_or_else(|| format_err!("missing creation time in v3 signature"))?;
                let issuer = self
                    .config
                    .issuer_legacy
                    .ok_or_else(|| format_err!("missing issuer in v3 signature"))?;

                writer.write_u8(5)?;
                writer.write_u8(self.config.typ.into())?;
                writer.write_u32::<BigEndian>(created.timestamp().try_into()?)?;
                writer.write_all(issuer.as_ref())?;
                writer.write_u8(self.config.pub_alg.into())?;
                writer.write_u8(self.config.hash_alg.into())?;
            }
            SignatureVersion::V4 => {
                writer.write_u8(self.config.typ.into())?;
                writer.write_u8(self.config.pub_alg.into())?;
                writer.write_u8(self.config.hash_alg.into())?;

                let hashed = self.config.hashed_subpackets.to_bytes()?;
                writer.write_u16::<BigEndian>(hashed.len().try_into()?)?;
                writer.write_all(&hashed)?;

                let unhashed = self.config.unhashed_subpackets.to_bytes()?;
                writer.write_u16::<BigEndian>(unhashed.len().try_into()?)?;
                writer.write_all(&unhashed)?;
            }
            SignatureVersion::Other(version) => {
                unsupported_err!("signature version {}", version)
            }
        }

        writer.write_all(&self.signed_hash_value)?;

        for mpi in &self.signature {
            mpi.to_writer(writer)?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let mut sum = 1;
        match self.config.version {
            SignatureVersion::V2 | SignatureVersion::V3 => {
                sum += 1 + 1 + 4 + 8 + 1 + 1;
            }
            _ => {
                sum += 3;
                sum += 2 + self.config.hashed_subpackets.write_len();
                sum += 2 + self.config.unhashed_subpackets.write_len();
            }
        }
        sum += 2;
        sum += self.signature.write_len();
        sum
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signature")
            .field("config", &self.config)
            .field("signed_hash_value", &hex::encode(self.signed_hash_value))
            .field("signature", &self.signature)
            .finish()
    }
}
