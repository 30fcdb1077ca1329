use std::fmt;
use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use num_bigint::BigUint;
use zeroize::Zeroize;

use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

/// Number of bits we accept when reading or writing MPIs.
/// The value is the same as gnupgs.
const MAX_EXTERN_MPI_BITS: u16 = 16384;

/// Represents an owned MPI value: the minimal big endian magnitude, ready to
/// be serialized behind its two octet bit count.
///
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-3.2>
#[derive(Default, Clone, PartialEq, Eq, Hash, Zeroize)]
pub struct Mpi(Vec<u8>);

impl Mpi {
    /// Represent the data in `raw` as an Mpi, stripping leading zeros.
    /// Note that `raw` is not expected to be length-prefixed.
    pub fn from_slice(raw: &[u8]) -> Self {
        Mpi(strip_leading_zeros(raw).to_vec())
    }

    /// Parses a length-prefixed MPI from the given buffer.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let len_bits = i.read_be_u16()?;
        ensure!(len_bits <= MAX_EXTERN_MPI_BITS, "mpi too long");

        let len_bytes = usize::from((len_bits + 7) >> 3);
        let n = i.read_take(len_bytes)?;

        Ok(Mpi::from_slice(&n))
    }

    /// The length of the magnitude in bytes, without the length prefix.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

/// Returns the bit length of a given slice.
#[inline]
fn bit_size(val: &[u8]) -> usize {
    if val.is_empty() {
        0
    } else {
        (val.len() * 8) - val[0].leading_zeros() as usize
    }
}

#[inline]
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    match bytes.iter().position(|b| b != &0) {
        Some(offset) => &bytes[offset..],
        None => &[],
    }
}

impl AsRef<[u8]> for Mpi {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Mpi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Mpi({})", hex::encode(&self.0))
    }
}

impl Serialize for Mpi {
    fn to_writer<W: io::Write>(&self, w: &mut W) -> Result<()> {
        w.write_u16::<BigEndian>(bit_size(&self.0) as u16)?;
        w.write_all(&self.0)?;

        Ok(())
    }

    fn write_len(&self) -> usize {
        2 + self.0.len()
    }
}

impl From<&BigUint> for Mpi {
    fn from(other: &BigUint) -> Self {
        Mpi::from_slice(&other.to_bytes_be())
    }
}

impl From<BigUint> for Mpi {
    fn from(other: BigUint) -> Self {
        Mpi::from(&other)
    }
}

impl From<&Mpi> for BigUint {
    fn from(other: &Mpi) -> Self {
        BigUint::from_bytes_be(&other.0)
    }
}
