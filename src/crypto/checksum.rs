use std::io;

use byteorder::{BigEndian, WriteBytesExt};

use crate::errors::{Error, Result};

/// Two octet checksum: sum of all octets mod 65536.
/// Used to validate decrypted session key material.
#[inline]
pub fn calculate_simple(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)))
}

/// Verify the two octet checksum at the start of `actual` against `data`.
#[inline]
pub fn simple(actual: &[u8], data: &[u8]) -> Result<()> {
    if actual.len() < 2 || actual[..2] != calculate_simple(data).to_be_bytes() {
        return Err(Error::InvalidChecksum);
    }

    Ok(())
}

#[inline]
pub fn simple_to_writer<W: io::Write>(data: &[u8], writer: &mut W) -> Result<()> {
    writer.write_u16::<BigEndian>(calculate_simple(data))?;
    Ok(())
}
