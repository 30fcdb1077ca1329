use std::io;

use bytes::Buf;
use num_enum::{FromPrimitive, IntoPrimitive};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;

const EXPBIAS: u32 = 6;

/// String-To-Key specifier, converting a passphrase into a symmetric key.
/// Ref: <https://tools.ietf.org/html/rfc4880#section-3.7>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringToKey {
    typ: StringToKeyType,
    hash: HashAlgorithm,
    salt: Option<Vec<u8>>,
    count: Option<u8>,
}

/// Available String-To-Key types
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum StringToKeyType {
    Simple = 0,
    Salted = 1,
    Reserved = 2,
    IteratedAndSalted = 3,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for StringToKeyType {
    fn default() -> Self {
        Self::IteratedAndSalted
    }
}

/// Has the given s2k type a salt?
fn has_salt(typ: StringToKeyType) -> bool {
    matches!(
        typ,
        StringToKeyType::Salted | StringToKeyType::IteratedAndSalted
    )
}

/// Has the given s2k type a count?
fn has_count(typ: StringToKeyType) -> bool {
    matches!(typ, StringToKeyType::IteratedAndSalted)
}

impl StringToKey {
    pub fn new_default<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        StringToKey::new_iterated(rng, HashAlgorithm::default(), 224)
    }

    pub fn new_iterated<R: CryptoRng + Rng>(rng: &mut R, hash: HashAlgorithm, count: u8) -> Self {
        let mut salt = vec![0u8; 8];
        rng.fill(&mut salt[..]);

        StringToKey {
            typ: StringToKeyType::IteratedAndSalted,
            hash,
            salt: Some(salt),
            count: Some(count),
        }
    }

    pub fn new_simple(hash: HashAlgorithm) -> Self {
        StringToKey {
            typ: StringToKeyType::Simple,
            hash,
            salt: None,
            count: None,
        }
    }

    /// Converts a coded count into the count.
    /// Ref: <https://tools.ietf.org/html/rfc4880#section-3.7.1.3>
    pub fn count(&self) -> Option<usize> {
        self.count
            .map(|c| ((16u32 + u32::from(c & 15)) << (u32::from(c >> 4) + EXPBIAS)) as usize)
    }

    pub fn salt(&self) -> Option<&[u8]> {
        self.salt.as_deref()
    }

    pub fn hash(&self) -> HashAlgorithm {
        self.hash
    }

    pub fn typ(&self) -> StringToKeyType {
        self.typ
    }

    /// Derive `key_size` bytes of key material from the passphrase.
    /// Ref: <https://tools.ietf.org/html/rfc4880#section-3.7.1>
    pub fn derive_key(&self, passphrase: &str, key_size: usize) -> Result<Zeroizing<Vec<u8>>> {
        let digest_size = self.hash.digest_size();
        ensure!(digest_size > 0, "invalid hash algorithm {:?}", self.hash);

        let rounds = key_size.div_ceil(digest_size);
        let mut key = Zeroizing::new(Vec::with_capacity(key_size));

        for round in 0..rounds {
            let mut hasher = self.hash.new_hasher()?;

            // each round is prefixed with one more zero octet
            if round > 0 {
                hasher.update(&vec![0u8; round][..]);
            }

            match self.typ {
                StringToKeyType::Simple => {
                    hasher.update(passphrase.as_bytes());
                }
                StringToKeyType::Salted => {
                    let salt = self.salt.as_ref().ok_or_else(|| format_err!("missing salt"))?;
                    hasher.update(salt);
                    hasher.update(passphrase.as_bytes());
                }
                StringToKeyType::IteratedAndSalted => {
                    let salt = self.salt.as_ref().ok_or_else(|| format_err!("missing salt"))?;
                    let pw = passphrase.as_bytes();
                    let data_size = salt.len() + pw.len();
                    // how many bytes are supposed to be hashed
                    let mut count = self
                        .count()
                        .ok_or_else(|| format_err!("missing count"))?;

                    if count < data_size {
                        // if the count is less, hash one full set
                        count = data_size;
                    }

                    while count > data_size {
                        hasher.update(salt);
                        hasher.update(pw);
                        count -= data_size;
                    }

                    if count < salt.len() {
                        hasher.update(&salt[..count]);
                    } else {
                        hasher.update(salt);
                        count -= salt.len();
                        hasher.update(&pw[..count]);
                    }
                }
                _ => unsupported_err!("S2K {:?} is not available", self.typ),
            }

            let digest = hasher.finish();
            let missing = key_size - key.len();
            key.extend_from_slice(&digest[..missing.min(digest_size)]);
        }

        Ok(key)
    }

    /// Parses a string-to-key specifier from the given buffer.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let typ = StringToKeyType::from(i.read_u8()?);
        let hash = HashAlgorithm::from(i.read_u8()?);

        let salt = if has_salt(typ) {
            Some(i.read_take(8)?)
        } else {
            None
        };
        let count = if has_count(typ) {
            Some(i.read_u8()?)
        } else {
            None
        };

        Ok(StringToKey {
            typ,
            hash,
            salt,
            count,
        })
    }
}

impl Serialize for StringToKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&[u8::from(self.typ), u8::from(self.hash)])?;

        if let Some(ref salt) = self.salt {
            writer.write_all(salt)?;
        }

        if let Some(count) = self.count {
            writer.write_all(&[count])?;
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let mut sum = 2;
        if let Some(ref salt) = self.salt {
            sum += salt.len();
        }
        if self.count.is_some() {
            sum += 1;
        }
        sum
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn test_count_coding() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA1, 96);
        assert_eq!(s2k.count(), Some(65536));

        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA1, 255);
        assert_eq!(s2k.count(), Some(65011712));

        assert_eq!(StringToKey::new_simple(HashAlgorithm::SHA1).count(), None);
    }

    #[test]
    fn test_derive_key() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA1, 224);

        // requesting more bytes than one digest produces takes multiple rounds
        let key = s2k.derive_key("secret", 24).unwrap();
        assert_eq!(key.len(), 24);

        // deterministic, and a prefix of the longer expansion
        let again = s2k.derive_key("secret", 16).unwrap();
        assert_eq!(&key[..16], &again[..]);

        let other = s2k.derive_key("secret!", 24).unwrap();
        assert_ne!(key, other);
    }

    #[test]
    fn test_simple_s2k_is_plain_hash() {
        let s2k = StringToKey::new_simple(HashAlgorithm::SHA2_256);
        let key = s2k.derive_key("hunter2", 16).unwrap();
        let digest = HashAlgorithm::SHA2_256.digest(b"hunter2").unwrap();
        assert_eq!(&key[..], &digest[..16]);
    }

    #[test]
    fn test_roundtrip() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA2_256, 224);

        let bytes = s2k.to_bytes().unwrap();
        assert_eq!(bytes.len(), s2k.write_len());

        let back = StringToKey::from_buf(&mut &bytes[..]).unwrap();
        assert_eq!(s2k, back);
    }
}
