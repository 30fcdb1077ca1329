use std::fmt;

use crate::errors::Result;
use crate::types::{KeyId, KeyVersion};

/// Represents a Fingerprint.
///
/// OpenPGP fingerprints consist of two pieces of information:
/// the key version, and binary data that represents the fingerprint itself:
/// an MD5 digest for v2/v3 keys, a SHA-1 digest for v4 keys.
#[derive(Clone, Eq, Hash, PartialEq)]
pub enum Fingerprint {
    V2([u8; 16]),
    V3([u8; 16]),
    V4([u8; 20]),
}

impl Fingerprint {
    /// Constructor for an OpenPGP fingerprint.
    ///
    /// The length of the binary data in `fp` must match the expected length
    /// for `version`, otherwise an error is returned.
    pub fn new(version: KeyVersion, fp: &[u8]) -> Result<Self> {
        let e = |_| {
            format_err!(
                "illegal fingerprint length {} for key version {:?}",
                fp.len(),
                version
            )
        };

        let fp = match version {
            KeyVersion::V2 => Fingerprint::V2(fp.try_into().map_err(e)?),
            KeyVersion::V3 => Fingerprint::V3(fp.try_into().map_err(e)?),
            KeyVersion::V4 => Fingerprint::V4(fp.try_into().map_err(e)?),
            KeyVersion::Other(v) => unsupported_err!("key version {}", v),
        };

        Ok(fp)
    }

    /// Returns the length of the fingerprint's binary data, based on the key version.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        match self {
            Self::V2(_) | Self::V3(_) => 16,
            Self::V4(_) => 20,
        }
    }

    /// The key version of the key that this fingerprint references.
    pub fn version(&self) -> KeyVersion {
        match self {
            Self::V2(_) => KeyVersion::V2,
            Self::V3(_) => KeyVersion::V3,
            Self::V4(_) => KeyVersion::V4,
        }
    }

    /// The binary data of this fingerprint.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::V2(fp) | Self::V3(fp) => &fp[..],
            Self::V4(fp) => &fp[..],
        }
    }

    /// The key id: the trailing 8 bytes of the fingerprint.
    pub fn key_id(&self) -> KeyId {
        let bytes = self.as_bytes();
        KeyId::from_slice(&bytes[bytes.len() - 8..]).expect("fingerprints are at least 8 bytes")
    }

    /// Does the given key id reference this fingerprint?
    /// The wildcard key id matches everything.
    pub fn matches_key_id(&self, id: &KeyId) -> bool {
        id.is_wildcard() || self.as_bytes().ends_with(id.as_ref())
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

/// Fingerprints render as uppercase hex at the full width of the digest.
impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self))
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}

impl fmt::UpperHex for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self))
    }
}

impl fmt::LowerHex for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self))
    }
}
