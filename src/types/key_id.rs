use std::fmt;

use crate::errors::Result;

/// Represents a Key ID: the low 64 bits of a fingerprint.
/// The all-zero value is the wildcard, matching any key.
#[derive(Clone, Copy, Eq, PartialEq, Hash)]
pub struct KeyId([u8; 8]);

impl KeyId {
    pub const WILDCARD: KeyId = KeyId([0u8; 8]);

    pub fn from_slice(input: &[u8]) -> Result<KeyId> {
        ensure_eq!(input.len(), 8, "invalid input length");
        let mut r = [0u8; 8];
        r.copy_from_slice(input);

        Ok(KeyId(r))
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == [0u8; 8]
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }
}

impl AsRef<[u8]> for KeyId {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", hex::encode(self.as_ref()))
    }
}

impl fmt::LowerHex for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.as_ref()))
    }
}

impl fmt::UpperHex for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode_upper(self.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_id() {
        let id = KeyId::from_slice(&[0xCA, 0xFE, 0xBA, 0xBE, 0x12, 0x34, 0x56, 0x78]).unwrap();
        assert!(!id.is_wildcard());
        assert_eq!(format!("{id:X}"), "CAFEBABE12345678");
        assert_eq!(format!("{id:x}"), "cafebabe12345678");

        assert!(KeyId::WILDCARD.is_wildcard());
        assert!(KeyId::from_slice(&[0u8; 7]).is_err());
    }
}
