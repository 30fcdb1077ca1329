use aes::{Aes128, Aes192, Aes256};
use blowfish::Blowfish;
use cfb_mode::{BufDecryptor, BufEncryptor};
use cipher::{KeyInit, KeyIvInit};
use num_enum::{FromPrimitive, IntoPrimitive};
use rand::{CryptoRng, Rng};
use zeroize::Zeroizing;

use crate::errors::{Result, SessionKeyGenerationSnafu};

macro_rules! cfb_encrypt {
    ($mode:ident, $key:expr, $iv:expr, $data:expr) => {{
        let mut mode = BufEncryptor::<$mode>::new_from_slices($key, $iv)?;
        mode.encrypt($data);
    }};
}

macro_rules! cfb_decrypt {
    ($mode:ident, $key:expr, $iv:expr, $data:expr) => {{
        let mut mode = BufDecryptor::<$mode>::new_from_slices($key, $iv)?;
        mode.decrypt($data);
    }};
}

/// Available symmetric key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.2>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum SymmetricKeyAlgorithm {
    /// Plaintext or unencrypted data
    Plaintext = 0,
    /// Blowfish (128 bit key, 16 rounds)
    Blowfish = 4,
    AES128 = 7,
    AES192 = 8,
    AES256 = 9,

    #[num_enum(catch_all)]
    Other(u8),
}

impl Default for SymmetricKeyAlgorithm {
    fn default() -> Self {
        Self::AES128
    }
}

impl SymmetricKeyAlgorithm {
    /// The size of a single block in bytes.
    pub fn block_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Blowfish => 8,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 16,
            SymmetricKeyAlgorithm::AES256 => 16,
            _ => 0,
        }
    }

    /// The size of the key in bytes. Blowfish keys are fixed at 128 bits,
    /// the larger sizes RFC 4880 permits are not supported.
    pub fn key_size(self) -> usize {
        match self {
            SymmetricKeyAlgorithm::Blowfish => 16,
            SymmetricKeyAlgorithm::AES128 => 16,
            SymmetricKeyAlgorithm::AES192 => 24,
            SymmetricKeyAlgorithm::AES256 => 32,
            _ => 0,
        }
    }

    /// Encrypt in the OpenPGP CFB variant used for protected data packets.
    ///
    /// Prepends a block of random data followed by a repetition of its last
    /// two octets (the quick check), appends the bytes produced by `suffix`
    /// from the prefix and the plaintext, and encrypts the whole body in CFB
    /// mode with an all-zero IV. No resynchronization is performed.
    /// Ref: <https://tools.ietf.org/html/rfc4880.html#section-13.9>
    pub fn encrypt_protected<R, F>(
        self,
        rng: &mut R,
        key: &[u8],
        plaintext: &[u8],
        suffix: F,
    ) -> Result<Vec<u8>>
    where
        R: CryptoRng + Rng,
        F: FnOnce(&[u8], &[u8]) -> Result<Vec<u8>>,
    {
        let bs = self.block_size();
        ensure!(bs > 0, "{:?} can not encrypt", self);

        let mut prefix = vec![0u8; bs + 2];
        rng.fill_bytes(&mut prefix[..bs]);
        prefix[bs] = prefix[bs - 2];
        prefix[bs + 1] = prefix[bs - 1];

        let tail = suffix(&prefix, plaintext)?;

        let mut body = Vec::with_capacity(prefix.len() + plaintext.len() + tail.len());
        body.extend_from_slice(&prefix);
        body.extend_from_slice(plaintext);
        body.extend_from_slice(&tail);

        self.encrypt_with_iv(key, &vec![0u8; bs], &mut body)?;

        Ok(body)
    }

    /// Decrypt the OpenPGP CFB variant used for protected data packets.
    /// Overwrites the input, and returns the random prefix (including the two
    /// quick check octets) and the remaining plaintext as separate slices.
    pub fn decrypt_protected<'a>(
        self,
        key: &[u8],
        ciphertext: &'a mut [u8],
    ) -> Result<(&'a [u8], &'a [u8])> {
        let bs = self.block_size();
        ensure!(bs > 0, "{:?} can not decrypt", self);
        ensure!(ciphertext.len() > bs + 2, "ciphertext too short");

        self.decrypt_with_iv(key, &vec![0u8; bs], ciphertext)?;

        Ok(ciphertext.split_at(bs + 2))
    }

    /// Encrypt in regular CFB mode with an all-zero IV, without the OpenPGP
    /// prefix. Used for session keys protected by a string-to-key derived key.
    /// Overwrites the input.
    pub fn encrypt_simple(self, key: &[u8], plaintext: &mut [u8]) -> Result<()> {
        let bs = self.block_size();
        ensure!(bs > 0, "{:?} can not encrypt", self);
        self.encrypt_with_iv(key, &vec![0u8; bs], plaintext)
    }

    /// Decrypt in regular CFB mode with an all-zero IV, without the OpenPGP
    /// prefix. Overwrites the input.
    pub fn decrypt_simple(self, key: &[u8], ciphertext: &mut [u8]) -> Result<()> {
        let bs = self.block_size();
        ensure!(bs > 0, "{:?} can not decrypt", self);
        self.decrypt_with_iv(key, &vec![0u8; bs], ciphertext)
    }

    fn encrypt_with_iv(self, key: &[u8], iv: &[u8], plaintext: &mut [u8]) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::Blowfish => cfb_encrypt!(Blowfish, key, iv, plaintext),
            SymmetricKeyAlgorithm::AES128 => cfb_encrypt!(Aes128, key, iv, plaintext),
            SymmetricKeyAlgorithm::AES192 => cfb_encrypt!(Aes192, key, iv, plaintext),
            SymmetricKeyAlgorithm::AES256 => cfb_encrypt!(Aes256, key, iv, plaintext),
            _ => unsupported_err!("encryption with {:?}", self),
        }
        Ok(())
    }

    fn decrypt_with_iv(self, key: &[u8], iv: &[u8], ciphertext: &mut [u8]) -> Result<()> {
        match self {
            SymmetricKeyAlgorithm::Blowfish => cfb_decrypt!(Blowfish, key, iv, ciphertext),
            SymmetricKeyAlgorithm::AES128 => cfb_decrypt!(Aes128, key, iv, ciphertext),
            SymmetricKeyAlgorithm::AES192 => cfb_decrypt!(Aes192, key, iv, ciphertext),
            SymmetricKeyAlgorithm::AES256 => cfb_decrypt!(Aes256, key, iv, ciphertext),
            _ => unsupported_err!("decryption with {:?}", self),
        }
        Ok(())
    }

    /// Generate a new session key. Draws are rejected if the cipher can not
    /// be constructed from them, and generation gives up after 1000 attempts.
    pub fn new_session_key<R: CryptoRng + Rng>(self, rng: &mut R) -> Result<Zeroizing<Vec<u8>>> {
        for _ in 0..1000 {
            let mut key = Zeroizing::new(vec![0u8; self.key_size()]);
            rng.fill_bytes(&mut key);

            if self.valid_key(&key) {
                return Ok(key);
            }
        }

        Err(SessionKeyGenerationSnafu.build())
    }

    fn valid_key(self, key: &[u8]) -> bool {
        match self {
            SymmetricKeyAlgorithm::Blowfish => Blowfish::<byteorder::BigEndian>::new_from_slice(key).is_ok(),
            SymmetricKeyAlgorithm::AES128 => Aes128::new_from_slice(key).is_ok(),
            SymmetricKeyAlgorithm::AES192 => Aes192::new_from_slice(key).is_ok(),
            SymmetricKeyAlgorithm::AES256 => Aes256::new_from_slice(key).is_ok(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    macro_rules! roundtrip_protected {
        ($name:ident, $alg:path) => {
            #[test]
            fn $name() {
                let mut rng = ChaCha8Rng::seed_from_u64(0);

                let data = vec![2u8; 256];
                let key = vec![1u8; $alg.key_size()];

                let ciphertext = $alg
                    .encrypt_protected(&mut rng, &key, &data, |_, _| Ok(vec![0xAA, 0xBB]))
                    .unwrap();
                let bs = $alg.block_size();
                assert_eq!(ciphertext.len(), bs + 2 + data.len() + 2);
                assert_ne!(&ciphertext[bs + 2..bs + 2 + data.len()], &data[..]);

                let mut plaintext = ciphertext.clone();
                let (prefix, rest) = $alg.decrypt_protected(&key, &mut plaintext).unwrap();

                // quick check octets repeat the end of the random prefix
                assert_eq!(prefix[bs - 2], prefix[bs]);
                assert_eq!(prefix[bs - 1], prefix[bs + 1]);
                assert_eq!(&rest[..data.len()], &data[..]);
                assert_eq!(&rest[data.len()..], &[0xAA, 0xBB][..]);
            }
        };
    }

    roundtrip_protected!(roundtrip_protected_aes128, SymmetricKeyAlgorithm::AES128);
    roundtrip_protected!(roundtrip_protected_aes192, SymmetricKeyAlgorithm::AES192);
    roundtrip_protected!(roundtrip_protected_aes256, SymmetricKeyAlgorithm::AES256);
    roundtrip_protected!(roundtrip_protected_blowfish, SymmetricKeyAlgorithm::Blowfish);

    macro_rules! roundtrip_simple {
        ($name:ident, $alg:path) => {
            #[test]
            fn $name() {
                let data = vec![2u8; 100];
                let key = vec![1u8; $alg.key_size()];

                let mut ciphertext = data.clone();
                $alg.encrypt_simple(&key, &mut ciphertext).unwrap();
                assert_ne!(data, ciphertext);

                let mut plaintext = ciphertext.clone();
                $alg.decrypt_simple(&key, &mut plaintext).unwrap();
                assert_eq!(data, plaintext);
            }
        };
    }

    roundtrip_simple!(roundtrip_simple_aes128, SymmetricKeyAlgorithm::AES128);
    roundtrip_simple!(roundtrip_simple_aes192, SymmetricKeyAlgorithm::AES192);
    roundtrip_simple!(roundtrip_simple_aes256, SymmetricKeyAlgorithm::AES256);
    roundtrip_simple!(roundtrip_simple_blowfish, SymmetricKeyAlgorithm::Blowfish);

    #[test]
    fn test_session_key_generation() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);

        for alg in [
            SymmetricKeyAlgorithm::Blowfish,
            SymmetricKeyAlgorithm::AES128,
            SymmetricKeyAlgorithm::AES192,
            SymmetricKeyAlgorithm::AES256,
        ] {
            let key = alg.new_session_key(&mut rng).unwrap();
            assert_eq!(key.len(), alg.key_size());
        }

        assert!(SymmetricKeyAlgorithm::Plaintext
            .new_session_key(&mut rng)
            .is_err());
    }
}
