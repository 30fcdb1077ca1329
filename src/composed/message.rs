use std::io;

use byteorder::{BigEndian, ByteOrder};
use chrono::{DateTime, Utc};
use log::debug;
use rand::{CryptoRng, Rng};
use sha1::{Digest, Sha1};
use zeroize::Zeroizing;

use crate::composed::find_key;
use crate::crypto::{checksum, HashAlgorithm, PublicKeyAlgorithm, SymmetricKeyAlgorithm};
use crate::errors::{NoMatchingPacketSnafu, Result};
use crate::packet::{
    LiteralData, ModDetectionCode, Packet, PublicKey, PublicKeyEncryptedSessionKey, SecretKey,
    Signature, SignatureConfig, SignatureType, Subpacket, SubpacketData,
    SymEncryptedProtectedData, UserId,
};
use crate::ser::Serialize;
use crate::types::{KeyDetails, KeyId};

/// An OpenPGP message: an ordered sequence of packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    packets: Vec<Packet>,
}

/// What a signature is computed over.
enum SigningTarget<'a> {
    Literal(&'a LiteralData),
    Certification { key: &'a PublicKey, id: &'a UserId },
}

impl Message {
    pub fn new(packets: Vec<Packet>) -> Self {
        Message { packets }
    }

    /// Parse a message from its canonical byte encoding.
    pub fn from_bytes(input: &[u8]) -> Result<Self> {
        Ok(Message {
            packets: Packet::many_from_bytes(input)?,
        })
    }

    pub fn packets(&self) -> &[Packet] {
        &self.packets
    }

    pub fn into_packets(self) -> Vec<Packet> {
        self.packets
    }

    /// The first literal data packet of the message, if any.
    pub fn literal(&self) -> Option<&LiteralData> {
        self.packets.iter().find_map(|p| match p {
            Packet::LiteralData(l) => Some(l),
            _ => None,
        })
    }

    /// All signature packets, in message order.
    pub fn signatures(&self) -> impl Iterator<Item = &Signature> {
        self.packets.iter().filter_map(|p| match p {
            Packet::Signature(s) => Some(s),
            _ => None,
        })
    }

    /// Create a signature over this message with the secret key matching `key_id`.
    ///
    /// Signs the first literal data packet if there is one, otherwise
    /// certifies the first public key and user id. An existing signature
    /// packet serves as a template for version, type and subpackets; without
    /// one a fresh v4 signature carrying creation time and issuer is built.
    pub fn sign<R: CryptoRng + Rng>(
        &self,
        rng: &mut R,
        keys: &[&SecretKey],
        hash_alg: HashAlgorithm,
        key_id: &KeyId,
        timestamp: DateTime<Utc>,
    ) -> Result<Signature> {
        let key = find_key(keys, key_id)
            .ok_or_else(|| format_err!("no matching secret key for {:?}", key_id))?;

        debug!("signing with a {:?} key", key.algorithm());

        let target = self.signing_target()?;

        let config = match self.signatures().next() {
            Some(template) => {
                let mut config = template.config.clone();
                config.pub_alg = key.algorithm();
                config.hash_alg = hash_alg;
                config
            }
            None => {
                let typ = match target {
                    SigningTarget::Literal(l) => {
                        if l.is_binary() {
                            SignatureType::Binary
                        } else {
                            SignatureType::Text
                        }
                    }
                    SigningTarget::Certification { .. } => SignatureType::CertPositive,
                };

                SignatureConfig::new_v4(
                    typ,
                    key.algorithm(),
                    hash_alg,
                    vec![
                        Subpacket::new(SubpacketData::SignatureCreationTime(timestamp)),
                        Subpacket::new(SubpacketData::Issuer(key.key_id()?)),
                    ],
                    vec![],
                )
            }
        };

        let mut hasher = hash_alg.new_hasher()?;
        match target {
            SigningTarget::Literal(l) => hasher.update(l.data()),
            SigningTarget::Certification { key, id } => {
                hasher.update(&key.fingerprint_material()?);

                let mut prefix = [0xB4, 0, 0, 0, 0];
                BigEndian::write_u32(&mut prefix[1..], id.id().len().try_into()?);
                hasher.update(&prefix);
                hasher.update(id.id());
            }
        }
        let len = config.hash_signature_data(&mut hasher)?;
        hasher.update(&config.trailer(len)?);

        let digest = hasher.finish();
        let signature = key.create_signature(rng, hash_alg, &digest)?;

        // the hash head is intentionally left zeroed
        Ok(Signature::from_config(config, [0, 0], signature))
    }

    fn signing_target(&self) -> Result<SigningTarget<'_>> {
        if let Some(l) = self.literal() {
            return Ok(SigningTarget::Literal(l));
        }

        let key = self.packets.iter().find_map(|p| match p {
            Packet::PublicKey(k) => Some(k),
            _ => None,
        });
        let id = self.packets.iter().find_map(|p| match p {
            Packet::UserId(u) => Some(u),
            _ => None,
        });

        match (key, id) {
            (Some(key), Some(id)) => Ok(SigningTarget::Certification { key, id }),
            _ => Err(NoMatchingPacketSnafu.build()),
        }
    }

    /// Verify the `sig_index`-th signature packet of this message against
    /// `keys`. All failures, including malformed inputs, report as `false`.
    pub fn verify(&self, keys: &[&PublicKey], sig_index: usize) -> bool {
        self.try_verify(keys, sig_index).unwrap_or(false)
    }

    fn try_verify(&self, keys: &[&PublicKey], sig_index: usize) -> Result<bool> {
        let Some(sig) = self.signatures().nth(sig_index) else {
            return Ok(false);
        };
        let Some(issuer) = sig.issuer() else {
            return Ok(false);
        };
        let Some(key) = find_key(keys, issuer) else {
            debug!("no key found for issuer {:?}", issuer);
            return Ok(false);
        };
        let Some(literal) = self.literal() else {
            return Ok(false);
        };

        let mut hasher = sig.config.hash_alg.new_hasher()?;
        hasher.update(literal.data());
        let len = sig.config.hash_signature_data(&mut hasher)?;
        hasher.update(&sig.config.trailer(len)?);
        let digest = hasher.finish();

        Ok(key
            .verify_signature(sig.config.hash_alg, &digest, &sig.signature)
            .is_ok())
    }

    /// Encrypt this message to the given recipient keys.
    ///
    /// Generates a fresh session key, wraps the serialized message in an
    /// integrity protected encrypted data packet, and emits one encrypted
    /// session key packet per recipient.
    pub fn encrypt_to_keys<R: CryptoRng + Rng>(
        &self,
        rng: &mut R,
        alg: SymmetricKeyAlgorithm,
        keys: &[&PublicKey],
    ) -> Result<Message> {
        let session_key = alg.new_session_key(rng)?;

        let plaintext = self.to_bytes()?;
        let encrypted = alg.encrypt_protected(rng, &session_key, &plaintext, |prefix, body| {
            Packet::from(ModDetectionCode::new(mdc_hash(prefix, body))).to_bytes()
        })?;
        let edata = SymEncryptedProtectedData::new(encrypted);

        // algo || key || checksum, the blob each recipient receives
        let mut session_blob = Zeroizing::new(Vec::with_capacity(session_key.len() + 3));
        session_blob.push(alg.into());
        session_blob.extend_from_slice(&session_key);
        checksum::simple_to_writer(&session_key, &mut *session_blob)?;

        let mut packets = Vec::with_capacity(keys.len() + 1);
        for key in keys {
            debug!("encrypting session key to a {:?} key", key.algorithm());
            let mpi = key.encrypt_session_key(rng, &session_blob)?;
            packets.push(Packet::from(PublicKeyEncryptedSessionKey::new(
                key.key_id()?,
                key.algorithm(),
                vec![mpi],
            )));
        }
        packets.push(edata.into());

        Ok(Message::new(packets))
    }

    /// Decrypt this message with any matching secret key.
    ///
    /// Candidate keys are matched by key id suffix against each encrypted
    /// session key packet; failed candidates are skipped silently.
    pub fn decrypt_with_keys(&self, keys: &[&SecretKey]) -> Option<Message> {
        for pkesk in self.packets.iter().filter_map(|p| match p {
            Packet::PublicKeyEncryptedSessionKey(p) => Some(p),
            _ => None,
        }) {
            if !matches!(
                pkesk.algorithm(),
                PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt
            ) {
                debug!("skipping {:?} session key packet", pkesk.algorithm());
                continue;
            }
            let Some(mpi) = pkesk.mpis().first() else {
                continue;
            };

            for key in keys {
                if !key.algorithm().is_encryption() {
                    continue;
                }
                let matches = key
                    .fingerprint()
                    .map(|fp| fp.matches_key_id(pkesk.id()))
                    .unwrap_or(false);
                if !matches {
                    continue;
                }

                let Ok(blob) = key.decrypt_session_key(mpi) else {
                    continue;
                };
                let Some((alg, session_key)) = decode_session_key(&blob) else {
                    continue;
                };

                if let Some(message) = self.decrypt_packet(alg, &session_key) {
                    return Some(message);
                }
            }
        }

        None
    }

    /// Decrypt this message by trying each passphrase against its symmetric
    /// session key packets.
    pub fn decrypt_with_passphrases(&self, passphrases: &[&str]) -> Option<Message> {
        for skesk in self.packets.iter().filter_map(|p| match p {
            Packet::SymKeyEncryptedSessionKey(p) => Some(p),
            _ => None,
        }) {
            let alg = skesk.sym_algorithm();

            for passphrase in passphrases {
                let Ok(derived) = skesk.s2k().derive_key(passphrase, alg.key_size()) else {
                    continue;
                };

                match skesk.encrypted_key() {
                    None => {
                        // the derived key is the session key itself
                        if let Some(message) = self.decrypt_packet(alg, &derived) {
                            return Some(message);
                        }
                    }
                    Some(encrypted_key) => {
                        let mut blob = Zeroizing::new(encrypted_key.to_vec());
                        if alg.decrypt_simple(&derived, &mut blob).is_err() {
                            continue;
                        }
                        let Some((alg, session_key)) = decode_session_key(&blob) else {
                            continue;
                        };
                        if let Some(message) = self.decrypt_packet(alg, &session_key) {
                            return Some(message);
                        }
                    }
                }
            }
        }

        None
    }

    /// Decrypt the first encrypted data packet with the given session key and
    /// verify its integrity. Any mismatch yields `None`.
    fn decrypt_packet(&self, alg: SymmetricKeyAlgorithm, session_key: &[u8]) -> Option<Message> {
        let edata = self.packets.iter().find_map(|p| match p {
            Packet::SymEncryptedProtectedData(p) => Some(p),
            _ => None,
        })?;

        let mut data = edata.data().to_vec();
        let (prefix, content) = alg.decrypt_protected(session_key, &mut data).ok()?;

        // quick check octets reject wrong keys fast, the MDC stays authoritative
        let bs = alg.block_size();
        if prefix[bs - 2] != prefix[bs] || prefix[bs - 1] != prefix[bs + 1] {
            debug!("quick check mismatch");
            return None;
        }

        // MDC packet: 1 byte tag, 1 byte length, 20 bytes SHA1
        if content.len() < 22 {
            return None;
        }
        let (message, mdc) = content.split_at(content.len() - 22);
        if mdc[0] != 0xD3 || mdc[1] != 0x14 {
            debug!("invalid mdc framing");
            return None;
        }

        if mdc_hash(prefix, message) != mdc[2..] {
            debug!("mdc mismatch");
            return None;
        }

        Message::from_bytes(message).ok()
    }
}

impl Serialize for Message {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        self.packets.to_writer(writer)
    }

    fn write_len(&self) -> usize {
        self.packets.write_len()
    }
}

/// SHA1 over the CFB prefix, the plaintext and the MDC packet header itself.
fn mdc_hash(prefix: &[u8], body: &[u8]) -> [u8; 20] {
    let mut hasher = Sha1::new();
    hasher.update(prefix);
    hasher.update(body);
    hasher.update([0xD3, 0x14]);
    hasher.finalize().into()
}

/// Split and validate a decrypted session key blob: `algo || key || checksum`.
fn decode_session_key(blob: &[u8]) -> Option<(SymmetricKeyAlgorithm, Zeroizing<Vec<u8>>)> {
    if blob.len() < 3 {
        return None;
    }

    let alg = SymmetricKeyAlgorithm::from(blob[0]);
    let (key, chk) = blob[1..].split_at(blob.len() - 3);

    if checksum::simple(chk, key).is_err() {
        debug!("session key checksum mismatch");
        return None;
    }
    if alg.key_size() == 0 || key.len() != alg.key_size() {
        return None;
    }

    Some((alg, Zeroizing::new(key.to_vec())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_session_key() {
        let key = vec![7u8; 16];
        let mut blob = vec![u8::from(SymmetricKeyAlgorithm::AES128)];
        blob.extend_from_slice(&key);
        checksum::simple_to_writer(&key, &mut blob).unwrap();

        let (alg, decoded) = decode_session_key(&blob).unwrap();
        assert_eq!(alg, SymmetricKeyAlgorithm::AES128);
        assert_eq!(&decoded[..], &key[..]);

        // corrupt checksum
        let mut bad = blob.clone();
        *bad.last_mut().unwrap() ^= 1;
        assert!(decode_session_key(&bad).is_none());

        // key length not matching the declared algorithm
        let mut bad = blob.clone();
        bad[0] = u8::from(SymmetricKeyAlgorithm::AES256);
        assert!(decode_session_key(&bad).is_none());

        // unknown algorithm
        let mut bad = blob;
        bad[0] = 42;
        assert!(decode_session_key(&bad).is_none());
    }

    #[test]
    fn test_mdc_hash_is_framed() {
        let a = mdc_hash(b"prefix", b"body");
        let b = mdc_hash(b"prefix", b"bodz");
        assert_ne!(a, b);
    }
}
