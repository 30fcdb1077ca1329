use chrono::{TimeZone, Utc};
use num_bigint::traits::ModInverse;
use rand::{CryptoRng, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use rsa::RsaPrivateKey;
use sha1::{Digest, Sha1};

use pgp_core::crypto::{HashAlgorithm, PublicKeyAlgorithm, SymmetricKeyAlgorithm};
use pgp_core::packet::{
    LiteralData, ModDetectionCode, Packet, PlainSecretParams, PublicKey,
    PublicKeyEncryptedSessionKey, PublicParams, SecretKey, SymEncryptedProtectedData,
    SymKeyEncryptedSessionKey,
};
use pgp_core::ser::Serialize;
use pgp_core::types::{KeyDetails, KeyId, KeyVersion, Mpi, StringToKey};
use pgp_core::Message;

fn rsa_secret_key<R: CryptoRng + Rng>(rng: &mut R, bits: usize) -> SecretKey {
    let key = RsaPrivateKey::new(rng, bits).expect("key generation");

    let p = &key.primes()[0];
    let q = &key.primes()[1];
    let u = p
        .clone()
        .mod_inverse(q)
        .and_then(|u| u.to_biguint())
        .expect("valid primes");

    let pub_key = PublicKey::new(
        KeyVersion::V4,
        PublicKeyAlgorithm::RSA,
        Utc.timestamp_opt(1_400_000_000, 0).single().unwrap(),
        None,
        PublicParams::Rsa {
            n: Mpi::from_slice(&key.n().to_bytes_be()),
            e: Mpi::from_slice(&key.e().to_bytes_be()),
        },
    )
    .unwrap();

    SecretKey::new(
        pub_key,
        PlainSecretParams::Rsa {
            d: Mpi::from_slice(&key.d().to_bytes_be()),
            p: Mpi::from_slice(&p.to_bytes_be()),
            q: Mpi::from_slice(&q.to_bytes_be()),
            u: Mpi::from_slice(&u.to_bytes_be()),
        },
    )
    .unwrap()
}

fn plain_message(content: &str) -> Message {
    Message::new(vec![LiteralData::from_str("", content).into()])
}

/// Build an integrity protected data packet under `session_key` by hand.
fn protected_edata<R: CryptoRng + Rng>(
    rng: &mut R,
    alg: SymmetricKeyAlgorithm,
    session_key: &[u8],
    message: &Message,
) -> SymEncryptedProtectedData {
    let plaintext = message.to_bytes().unwrap();
    let encrypted = alg
        .encrypt_protected(rng, session_key, &plaintext, |prefix, body| {
            let mut hasher = Sha1::new();
            hasher.update(prefix);
            hasher.update(body);
            hasher.update([0xD3, 0x14]);
            Packet::from(ModDetectionCode::new(hasher.finalize().into())).to_bytes()
        })
        .unwrap();

    SymEncryptedProtectedData::new(encrypted)
}

#[test]
fn test_encrypt_decrypt_roundtrip_all_algorithms() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(200);

    let key = rsa_secret_key(&mut rng, 1024);
    let message = plain_message("attack at dawn");

    for alg in [
        SymmetricKeyAlgorithm::Blowfish,
        SymmetricKeyAlgorithm::AES128,
        SymmetricKeyAlgorithm::AES192,
        SymmetricKeyAlgorithm::AES256,
    ] {
        let encrypted = message
            .encrypt_to_keys(&mut rng, alg, &[&key.public_key()])
            .unwrap();

        // one session key packet and the encrypted data
        assert_eq!(encrypted.packets().len(), 2);
        assert!(encrypted.literal().is_none());

        let decrypted = encrypted.decrypt_with_keys(&[&key]).unwrap();
        assert_eq!(decrypted, message);
        assert_eq!(decrypted.literal().unwrap().data(), b"attack at dawn");
    }
}

#[test]
fn test_encrypted_message_wire_roundtrip() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(201);

    let key = rsa_secret_key(&mut rng, 1024);
    let message = plain_message("attack at dawn");

    let encrypted = message
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[&key.public_key()])
        .unwrap();

    let bytes = encrypted.to_bytes().unwrap();
    assert_eq!(bytes.len(), encrypted.write_len());

    let parsed = Message::from_bytes(&bytes).unwrap();
    assert_eq!(parsed, encrypted);

    let decrypted = parsed.decrypt_with_keys(&[&key]).unwrap();
    assert_eq!(decrypted, message);
}

#[test]
fn test_multi_recipient() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(202);

    let keys: Vec<SecretKey> = (0..3).map(|_| rsa_secret_key(&mut rng, 1024)).collect();
    let unrelated = rsa_secret_key(&mut rng, 1024);

    let message = plain_message("for all of you");
    let public: Vec<&PublicKey> = keys.iter().map(|k| k.public_key()).collect();
    let encrypted = message
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES256, &public)
        .unwrap();

    // three session key packets and the encrypted data
    assert_eq!(encrypted.packets().len(), 4);

    // any single private key suffices
    for key in &keys {
        let decrypted = encrypted.decrypt_with_keys(&[key]).unwrap();
        assert_eq!(decrypted, message);
    }

    // an unrelated key does not
    assert!(encrypted.decrypt_with_keys(&[&unrelated]).is_none());
    assert!(encrypted.decrypt_with_keys(&[]).is_none());
}

#[test]
fn test_wildcard_recipient() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(203);

    let key = rsa_secret_key(&mut rng, 1024);
    let message = plain_message("anonymous recipient");

    let encrypted = message
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[&key.public_key()])
        .unwrap();

    // rewrite the session key packet with the wildcard key id
    let packets: Vec<Packet> = encrypted
        .into_packets()
        .into_iter()
        .map(|p| match p {
            Packet::PublicKeyEncryptedSessionKey(pkesk) => {
                PublicKeyEncryptedSessionKey::new(
                    KeyId::WILDCARD,
                    pkesk.algorithm(),
                    pkesk.mpis().to_vec(),
                )
                .into()
            }
            p => p,
        })
        .collect();
    let anonymous = Message::new(packets);

    let decrypted = anonymous.decrypt_with_keys(&[&key]).unwrap();
    assert_eq!(decrypted, message);
}

#[test]
fn test_mdc_tamper_detection() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(204);

    let key = rsa_secret_key(&mut rng, 1024);
    let message = plain_message("attack at dawn");

    let encrypted = message
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[&key.public_key()])
        .unwrap();

    // flipping any ciphertext byte must yield nothing, not corrupt plaintext
    let tamper = |index_from_end: usize| {
        let packets: Vec<Packet> = encrypted
            .clone()
            .into_packets()
            .into_iter()
            .map(|p| match p {
                Packet::SymEncryptedProtectedData(edata) => {
                    let mut data = edata.data().to_vec();
                    let index = data.len() - 1 - index_from_end;
                    data[index] ^= 0x01;
                    SymEncryptedProtectedData::new(data).into()
                }
                p => p,
            })
            .collect();
        Message::new(packets)
    };

    // the very last byte (inside the MDC digest)
    assert!(tamper(0).decrypt_with_keys(&[&key]).is_none());
    // a byte inside the literal data
    assert!(tamper(30).decrypt_with_keys(&[&key]).is_none());
}

#[test]
fn test_symmetric_passphrase_direct_key() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(205);

    let alg = SymmetricKeyAlgorithm::AES128;
    let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA2_256, 224);
    let message = plain_message("under a passphrase");

    // without an encrypted blob, the derived key is the session key
    let session_key = s2k.derive_key("correct horse", alg.key_size()).unwrap();
    let edata = protected_edata(&mut rng, alg, &session_key, &message);

    let encrypted = Message::new(vec![
        SymKeyEncryptedSessionKey::new(alg, s2k, None).into(),
        edata.into(),
    ]);

    let decrypted = encrypted
        .decrypt_with_passphrases(&["correct horse"])
        .unwrap();
    assert_eq!(decrypted, message);

    assert!(encrypted.decrypt_with_passphrases(&["wrong pony"]).is_none());
    assert!(encrypted.decrypt_with_passphrases(&[]).is_none());

    // later passphrases are still tried
    let decrypted = encrypted
        .decrypt_with_passphrases(&["wrong pony", "correct horse"])
        .unwrap();
    assert_eq!(decrypted, message);
}

#[test]
fn test_symmetric_passphrase_wrapped_key() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(206);

    let alg = SymmetricKeyAlgorithm::AES256;
    let s2k = StringToKey::new_iterated(&mut rng, HashAlgorithm::SHA1, 224);
    let message = plain_message("wrapped session key");

    // a random session key, wrapped under the passphrase derived key
    let session_key = alg.new_session_key(&mut rng).unwrap();
    let edata = protected_edata(&mut rng, alg, &session_key, &message);

    let mut blob = vec![u8::from(alg)];
    blob.extend_from_slice(&session_key);
    let checksum = session_key
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));
    blob.extend_from_slice(&checksum.to_be_bytes());

    let kek = s2k.derive_key("opensesame", alg.key_size()).unwrap();
    alg.encrypt_simple(&kek, &mut blob).unwrap();

    let encrypted = Message::new(vec![
        SymKeyEncryptedSessionKey::new(alg, s2k, Some(blob)).into(),
        edata.into(),
    ]);

    let decrypted = encrypted.decrypt_with_passphrases(&["opensesame"]).unwrap();
    assert_eq!(decrypted, message);

    assert!(encrypted.decrypt_with_passphrases(&["sesame"]).is_none());
}

#[test]
fn test_decrypt_skips_foreign_session_key_packets() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(207);

    let key = rsa_secret_key(&mut rng, 1024);
    let message = plain_message("still reachable");

    let encrypted = message
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[&key.public_key()])
        .unwrap();

    // an unsupported session key packet in front must be skipped, not fatal
    let mut packets = vec![Packet::from(PublicKeyEncryptedSessionKey::new(
        KeyId::WILDCARD,
        PublicKeyAlgorithm::Elgamal,
        vec![Mpi::from_slice(&[1, 2, 3])],
    ))];
    packets.extend(encrypted.into_packets());

    let decrypted = Message::new(packets).decrypt_with_keys(&[&key]).unwrap();
    assert_eq!(decrypted, message);
}

#[test]
fn test_signed_then_encrypted_roundtrip() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(208);

    let sign_key = rsa_secret_key(&mut rng, 1024);
    let enc_key = rsa_secret_key(&mut rng, 1024);

    let message = plain_message("sign me, then hide me");
    let sig = message
        .sign(
            &mut rng,
            &[&sign_key],
            HashAlgorithm::SHA2_256,
            &sign_key.key_id().unwrap(),
            Utc.timestamp_opt(1_600_000_000, 0).single().unwrap(),
        )
        .unwrap();

    let mut packets = message.clone().into_packets();
    packets.push(sig.into());
    let signed = Message::new(packets);

    let encrypted = signed
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES192, &[&enc_key.public_key()])
        .unwrap();

    let decrypted = encrypted.decrypt_with_keys(&[&enc_key]).unwrap();
    assert_eq!(decrypted, signed);
    // the inner signature still verifies after the round trip
    assert!(decrypted.verify(&[&sign_key.public_key()], 0));
}

#[test]
fn test_session_key_blob_shape() {
    let _ = pretty_env_logger::try_init();
    let mut rng = ChaCha8Rng::seed_from_u64(209);

    let key = rsa_secret_key(&mut rng, 1024);
    let message = plain_message("checksum check");

    let encrypted = message
        .encrypt_to_keys(&mut rng, SymmetricKeyAlgorithm::AES128, &[&key.public_key()])
        .unwrap();

    let Packet::PublicKeyEncryptedSessionKey(pkesk) = &encrypted.packets()[0] else {
        panic!("expected a session key packet first");
    };
    assert_eq!(pkesk.algorithm(), PublicKeyAlgorithm::RSA);
    assert_eq!(pkesk.id(), &key.key_id().unwrap());
    assert_eq!(pkesk.mpis().len(), 1);

    // decrypting the blob by hand shows algo || key || checksum
    let blob = key.decrypt_session_key(&pkesk.mpis()[0]).unwrap();
    assert_eq!(blob.len(), 1 + 16 + 2);
    assert_eq!(blob[0], u8::from(SymmetricKeyAlgorithm::AES128));
    let expected = blob[1..17]
        .iter()
        .fold(0u16, |acc, b| acc.wrapping_add(u16::from(*b)));
    assert_eq!(&blob[17..], &expected.to_be_bytes());
}
