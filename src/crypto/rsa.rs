use num_bigint::BigUint;
use rand::{CryptoRng, Rng};
use rsa::traits::PublicKeyParts;
use rsa::{Pkcs1v15Encrypt, Pkcs1v15Sign, RsaPrivateKey, RsaPublicKey};

use crate::crypto::hash::HashAlgorithm;
use crate::errors::Result;
use crate::types::Mpi;

/// Build an [`RsaPrivateKey`] from OpenPGP secret key parameters.
///
/// OpenPGP stores `u = p^-1 mod q`, while the rsa crate derives its CRT
/// coefficient as `q^-1 mod p`. Handing the primes over in swapped order
/// makes the stored `u` line up with the derived coefficient.
pub fn private_key(n: &Mpi, e: &Mpi, d: &Mpi, p: &Mpi, q: &Mpi) -> Result<RsaPrivateKey> {
    let key = RsaPrivateKey::from_components(
        BigUint::from_bytes_be(n.as_bytes()),
        BigUint::from_bytes_be(e.as_bytes()),
        BigUint::from_bytes_be(d.as_bytes()),
        vec![
            BigUint::from_bytes_be(q.as_bytes()),
            BigUint::from_bytes_be(p.as_bytes()),
        ],
    )?;

    Ok(key)
}

/// RSA decryption using PKCS1v15 padding.
pub fn decrypt(priv_key: &RsaPrivateKey, mpi: &Mpi) -> Result<Vec<u8>> {
    let m = priv_key.decrypt(Pkcs1v15Encrypt, mpi.as_bytes())?;

    Ok(m)
}

/// RSA encryption using PKCS1v15 padding.
pub fn encrypt<R: CryptoRng + Rng>(
    rng: &mut R,
    n: &Mpi,
    e: &Mpi,
    plaintext: &[u8],
) -> Result<Vec<u8>> {
    let key = RsaPublicKey::new(
        BigUint::from_bytes_be(n.as_bytes()),
        BigUint::from_bytes_be(e.as_bytes()),
    )?;
    let data = key.encrypt(rng, Pkcs1v15Encrypt, plaintext)?;

    Ok(data)
}

/// Verify a RSA, PKCS1v15 padded signature.
pub fn verify(n: &Mpi, e: &Mpi, hash: HashAlgorithm, hashed: &[u8], sig: &[u8]) -> Result<()> {
    let key = RsaPublicKey::new(
        BigUint::from_bytes_be(n.as_bytes()),
        BigUint::from_bytes_be(e.as_bytes()),
    )?;

    // MPI decoding strips leading zeros, restore them to the modulus width
    let key_size = key.size();
    if sig.len() < key_size {
        let mut padded = vec![0u8; key_size - sig.len()];
        padded.extend_from_slice(sig);
        key.verify(padding(hash)?, hashed, &padded)?;
    } else {
        key.verify(padding(hash)?, hashed, sig)?;
    }

    Ok(())
}

/// Sign using RSA, with PKCS1v15 padding.
pub fn sign(key: &RsaPrivateKey, hash: HashAlgorithm, digest: &[u8]) -> Result<Vec<u8>> {
    let sig = key.sign(padding(hash)?, digest)?;

    Ok(sig)
}

fn padding(hash: HashAlgorithm) -> Result<Pkcs1v15Sign> {
    Ok(Pkcs1v15Sign {
        hash_len: Some(hash.digest_size()),
        prefix: hash.pkcs1_prefix()?.into(),
    })
}

#[cfg(test)]
mod tests {
    use num_bigint::traits::ModInverse;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rsa::traits::PrivateKeyParts;

    use super::*;

    #[test]
    fn test_private_key_swaps_primes() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let key = RsaPrivateKey::new(&mut rng, 1024).unwrap();

        let p = &key.primes()[0];
        let q = &key.primes()[1];
        let u = p
            .clone()
            .mod_inverse(q)
            .and_then(|u| u.to_biguint())
            .unwrap();

        let n = Mpi::from_slice(&key.n().to_bytes_be());
        let e = Mpi::from_slice(&key.e().to_bytes_be());
        let d = Mpi::from_slice(&key.d().to_bytes_be());
        let p = Mpi::from_slice(&p.to_bytes_be());
        let q = Mpi::from_slice(&q.to_bytes_be());

        let mut rebuilt = private_key(&n, &e, &d, &p, &q).unwrap();
        rebuilt.precompute().unwrap();

        // the derived CRT coefficient must equal OpenPGP's u
        assert_eq!(
            rebuilt.qinv().and_then(|qinv| qinv.to_biguint()).unwrap(),
            u
        );

        let msg = b"attack at dawn";
        let ct = encrypt(&mut rng, &n, &e, msg).unwrap();
        let pt = decrypt(&rebuilt, &Mpi::from_slice(&ct)).unwrap();
        assert_eq!(&pt, msg);
    }

    #[test]
    fn test_sign_verify() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let key = RsaPrivateKey::new(&mut rng, 1024).unwrap();

        let n = Mpi::from_slice(&key.n().to_bytes_be());
        let e = Mpi::from_slice(&key.e().to_bytes_be());

        let digest = HashAlgorithm::SHA2_256.digest(b"hello world").unwrap();
        let sig = sign(&key, HashAlgorithm::SHA2_256, &digest).unwrap();

        verify(&n, &e, HashAlgorithm::SHA2_256, &digest, &sig).unwrap();

        let other = HashAlgorithm::SHA2_256.digest(b"hello worle").unwrap();
        assert!(verify(&n, &e, HashAlgorithm::SHA2_256, &other, &sig).is_err());
    }
}
