use num_bigint::{traits::ModInverse, BigUint, RandBigInt};
use num_traits::{One, Zero};
use rand::{CryptoRng, Rng};

use crate::errors::Result;

/// Calculate the modular inverse of i mod q. Requires 0 < i < q as a precondition.
///
/// If this fails q is not prime, meaning q is not part of a valid DSA key.
fn inverse(i: &BigUint, q: &BigUint) -> Result<BigUint> {
    match i.mod_inverse(q).and_then(|x| x.to_biguint()) {
        Some(x) => Ok(x),
        _ => bail!("invalid key"), // q isn't prime
    }
}

/// Produce a DSA signature. `hashed` must already be truncated to the byte
/// length of `q` by the caller.
pub fn sign<R: CryptoRng + Rng>(
    rng: &mut R,
    p: &BigUint,
    q: &BigUint,
    g: &BigUint,
    x: &BigUint,
    hashed: &[u8],
) -> Result<(BigUint, BigUint)> {
    ensure!(q > &BigUint::one(), "invalid key");

    let h = BigUint::from_bytes_be(hashed) % q;

    loop {
        let k = rng.gen_biguint_range(&BigUint::one(), q);
        let k_inv = inverse(&k, q)?;

        let r = g.modpow(&k, p) % q;
        if r.is_zero() {
            continue;
        }

        let s = (k_inv * (&h + x * &r)) % q;
        if s.is_zero() {
            continue;
        }

        return Ok((r, s));
    }
}

/// Verify a DSA signature. `hashed` must already be truncated to the byte
/// length of `q` by the caller.
pub fn verify(
    p: &BigUint,
    q: &BigUint,
    g: &BigUint,
    y: &BigUint,
    hashed: &[u8],
    r: &BigUint,
    s: &BigUint,
) -> Result<()> {
    ensure!(
        &BigUint::zero() < r && r < q && &BigUint::zero() < s && s < q,
        "invalid signature"
    );

    let h = BigUint::from_bytes_be(hashed) % q;

    let w = inverse(s, q)?;
    let u1 = (&h * &w) % q;
    let u2 = (r * &w) % q;
    let v = ((g.modpow(&u1, p) * y.modpow(&u2, p)) % p) % q;

    ensure!(&v == r, "invalid signature");

    Ok(())
}
