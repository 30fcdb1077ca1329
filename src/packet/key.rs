use std::fmt;
use std::io;

use byteorder::{BigEndian, WriteBytesExt};
use bytes::Buf;
use chrono::{DateTime, TimeZone, Utc};
use rand::{CryptoRng, Rng};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::crypto::{self, HashAlgorithm, PublicKeyAlgorithm};
use crate::errors::Result;
use crate::parsing::BufParsing;
use crate::ser::Serialize;
use crate::types::{Fingerprint, KeyDetails, KeyVersion, Mpi};

/// Algorithm specific public key parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicParams {
    Rsa { n: Mpi, e: Mpi },
    Dsa { p: Mpi, q: Mpi, g: Mpi, y: Mpi },
}

/// Algorithm specific plaintext secret key parameters. Zeroized on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub enum PlainSecretParams {
    Rsa { d: Mpi, p: Mpi, q: Mpi, u: Mpi },
    Dsa { x: Mpi },
}

impl fmt::Debug for PlainSecretParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlainSecretParams::Rsa { .. } => write!(f, "PlainSecretParams::Rsa"),
            PlainSecretParams::Dsa { .. } => write!(f, "PlainSecretParams::Dsa"),
        }
    }
}

/// Public Key Packet
/// <https://tools.ietf.org/html/rfc4880.html#section-5.5.2>
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    version: KeyVersion,
    algorithm: PublicKeyAlgorithm,
    created_at: DateTime<Utc>,
    /// v2/v3 keys only: validity period in days
    expiration: Option<u16>,
    public_params: PublicParams,
}

impl PublicKey {
    pub fn new(
        version: KeyVersion,
        algorithm: PublicKeyAlgorithm,
        created_at: DateTime<Utc>,
        expiration: Option<u16>,
        public_params: PublicParams,
    ) -> Result<Self> {
        match (algorithm, &public_params) {
            (
                PublicKeyAlgorithm::RSA
                | PublicKeyAlgorithm::RSAEncrypt
                | PublicKeyAlgorithm::RSASign,
                PublicParams::Rsa { .. },
            )
            | (PublicKeyAlgorithm::DSA, PublicParams::Dsa { .. }) => {}
            _ => bail!(
                "public params do not match key algorithm {:?}",
                algorithm
            ),
        }

        if version == KeyVersion::V4 {
            ensure!(expiration.is_none(), "v4 keys have no expiration field");
        }

        Ok(PublicKey {
            version,
            algorithm,
            created_at,
            expiration,
            public_params,
        })
    }

    /// Parses a `PublicKey` packet body.
    pub fn from_buf<B: Buf>(i: &mut B) -> Result<Self> {
        let version = KeyVersion::from(i.read_u8()?);

        let created_at = i.read_be_u32()?;
        let created_at = Utc
            .timestamp_opt(created_at.into(), 0)
            .single()
            .ok_or_else(|| format_err!("invalid created field"))?;

        let expiration = match version {
            KeyVersion::V2 | KeyVersion::V3 => Some(i.read_be_u16()?),
            KeyVersion::V4 => None,
            KeyVersion::Other(v) => unsupported_err!("key version {}", v),
        };

        let algorithm = PublicKeyAlgorithm::from(i.read_u8()?);
        let public_params = match algorithm {
            PublicKeyAlgorithm::RSA
            | PublicKeyAlgorithm::RSAEncrypt
            | PublicKeyAlgorithm::RSASign => PublicParams::Rsa {
                n: Mpi::from_buf(i)?,
                e: Mpi::from_buf(i)?,
            },
            PublicKeyAlgorithm::DSA => PublicParams::Dsa {
                p: Mpi::from_buf(i)?,
                q: Mpi::from_buf(i)?,
                g: Mpi::from_buf(i)?,
                y: Mpi::from_buf(i)?,
            },
            _ => unsupported_err!("key algorithm {:?}", algorithm),
        };

        Ok(PublicKey {
            version,
            algorithm,
            created_at,
            expiration,
            public_params,
        })
    }

    pub fn created_at(&self) -> &DateTime<Utc> {
        &self.created_at
    }

    pub fn expiration(&self) -> Option<u16> {
        self.expiration
    }

    pub fn public_params(&self) -> &PublicParams {
        &self.public_params
    }

    /// The canonical byte chunks hashed into the fingerprint.
    ///
    /// v4 keys hash their full packet body behind the `0x99` framing, v2/v3
    /// keys hash only the bare MPI magnitudes of their public parameters.
    pub fn fingerprint_material(&self) -> Result<Vec<u8>> {
        match self.version {
            KeyVersion::V2 | KeyVersion::V3 => {
                let mut buf = Vec::new();
                match &self.public_params {
                    PublicParams::Rsa { n, e } => {
                        buf.extend_from_slice(n.as_bytes());
                        buf.extend_from_slice(e.as_bytes());
                    }
                    PublicParams::Dsa { p, q, g, y } => {
                        buf.extend_from_slice(p.as_bytes());
                        buf.extend_from_slice(q.as_bytes());
                        buf.extend_from_slice(g.as_bytes());
                        buf.extend_from_slice(y.as_bytes());
                    }
                }
                Ok(buf)
            }
            KeyVersion::V4 => {
                let body = self.to_bytes()?;
                let mut buf = Vec::with_capacity(body.len() + 3);
                buf.push(0x99);
                buf.write_u16::<BigEndian>(body.len().try_into()?)?;
                buf.extend_from_slice(&body);
                Ok(buf)
            }
            KeyVersion::Other(v) => unsupported_err!("key version {}", v),
        }
    }

    /// Verify a signature over `hashed` made by this key.
    pub fn verify_signature(
        &self,
        hash: HashAlgorithm,
        hashed: &[u8],
        sig: &[Mpi],
    ) -> Result<()> {
        match (self.algorithm, &self.public_params) {
            (
                PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSASign,
                PublicParams::Rsa { n, e },
            ) => {
                ensure_eq!(sig.len(), 1, "invalid signature shape");
                crypto::rsa::verify(n, e, hash, hashed, sig[0].as_bytes())
            }
            (PublicKeyAlgorithm::DSA, PublicParams::Dsa { p, q, g, y }) => {
                ensure_eq!(sig.len(), 2, "invalid signature shape");
                let hashed = &hashed[..q.len().min(hashed.len())];
                crypto::dsa::verify(
                    &p.into(),
                    &q.into(),
                    &g.into(),
                    &y.into(),
                    hashed,
                    &(&sig[0]).into(),
                    &(&sig[1]).into(),
                )
            }
            _ => unsupported_err!("signatures with {:?}", self.algorithm),
        }
    }

    /// Encrypt a session key blob to this key.
    pub fn encrypt_session_key<R: CryptoRng + Rng>(
        &self,
        rng: &mut R,
        plain: &[u8],
    ) -> Result<Mpi> {
        match (self.algorithm, &self.public_params) {
            (
                PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt,
                PublicParams::Rsa { n, e },
            ) => {
                let ct = crypto::rsa::encrypt(rng, n, e, plain)?;
                Ok(Mpi::from_slice(&ct))
            }
            _ => unsupported_err!("encryption to {:?}", self.algorithm),
        }
    }
}

impl Serialize for PublicKey {
    fn to_writer<W: io::Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u8(self.version.into())?;
        writer.write_u32::<BigEndian>(self.created_at.timestamp().try_into()?)?;

        match self.version {
            KeyVersion::V2 | KeyVersion::V3 => {
                writer.write_u16::<BigEndian>(self.expiration.unwrap_or(0))?;
            }
            KeyVersion::V4 => {}
            KeyVersion::Other(v) => unsupported_err!("key version {}", v),
        }

        writer.write_u8(self.algorithm.into())?;

        match &self.public_params {
            PublicParams::Rsa { n, e } => {
                n.to_writer(writer)?;
                e.to_writer(writer)?;
            }
            PublicParams::Dsa { p, q, g, y } => {
                p.to_writer(writer)?;
                q.to_writer(writer)?;
                g.to_writer(writer)?;
                y.to_writer(writer)?;
            }
        }

        Ok(())
    }

    fn write_len(&self) -> usize {
        let mut sum = 1 + 4;
        if matches!(self.version, KeyVersion::V2 | KeyVersion::V3) {
            sum += 2;
        }
        sum += 1;
        sum += match &self.public_params {
            PublicParams::Rsa { n, e } => n.write_len() + e.write_len(),
            PublicParams::Dsa { p, q, g, y } => {
                p.write_len() + q.write_len() + g.write_len() + y.write_len()
            }
        };
        sum
    }
}

impl KeyDetails for PublicKey {
    fn version(&self) -> KeyVersion {
        self.version
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.algorithm
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        let material = self.fingerprint_material()?;
        let digest = match self.version {
            KeyVersion::V2 | KeyVersion::V3 => HashAlgorithm::MD5.digest(&material)?,
            KeyVersion::V4 => HashAlgorithm::SHA1.digest(&material)?,
            KeyVersion::Other(v) => unsupported_err!("key version {}", v),
        };

        Fingerprint::new(self.version, &digest)
    }
}

/// Secret Key value: the public key packet plus plaintext secret parameters.
///
/// Keyrings hand these in as typed values, they never appear inside messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecretKey {
    details: PublicKey,
    secret_params: PlainSecretParams,
}

impl SecretKey {
    pub fn new(details: PublicKey, secret_params: PlainSecretParams) -> Result<Self> {
        match (details.public_params(), &secret_params) {
            (PublicParams::Rsa { .. }, PlainSecretParams::Rsa { .. })
            | (PublicParams::Dsa { .. }, PlainSecretParams::Dsa { .. }) => {}
            _ => bail!("secret params do not match public params"),
        }

        Ok(SecretKey {
            details,
            secret_params,
        })
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.details
    }

    /// Create a signature over the given digest.
    pub fn create_signature<R: CryptoRng + Rng>(
        &self,
        rng: &mut R,
        hash: HashAlgorithm,
        digest: &[u8],
    ) -> Result<Vec<Mpi>> {
        ensure!(
            self.algorithm().is_signing(),
            "{:?} can not sign",
            self.algorithm()
        );

        match (&self.secret_params, self.details.public_params()) {
            (PlainSecretParams::Rsa { d, p, q, .. }, PublicParams::Rsa { n, e }) => {
                let key = crypto::rsa::private_key(n, e, d, p, q)?;
                let sig = crypto::rsa::sign(&key, hash, digest)?;
                Ok(vec![Mpi::from_slice(&sig)])
            }
            (PlainSecretParams::Dsa { x }, PublicParams::Dsa { p, q, g, .. }) => {
                let digest = &digest[..q.len().min(digest.len())];
                let (r, s) = crypto::dsa::sign(rng, &p.into(), &q.into(), &g.into(), &x.into(), digest)?;
                Ok(vec![Mpi::from(r), Mpi::from(s)])
            }
            _ => unsupported_err!("signing with {:?}", self.algorithm()),
        }
    }

    /// Recover a session key blob encrypted to this key.
    pub fn decrypt_session_key(&self, mpi: &Mpi) -> Result<Zeroizing<Vec<u8>>> {
        ensure!(
            self.algorithm().is_encryption(),
            "{:?} can not decrypt",
            self.algorithm()
        );

        match (&self.secret_params, self.details.public_params()) {
            (PlainSecretParams::Rsa { d, p, q, .. }, PublicParams::Rsa { n, e }) => {
                let key = crypto::rsa::private_key(n, e, d, p, q)?;
                Ok(Zeroizing::new(crypto::rsa::decrypt(&key, mpi)?))
            }
            _ => unsupported_err!("decryption with {:?}", self.algorithm()),
        }
    }
}

impl KeyDetails for SecretKey {
    fn version(&self) -> KeyVersion {
        self.details.version()
    }

    fn algorithm(&self) -> PublicKeyAlgorithm {
        self.details.algorithm()
    }

    fn fingerprint(&self) -> Result<Fingerprint> {
        self.details.fingerprint()
    }
}
