use num_enum::{FromPrimitive, IntoPrimitive};

/// Available public key algorithms.
/// Ref: <https://tools.ietf.org/html/rfc4880.html#section-9.1>
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum PublicKeyAlgorithm {
    /// RSA (Encrypt and Sign)
    RSA = 1,
    /// RSA Encrypt-Only
    RSAEncrypt = 2,
    /// RSA Sign-Only
    RSASign = 3,
    /// Elgamal (Encrypt-Only), recognized but not supported
    Elgamal = 16,
    DSA = 17,

    #[num_enum(catch_all)]
    Other(u8),
}

impl PublicKeyAlgorithm {
    /// Can keys of this algorithm produce signatures?
    pub fn is_signing(self) -> bool {
        matches!(
            self,
            PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSASign | PublicKeyAlgorithm::DSA
        )
    }

    /// Can keys of this algorithm receive encrypted session keys?
    pub fn is_encryption(self) -> bool {
        matches!(self, PublicKeyAlgorithm::RSA | PublicKeyAlgorithm::RSAEncrypt)
    }
}
