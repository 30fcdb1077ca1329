use num_enum::{FromPrimitive, IntoPrimitive};

mod fingerprint;
mod key_id;
mod key_traits;
mod mpi;
mod s2k;

pub use self::fingerprint::Fingerprint;
pub use self::key_id::KeyId;
pub use self::key_traits::KeyDetails;
pub use self::mpi::Mpi;
pub use self::s2k::{StringToKey, StringToKeyType};

/// Available key versions.
#[derive(Debug, PartialEq, Eq, Copy, Clone, FromPrimitive, IntoPrimitive, Hash)]
#[repr(u8)]
pub enum KeyVersion {
    V2 = 2,
    V3 = 3,
    V4 = 4,

    #[num_enum(catch_all)]
    Other(u8),
}
