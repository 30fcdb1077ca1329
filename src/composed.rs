mod message;

pub use self::message::Message;

use crate::types::{KeyDetails, KeyId};

/// Find the first key in `keys` whose fingerprint ends with `id`.
/// The wildcard id matches any key.
pub fn find_key<'a, K: KeyDetails>(keys: &[&'a K], id: &KeyId) -> Option<&'a K> {
    keys.iter()
        .find(|k| {
            k.fingerprint()
                .map(|fp| fp.matches_key_id(id))
                .unwrap_or(false)
        })
        .copied()
}
