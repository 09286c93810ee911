//! Object identifiers.

use std::fmt;

use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Number of random bytes in a generated id (96 bits, 24 hex characters).
pub const ID_BYTES: usize = 12;

/// Opaque identifier of one object in a [`crate::ProjectGraph`].
///
/// Ids read from a descriptor are kept exactly as written; ids minted by the
/// graph are 24 upper-case hex characters like the ones Xcode produces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ObjectId(pub String);

impl ObjectId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Draw a fresh random candidate. Uniqueness is the graph's job.
    pub(crate) fn random<R: RngCore + ?Sized>(rng: &mut R) -> Self {
        let mut bytes = [0u8; ID_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(hex::encode_upper(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for ObjectId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ObjectId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}
