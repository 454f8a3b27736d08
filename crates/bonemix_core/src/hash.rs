//! Bone name hashing.
//!
//! Bones are identified by a 32-bit hash of their name rather than by the
//! name itself, so animation data authored against one skeleton can be
//! matched against another with a simple integer compare.

use std::fmt;

use xxhash_rust::xxh3::xxh3_64;

/// Stable hash of a bone name.
///
/// The value is the low 32 bits of the xxh3 hash of the UTF-8 name. Zero is
/// reserved for [`BoneHash::NONE`]; a name that happens to hash to zero is
/// remapped to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[repr(transparent)]
pub struct BoneHash(u32);

impl BoneHash {
    /// "No bone".
    pub const NONE: Self = Self(0);

    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let hash = xxh3_64(name.as_bytes()) as u32;
        Self(hash.max(1))
    }

    /// Wraps a hash read back from serialized data.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }
}

impl From<&str> for BoneHash {
    fn from(name: &str) -> Self {
        Self::from_name(name)
    }
}

impl fmt::Display for BoneHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
