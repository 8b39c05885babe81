//! Deterministic type identity.
//!
//! A [`TypeHash`] is computed from a normalized type name with XXHash64, so
//! the compiler and a live model instance agree on identity without sharing
//! any registration state. The compiled entry point records the hash of its
//! parameter type and checks it against the model it is handed.
//!
//! ```
//! use stencil_core::TypeHash;
//!
//! let a = TypeHash::from_name("app::Person");
//! assert_eq!(a, TypeHash::from_name("app::Person"));
//! assert_ne!(a, TypeHash::from_name("app::Pet"));
//! ```

use std::fmt;
use xxhash_rust::xxh64::xxh64;

/// Domain marker so type hashes never collide with other hashed identities.
const TYPE_DOMAIN: u64 = 0x2fac10b63a6cc57c;

/// A 64-bit identity for a model or built-in type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeHash(pub u64);

impl TypeHash {
    /// Hash a normalized type name.
    #[inline]
    pub fn from_name(name: &str) -> Self {
        TypeHash(xxh64(name.as_bytes(), TYPE_DOMAIN))
    }
}

impl fmt::Debug for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeHash({:#018x})", self.0)
    }
}

impl fmt::Display for TypeHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}
