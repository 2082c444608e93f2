//! Register type - the typed scalar cell flowing between operators

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{ExecutorError, ExecutorResult};

/// Capacity of the string variant in bytes (CHAR(16))
pub const STRING_CAPACITY: usize = 16;

/// Variant tag of a register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterTag {
    /// 64-bit signed integer
    Int64,
    /// Bounded string of up to 16 bytes
    Char16,
}

impl fmt::Display for RegisterTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegisterTag::Int64 => write!(f, "INT64"),
            RegisterTag::Char16 => write!(f, "CHAR16"),
        }
    }
}

/// A single typed value in a row
///
/// A register is constructed through [`Register::from_int`] or
/// [`Register::from_string`] and never changes variant afterwards.
#[derive(Debug, Clone)]
pub enum Register {
    /// Integer value
    Int(i64),
    /// String value, at most [`STRING_CAPACITY`] bytes
    Str(String),
}

impl Register {
    /// Create an integer register
    pub fn from_int(value: i64) -> Self {
        Register::Int(value)
    }

    /// Create a string register
    ///
    /// The payload is truncated to the CHAR(16) capacity at the nearest
    /// character boundary at or below 16 bytes.
    pub fn from_string(value: impl Into<String>) -> Self {
        let mut s: String = value.into();
        if s.len() > STRING_CAPACITY {
            let mut end = STRING_CAPACITY;
            while !s.is_char_boundary(end) {
                end -= 1;
            }
            s.truncate(end);
        }
        Register::Str(s)
    }

    /// Get the variant tag of this register
    pub fn tag(&self) -> RegisterTag {
        match self {
            Register::Int(_) => RegisterTag::Int64,
            Register::Str(_) => RegisterTag::Char16,
        }
    }

    /// Read as i64, returns None if this is not an integer register
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Register::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Read as string reference, returns None if this is not a string register
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Register::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Compute the 64-bit hash of this register
    ///
    /// The hash is a pure function of variant and payload; equal registers
    /// hash equally. The reverse does not hold - equality is always decided
    /// on the payload, never on the hash.
    pub fn hash64(&self) -> u64 {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }

    /// Compare against another register of the same variant
    ///
    /// Fails with `TypeMismatch` when the variants differ. This is the
    /// comparison used by predicate evaluation and join keys; the infallible
    /// [`Ord`] impl below is reserved for sorting whole rows.
    pub fn try_cmp(&self, other: &Register) -> ExecutorResult<Ordering> {
        match (self, other) {
            (Register::Int(a), Register::Int(b)) => Ok(a.cmp(b)),
            (Register::Str(a), Register::Str(b)) => Ok(a.cmp(b)),
            _ => Err(ExecutorError::mismatch(self.tag(), other.tag())),
        }
    }

    /// Numeric tag for ordering across variants
    fn type_tag(&self) -> u8 {
        match self {
            Register::Int(_) => 0,
            Register::Str(_) => 1,
        }
    }
}

impl PartialEq for Register {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Register::Int(a), Register::Int(b)) => a == b,
            (Register::Str(a), Register::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Register {}

impl PartialOrd for Register {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Register {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Register::Int(a), Register::Int(b)) => a.cmp(b),
            (Register::Str(a), Register::Str(b)) => a.cmp(b),
            // Different variants: stable order by tag. Only reachable when a
            // stream mixes variants in one column, which schemas forbid.
            _ => self.type_tag().cmp(&other.type_tag()),
        }
    }
}

impl Hash for Register {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Register::Int(i) => i.hash(state),
            Register::Str(s) => s.hash(state),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_int() {
        let r = Register::from_int(42);
        assert_eq!(r.tag(), RegisterTag::Int64);
        assert_eq!(r.as_int(), Some(42));
        assert_eq!(r.as_str(), None);
    }

    #[test]
    fn test_register_string() {
        let r = Register::from_string("hello");
        assert_eq!(r.tag(), RegisterTag::Char16);
        assert_eq!(r.as_str(), Some("hello"));
        assert_eq!(r.as_int(), None);
    }

    #[test]
    fn test_register_string_truncation() {
        let r = Register::from_string("abcdefghijklmnopqrstuvwxyz");
        assert_eq!(r.as_str(), Some("abcdefghijklmnop"));

        // Multi-byte character straddling the capacity boundary is dropped
        let r = Register::from_string("aaaaaaaaaaaaaaa\u{00e9}");
        assert_eq!(r.as_str(), Some("aaaaaaaaaaaaaaa"));
    }

    #[test]
    fn test_register_zero_is_an_int() {
        // A zero-valued integer is still an integer, not "unset"
        let r = Register::from_int(0);
        assert_eq!(r.tag(), RegisterTag::Int64);
        assert_eq!(r.as_int(), Some(0));
    }

    #[test]
    fn test_register_equality() {
        assert_eq!(Register::from_int(1), Register::from_int(1));
        assert_ne!(Register::from_int(1), Register::from_int(2));
        assert_eq!(Register::from_string("a"), Register::from_string("a"));
        // Cross-variant equality is false, never an error
        assert_ne!(Register::from_int(1), Register::from_string("1"));
    }

    #[test]
    fn test_register_hash_of_copy() {
        let r = Register::from_string("abc");
        assert_eq!(r.hash64(), r.clone().hash64());
        assert_eq!(
            Register::from_int(7).hash64(),
            Register::from_int(7).hash64()
        );
    }

    #[test]
    fn test_register_ordering_trichotomy() {
        let a = Register::from_int(1);
        let b = Register::from_int(2);
        assert!(a < b);
        assert!(b > a);
        assert!(a <= b);
        assert!(!(b <= a));
        assert_eq!(a.cmp(&a), Ordering::Equal);

        let x = Register::from_string("abc");
        let y = Register::from_string("abd");
        assert!(x < y);
        assert!(y > x);
    }

    #[test]
    fn test_register_try_cmp_mismatch() {
        let i = Register::from_int(1);
        let s = Register::from_string("a");
        assert!(matches!(
            i.try_cmp(&s),
            Err(ExecutorError::TypeMismatch { .. })
        ));
        assert_eq!(i.try_cmp(&Register::from_int(1)).unwrap(), Ordering::Equal);
    }
}
