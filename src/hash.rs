//! Content addressing for compiled modules: a BLAKE3 hash of the canonical
//! dump. Because the dump is canonical, equal hashes certify equal final IR;
//! the optimization-idempotence tests lean on this, and the `hash` command
//! exposes it. Comments and formatting in the source never reach the dump,
//! so they never reach the hash either.

use std::fmt;

use crate::ir::dump::dump;
use crate::ir::Module;

/// A 256-bit BLAKE3 content hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Hash the canonical dump of a module.
    pub fn of_module(module: &Module) -> Self {
        Self::of_bytes(dump(module).as_bytes())
    }

    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }

    /// Full 64-character hex form.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }

    /// Short form: the first 40 bits in base-32, 8 characters.
    pub fn to_short(&self) -> String {
        const ALPHABET: &[u8; 32] = b"0123456789abcdefghjkmnpqrstvwxyz";
        let head = u64::from_be_bytes([
            0, 0, 0, self.0[0], self.0[1], self.0[2], self.0[3], self.0[4],
        ]);
        (0..8)
            .rev()
            .map(|i| ALPHABET[((head >> (i * 5)) & 0x1f) as usize] as char)
            .collect()
    }
}

impl fmt::Debug for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::optimize::optimize;
    use crate::translate::translate;

    fn hash_of(source: &str) -> ContentHash {
        ContentHash::of_module(&translate(source).unwrap())
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(hash_of("+[>+<-]"), hash_of("+[>+<-]"));
    }

    #[test]
    fn test_comments_do_not_affect_hash() {
        assert_eq!(hash_of("+>+"), hash_of("+ then > then + commented"));
    }

    #[test]
    fn test_different_programs_differ() {
        assert_ne!(hash_of("+"), hash_of("-"));
        assert_ne!(hash_of(">"), hash_of("<"));
    }

    #[test]
    fn test_optimized_equivalents_collide() {
        // A dead entry loop optimizes to the same module as an empty program
        let mut dead_loop = translate("[-]").unwrap();
        optimize(&mut dead_loop);
        let mut empty = translate("").unwrap();
        optimize(&mut empty);
        assert_eq!(
            ContentHash::of_module(&dead_loop),
            ContentHash::of_module(&empty)
        );
    }

    #[test]
    fn test_display_forms() {
        let hash = ContentHash([0xab; 32]);
        assert_eq!(hash.to_hex().len(), 64);
        assert!(hash.to_hex().starts_with("abab"));
        assert_eq!(hash.to_short().len(), 8);
        assert!(hash.to_string().starts_with('#'));
        // Even empty input hashes to something
        assert_ne!(ContentHash::of_bytes(b""), ContentHash([0u8; 32]));
    }
}
