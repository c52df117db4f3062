//! Cache key derivation.

use xxhash_rust::xxh3::xxh3_64_with_seed;

/// Process-lifetime random seed mixed into every cache key.
///
/// Constructed once at startup and injected wherever keys are derived. A
/// restart draws a new seed, which implicitly invalidates every previously
/// derived key, and observed URL patterns cannot be turned into precomputed
/// keys.
#[derive(Debug, Clone, Copy)]
pub struct KeySeed(u64);

impl KeySeed {
    /// Draw a fresh random seed.
    pub fn generate() -> Self {
        Self(rand::random())
    }

    /// Build a seed from a known value. Useful for tests.
    pub const fn from_raw(seed: u64) -> Self {
        Self(seed)
    }
}

/// Fixed-width identifier binding a cached response to (URL, credential).
///
/// The full credential value is hashed alongside the URL. Keying on a
/// credential's user-id prefix alone would let a forged credential with a
/// valid id read cached private data; hashing the entire value keeps each
/// entry scoped to the exact session that fetched it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey(u64);

impl CacheKey {
    /// Derive the key for a request URL under a credential identity.
    pub fn derive(seed: KeySeed, url: &str, credential: &str) -> Self {
        let combined = format!("{url}:{credential}");
        Self(xxh3_64_with_seed(combined.as_bytes(), seed.0))
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://upstream.example/ajax/illust/1";

    #[test]
    fn test_distinct_credentials_distinct_keys() {
        let seed = KeySeed::from_raw(7);
        let key_a = CacheKey::derive(seed, URL, "1000_secretA");
        let key_b = CacheKey::derive(seed, URL, "1000_secretB");
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_distinct_urls_distinct_keys() {
        let seed = KeySeed::from_raw(7);
        let key_a = CacheKey::derive(seed, URL, "tok");
        let key_b = CacheKey::derive(seed, "https://upstream.example/ajax/illust/2", "tok");
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_seed_changes_every_key() {
        let key_a = CacheKey::derive(KeySeed::from_raw(1), URL, "tok");
        let key_b = CacheKey::derive(KeySeed::from_raw(2), URL, "tok");
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn test_display_is_fixed_width_hex() {
        let rendered = CacheKey::derive(KeySeed::from_raw(42), URL, "tok").to_string();
        assert_eq!(rendered.len(), 16);
        assert!(rendered.bytes().all(|b| b.is_ascii_hexdigit()));
    }

    #[test]
    fn test_derivation_is_stable() {
        let seed = KeySeed::from_raw(42);
        assert_eq!(
            CacheKey::derive(seed, URL, "tok"),
            CacheKey::derive(seed, URL, "tok")
        );
    }
}
