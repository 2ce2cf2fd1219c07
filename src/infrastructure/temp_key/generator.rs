//! Temporary key generation
//!
//! Generates random keys of the form `sk-helicone[-eu]-xxxxxxx-xxxxxxx-xxxxxxx-xxxxxxx`
//! and the hash that is persisted in their place.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::Rng;
use serde::Deserialize;
use sha2::{Digest, Sha256};

const BASE32_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Deployment region, selects the key prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRegion {
    #[default]
    Default,
    Eu,
}

/// Result of generating a new key
#[derive(Debug, Clone)]
pub struct GeneratedTempKey {
    /// The full key (only handed out once)
    pub key: String,
    /// The hashed key for storage
    pub hash: String,
}

/// Generator for temporary keys
#[derive(Debug, Clone)]
pub struct TempKeyGenerator {
    prefix: String,
    region: KeyRegion,
    groups: usize,
    group_len: usize,
}

impl TempKeyGenerator {
    pub fn new(prefix: impl Into<String>, region: KeyRegion) -> Self {
        Self {
            prefix: prefix.into(),
            region,
            groups: 4,
            group_len: 7,
        }
    }

    /// Prefix including the region marker, e.g. `sk-helicone-eu`
    pub fn full_prefix(&self) -> String {
        match self.region {
            KeyRegion::Default => self.prefix.to_lowercase(),
            KeyRegion::Eu => format!("{}-eu", self.prefix).to_lowercase(),
        }
    }

    /// Generate a new key
    pub fn generate(&self) -> GeneratedTempKey {
        let mut rng = rand::thread_rng();

        let groups: Vec<String> = (0..self.groups)
            .map(|_| {
                (0..self.group_len)
                    .map(|_| BASE32_ALPHABET[rng.gen_range(0..BASE32_ALPHABET.len())] as char)
                    .collect()
            })
            .collect();

        let key = format!("{}-{}", self.full_prefix(), groups.join("-"));
        let hash = self.hash_key(&key);

        GeneratedTempKey { key, hash }
    }

    /// Hash a key for storage
    pub fn hash_key(&self, key: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(key.as_bytes());
        let result = hasher.finalize();
        format!("sha256${}", URL_SAFE_NO_PAD.encode(result))
    }
}

impl Default for TempKeyGenerator {
    fn default() -> Self {
        Self::new("sk-helicone", KeyRegion::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_default_region() {
        let generated = TempKeyGenerator::default().generate();

        assert!(generated.key.starts_with("sk-helicone-"));
        assert!(!generated.key.starts_with("sk-helicone-eu-"));
        assert!(generated.hash.starts_with("sha256$"));
    }

    #[test]
    fn test_generate_eu_region() {
        let generator = TempKeyGenerator::new("sk-helicone", KeyRegion::Eu);
        let generated = generator.generate();

        assert_eq!(generator.full_prefix(), "sk-helicone-eu");
        assert!(generated.key.starts_with("sk-helicone-eu-"));
    }

    #[test]
    fn test_key_shape() {
        let generated = TempKeyGenerator::default().generate();
        let body = generated.key.strip_prefix("sk-helicone-").unwrap();
        let groups: Vec<&str> = body.split('-').collect();

        assert_eq!(groups.len(), 4);
        for group in groups {
            assert_eq!(group.len(), 7);
            assert!(group.bytes().all(|b| BASE32_ALPHABET.contains(&b)));
        }
        assert_eq!(generated.key, generated.key.to_lowercase());
    }

    #[test]
    fn test_prefix_is_lowercased() {
        let generator = TempKeyGenerator::new("SK-Custom", KeyRegion::Default);
        assert!(generator.generate().key.starts_with("sk-custom-"));
    }

    #[test]
    fn test_key_uniqueness() {
        let generator = TempKeyGenerator::default();
        let key1 = generator.generate();
        let key2 = generator.generate();

        assert_ne!(key1.key, key2.key);
        assert_ne!(key1.hash, key2.hash);
    }

    #[test]
    fn test_hash_matches_generated_key_only() {
        let generator = TempKeyGenerator::default();
        let generated = generator.generate();

        assert_eq!(generator.hash_key(&generated.key), generated.hash);
        assert_ne!(generator.hash_key("sk-helicone-wrong"), generated.hash);
    }
}
