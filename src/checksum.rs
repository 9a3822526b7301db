//! Checksums for emitted artifacts

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// SHA-256 checksum of artifact text, lowercase hex
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    pub fn of_text(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        Self::of_text(content) == *self
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_known_value() {
        let checksum = Checksum::of_text("");
        assert_eq!(
            checksum.as_str(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(checksum.short(), "e3b0c44298fc");
    }

    #[test]
    fn test_checksum_different_content() {
        let a = Checksum::of_text("export type A = string;\n");
        let b = Checksum::of_text("export type B = string;\n");
        assert_ne!(a, b);
    }

    #[test]
    fn test_checksum_verification() {
        let content = "export const API_BASE_URL = \"/\";\n";
        let checksum = Checksum::of_text(content);
        assert!(checksum.verify(content));
        assert!(!checksum.verify("different content"));
        assert!(checksum.to_string().starts_with("sha256:"));
    }
}
