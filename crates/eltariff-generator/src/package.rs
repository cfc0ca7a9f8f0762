//! The generated package and its digests

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// A deployable API package, path to file content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedPackage {
    /// Schema version the package serves
    pub schema_version: String,

    /// Container and crate name
    pub service_name: String,

    /// Files by relative path
    pub files: BTreeMap<String, String>,

    /// SHA-256 of each file, hex
    pub digests: BTreeMap<String, String>,

    /// SHA-256 over every path and file digest, hex
    pub digest: String,
}

impl GeneratedPackage {
    /// Assemble a package and compute its digests
    pub fn new(schema_version: impl Into<String>, service_name: impl Into<String>, files: BTreeMap<String, String>) -> Self {
        let digests: BTreeMap<String, String> = files
            .iter()
            .map(|(path, content)| (path.clone(), sha256_hex(content.as_bytes())))
            .collect();
        let digest = package_digest(&digests);
        Self {
            schema_version: schema_version.into(),
            service_name: service_name.into(),
            files,
            digests,
            digest,
        }
    }

    /// Content of one file
    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    /// Relative paths in order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Checksum listing in `sha256sum` format
    pub fn checksums(&self) -> String {
        self.digests
            .iter()
            .map(|(path, digest)| format!("{}  {}\n", digest, path))
            .collect()
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

fn package_digest(digests: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    for (path, digest) in digests {
        hasher.update(path.as_bytes());
        hasher.update([0u8]);
        hasher.update(digest.as_bytes());
        hasher.update(b"\n");
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn files(readme: &str) -> BTreeMap<String, String> {
        BTreeMap::from([
            ("README.md".to_string(), readme.to_string()),
            ("tariffs.json".to_string(), "{}".to_string()),
        ])
    }

    #[test]
    fn test_file_digests() {
        let package = GeneratedPackage::new("0.1.0", "exempel-nat-ab", files(""));
        assert_eq!(
            package.digests["README.md"],
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(package.paths().collect::<Vec<_>>(), vec!["README.md", "tariffs.json"]);
        assert!(package.checksums().starts_with("e3b0c442"));
        assert!(package.checksums().ends_with("  tariffs.json\n"));
    }

    #[test]
    fn test_package_digest_tracks_content() {
        let a = GeneratedPackage::new("0.1.0", "x", files("a"));
        let b = GeneratedPackage::new("0.1.0", "x", files("a"));
        let c = GeneratedPackage::new("0.1.0", "x", files("b"));
        assert_eq!(a.digest, b.digest);
        assert_ne!(a.digest, c.digest);
    }
}
