//! Identifier newtypes shared between the formula model and the pipeline.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

/// A normalized formula name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FormulaName(String);

impl FormulaName {
    /// Create a new formula name, normalizing the input to lowercase.
    pub fn new(name: &str) -> Self {
        Self(name.to_lowercase())
    }

    /// Return the normalized name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::ffi::OsStr> for FormulaName {
    fn as_ref(&self) -> &std::ffi::OsStr {
        self.0.as_ref()
    }
}

impl AsRef<std::path::Path> for FormulaName {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl std::fmt::Display for FormulaName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for FormulaName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for FormulaName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for FormulaName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl PartialEq<&str> for FormulaName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == other.to_lowercase()
    }
}

impl Borrow<str> for FormulaName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FormulaName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for FormulaName {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

/// A version string, ordered by semver when both sides parse as semver.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Version(String);

impl Ord for Version {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (
            semver::Version::parse(&self.0),
            semver::Version::parse(&other.0),
        ) {
            (Ok(a), Ok(b)) => a.cmp(&b),
            (Ok(_), Err(_)) => std::cmp::Ordering::Less,
            (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Version {
    /// Create a new version from the given string (stored as-is).
    pub fn new(v: &str) -> Self {
        Self(v.to_string())
    }

    /// Return the version string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for Version {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for Version {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<std::path::Path> for Version {
    fn as_ref(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

impl From<&str> for Version {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Version {
    fn from(s: String) -> Self {
        Self::new(&s)
    }
}

impl PartialEq<str> for Version {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for Version {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Errors that can occur when constructing a [`Sha256Digest`].
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// The digest string is not exactly 64 characters long.
    #[error("Invalid SHA256 length: expected 64 chars, got {0}")]
    InvalidLength(usize),

    /// The digest string contains a character outside `[0-9a-f]`.
    #[error("Invalid SHA256 digest: non-hex character {0:?}")]
    NonHex(char),
}

/// A SHA-256 digest in lowercase hex form.
///
/// Construction validates shape (64 lowercase hex chars), so a held digest
/// can always be compared byte-for-byte against `hex::encode` output.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha256Digest(String);

impl Sha256Digest {
    /// Parse a digest from a hex string, normalizing to lowercase.
    pub fn parse(s: &str) -> Result<Self, DigestError> {
        if s.len() != 64 {
            return Err(DigestError::InvalidLength(s.len()));
        }
        let lower = s.to_lowercase();
        if let Some(c) = lower.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(DigestError::NonHex(c));
        }
        Ok(Self(lower))
    }

    /// Return the digest as a lowercase hex string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a freshly computed hex digest.
    pub fn matches(&self, computed_hex: &str) -> bool {
        self.0 == computed_hex.to_lowercase()
    }
}

impl std::fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for Sha256Digest {
    type Error = DigestError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Sha256Digest> for String {
    fn from(d: Sha256Digest) -> Self {
        d.0
    }
}

impl std::str::FromStr for Sha256Digest {
    type Err = DigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
