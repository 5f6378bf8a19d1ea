//! Strong type definitions for the Berth registry.
//!
//! Identifiers carry their own grammar so that malformed values are
//! rejected at the boundary instead of deep inside the store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;

/// A reverse-domain package identifier, e.g. `com.example.app`.
///
/// Grammar: `[a-z0-9]+(\.[a-z0-9-]+)+`: at least two dot-separated
/// segments, first segment alphanumeric only.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackageId(String);

impl PackageId {
    /// Parse and validate a package id.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let mut segments = s.split('.');

        // split always yields at least one element
        let first = segments.next().unwrap_or("");
        if first.is_empty()
            || !first
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(ValidationError::InvalidPackageId(s.to_string()));
        }

        let mut rest = 0;
        for seg in segments {
            if seg.is_empty()
                || !seg
                    .chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
            {
                return Err(ValidationError::InvalidPackageId(s.to_string()));
            }
            rest += 1;
        }
        if rest == 0 {
            return Err(ValidationError::InvalidPackageId(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PackageId({})", self.0)
    }
}

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for PackageId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PackageId {
    type Error = ValidationError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<PackageId> for String {
    fn from(id: PackageId) -> Self {
        id.0
    }
}

/// The unique, immutable key of one published entity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityKey {
    pub id: String,
    pub version: String,
}

impl EntityKey {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.version)
    }
}

/// A versioned interface tag, `<name>@<major>`, e.g. `wallet.sign@1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceTag {
    pub name: String,
    pub major: u32,
}

impl InterfaceTag {
    /// Parse `<name>@<int>`; the name must be non-empty and `@`-free.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let (name, major) = s
            .split_once('@')
            .ok_or_else(|| ValidationError::InvalidInterfaceTag(s.to_string()))?;
        if name.is_empty() || name.contains(char::is_whitespace) || major.is_empty() {
            return Err(ValidationError::InvalidInterfaceTag(s.to_string()));
        }
        let major: u32 = major
            .parse()
            .map_err(|_| ValidationError::InvalidInterfaceTag(s.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            major,
        })
    }
}

impl fmt::Display for InterfaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.name, self.major)
    }
}

/// A content digest in `sha256:<64 hex>` text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DigestRef(String);

impl DigestRef {
    /// Parse and validate the `sha256:` + 64-hex-chars format.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        let hex_part = s
            .strip_prefix("sha256:")
            .ok_or_else(|| ValidationError::InvalidDigest(s.to_string()))?;
        if hex_part.len() != 64 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ValidationError::InvalidDigest(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DigestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
