// ABOUTME: Content-addressed image digests used for version comparison.
// ABOUTME: Parses plain digests and repo@digest entries from RepoDigests.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDigestError {
    #[error("digest is missing the algorithm prefix: {0}")]
    MissingAlgorithm(String),

    #[error("digest has an empty hex part: {0}")]
    EmptyHex(String),

    #[error("invalid hex character in digest: '{0}'")]
    InvalidHex(char),
}

/// A manifest digest such as `sha256:4c0f…`.
///
/// Two images are the same version iff their digests are equal. Comparison is
/// on the full algorithm and hex value; hex is normalized to lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageDigest {
    algorithm: String,
    hex: String,
}

impl ImageDigest {
    pub fn parse(input: &str) -> Result<Self, ParseDigestError> {
        let input = input.trim();
        let (algorithm, hex) = input
            .split_once(':')
            .filter(|(algorithm, _)| !algorithm.is_empty())
            .ok_or_else(|| ParseDigestError::MissingAlgorithm(input.to_string()))?;

        if hex.is_empty() {
            return Err(ParseDigestError::EmptyHex(input.to_string()));
        }
        if let Some(c) = hex.chars().find(|c| !c.is_ascii_hexdigit()) {
            return Err(ParseDigestError::InvalidHex(c));
        }

        Ok(Self {
            algorithm: algorithm.to_ascii_lowercase(),
            hex: hex.to_ascii_lowercase(),
        })
    }

    /// Parse a `RepoDigests` entry of the form `repository@algorithm:hex`.
    ///
    /// Returns the repository part alongside the digest.
    pub fn parse_repo_digest(entry: &str) -> Result<(&str, Self), ParseDigestError> {
        let (repository, digest) = entry
            .rsplit_once('@')
            .ok_or_else(|| ParseDigestError::MissingAlgorithm(entry.to_string()))?;
        Ok((repository, Self::parse(digest)?))
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// Abbreviated form for tables: the first 12 hex characters.
    pub fn short(&self) -> &str {
        &self.hex[..self.hex.len().min(12)]
    }
}

impl fmt::Display for ImageDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

impl std::str::FromStr for ImageDigest {
    type Err = ParseDigestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ImageDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_string().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ImageDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
