// Copyright (c) 2025 - Cowboy AI, Inc.
//! Name Value Objects
//!
//! - [`LogicalName`] identifies a resource inside one graph
//! - [`DomainName`] is a DNS name the public entry point is published under

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Name validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("Name is empty")]
    Empty,

    #[error("Name exceeds maximum length of {max} characters: {actual}")]
    TooLong { max: usize, actual: usize },

    #[error("Invalid character {ch:?} in name: {name}")]
    InvalidCharacter { ch: char, name: String },

    #[error("Name must start with a letter: {0}")]
    InvalidStart(String),

    #[error("Segment cannot be empty or start/end with a hyphen: {0}")]
    InvalidSegment(String),

    #[error("Top-level label cannot be all numeric: {0}")]
    NumericLabel(String),
}

/// Logical resource name, unique within one resource graph
///
/// Invariants:
/// - 1-128 characters
/// - Lowercase ASCII letters, digits and hyphens only
/// - Starts with a letter
/// - No empty segments (no leading/trailing or doubled hyphens)
///
/// # Examples
///
/// ```rust
/// use goals_infrastructure::domain::LogicalName;
///
/// let name = LogicalName::new("network-vpc").unwrap();
/// assert_eq!(name.child("igw").unwrap().as_str(), "network-vpc-igw");
/// assert!(LogicalName::new("Network").is_err());
/// assert!(LogicalName::new("vpc--1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalName(String);

impl LogicalName {
    /// Maximum length of a logical name
    pub const MAX_LENGTH: usize = 128;

    /// Create a logical name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into();

        if name.is_empty() {
            return Err(NameError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: name.len(),
            });
        }

        if let Some(ch) = name
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-'))
        {
            return Err(NameError::InvalidCharacter { ch, name });
        }

        if !name.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(NameError::InvalidStart(name));
        }

        if name.split('-').any(str::is_empty) {
            return Err(NameError::InvalidSegment(name));
        }

        Ok(Self(name))
    }

    /// Derive a child name (`parent-suffix`)
    ///
    /// The suffix is normalized to lowercase and every character outside
    /// `[a-z0-9]` collapses to a single hyphen.
    ///
    /// # Errors
    /// [`NameError::InvalidSegment`] when the suffix has no letter or digit,
    /// [`NameError::TooLong`] when the result exceeds [`Self::MAX_LENGTH`].
    pub fn child(&self, suffix: impl AsRef<str>) -> Result<LogicalName, NameError> {
        let mut name = self.0.clone();
        let mut pending_hyphen = true;
        for ch in suffix.as_ref().chars() {
            let ch = ch.to_ascii_lowercase();
            if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
                if pending_hyphen {
                    name.push('-');
                    pending_hyphen = false;
                }
                name.push(ch);
            } else {
                pending_hyphen = true;
            }
        }

        if name.len() == self.0.len() {
            return Err(NameError::InvalidSegment(suffix.as_ref().to_string()));
        }
        if name.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: name.len(),
            });
        }
        Ok(LogicalName(name))
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for LogicalName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::borrow::Borrow<str> for LogicalName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LogicalName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LogicalName {
    type Error = NameError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LogicalName> for String {
    fn from(value: LogicalName) -> Self {
        value.0
    }
}

/// DNS domain name (RFC 1123), stored in canonical lowercase form
///
/// Invariants:
/// - Total length ≤ 253 characters
/// - Each label 1-63 characters of alphanumerics and hyphens
/// - Labels cannot start or end with hyphens
/// - The top-level label cannot be all numeric
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DomainName(String);

impl DomainName {
    /// Maximum total length (RFC 1123)
    pub const MAX_LENGTH: usize = 253;

    /// Maximum length of a single label (RFC 1123)
    pub const MAX_LABEL_LENGTH: usize = 63;

    /// Create a domain name with validation
    pub fn new(name: impl Into<String>) -> Result<Self, NameError> {
        let name = name.into().to_ascii_lowercase();

        if name.is_empty() {
            return Err(NameError::Empty);
        }

        if name.len() > Self::MAX_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LENGTH,
                actual: name.len(),
            });
        }

        let labels: Vec<&str> = name.split('.').collect();
        for label in &labels {
            Self::validate_label(label)?;
        }

        if let Some(tld) = labels.last() {
            if tld.chars().all(|c| c.is_ascii_digit()) {
                return Err(NameError::NumericLabel(tld.to_string()));
            }
        }

        Ok(Self(name))
    }

    fn validate_label(label: &str) -> Result<(), NameError> {
        if label.is_empty() || label.starts_with('-') || label.ends_with('-') {
            return Err(NameError::InvalidSegment(label.to_string()));
        }

        if label.len() > Self::MAX_LABEL_LENGTH {
            return Err(NameError::TooLong {
                max: Self::MAX_LABEL_LENGTH,
                actual: label.len(),
            });
        }

        if let Some(ch) = label
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-')
        {
            return Err(NameError::InvalidCharacter {
                ch,
                name: label.to_string(),
            });
        }

        Ok(())
    }

    /// Prefix this domain with one more label (`label.domain`)
    pub fn subdomain(&self, label: &str) -> Result<DomainName, NameError> {
        Self::new(format!("{}.{}", label, self.0))
    }

    /// Get the domain as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for DomainName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DomainName> for String {
    fn from(value: DomainName) -> Self {
        value.0
    }
}
