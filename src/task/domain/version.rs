//! Persisted schema version.

use super::ValidationError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// `major.minor` version of the persisted document layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DataVersion {
    major: u16,
    minor: u16,
}

impl DataVersion {
    /// Layout written before timestamps and tags were mandatory.
    pub const V1_0: Self = Self::new(1, 0);
    /// Layout with mandatory `updatedAt` and `tags`.
    pub const V1_1: Self = Self::new(1, 1);
    /// Version written by this crate.
    pub const CURRENT: Self = Self::V1_1;

    /// Creates a version from its components.
    #[must_use]
    pub const fn new(major: u16, minor: u16) -> Self {
        Self { major, minor }
    }

    /// Returns the major component.
    #[must_use]
    pub const fn major(self) -> u16 {
        self.major
    }

    /// Returns the minor component.
    #[must_use]
    pub const fn minor(self) -> u16 {
        self.minor
    }
}

impl Default for DataVersion {
    fn default() -> Self {
        Self::CURRENT
    }
}

impl fmt::Display for DataVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for DataVersion {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let invalid = || ValidationError::InvalidDataVersion(value.to_owned());
        let (major_text, minor_text) = value.trim().split_once('.').ok_or_else(invalid)?;
        let major = major_text.parse().map_err(|_| invalid())?;
        let minor = minor_text.parse().map_err(|_| invalid())?;
        Ok(Self::new(major, minor))
    }
}

impl Serialize for DataVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DataVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
