//! Datastore identifiers and small value types

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::XmldbError;

/// Symbolic datastore name
///
/// The set is closed: an unrecognized name is rejected when parsed rather
/// than silently registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreName {
    /// Active configuration
    Running,
    /// Scratch configuration, committed into running
    Candidate,
    /// Configuration loaded at boot
    Startup,
    /// Temporary store used during commit and validation
    Tmp,
}

impl StoreName {
    /// All datastores, in registry order
    pub const ALL: [StoreName; 4] = [
        StoreName::Running,
        StoreName::Candidate,
        StoreName::Startup,
        StoreName::Tmp,
    ];

    /// Name as used on the wire and in file names
    pub fn as_str(self) -> &'static str {
        match self {
            StoreName::Running => "running",
            StoreName::Candidate => "candidate",
            StoreName::Startup => "startup",
            StoreName::Tmp => "tmp",
        }
    }
}

impl fmt::Display for StoreName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreName {
    type Err = XmldbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(StoreName::Running),
            "candidate" => Ok(StoreName::Candidate),
            "startup" => Ok(StoreName::Startup),
            "tmp" => Ok(StoreName::Tmp),
            other => Err(XmldbError::UnknownStore(other.to_string())),
        }
    }
}

/// Management session identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u32);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// On-disk state of a backing file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Existence {
    /// No file
    Absent,
    /// Zero-length file, still counted as not existing
    Empty,
    /// File with content
    Present,
}

impl Existence {
    /// Collapse to the boolean existence result
    pub fn is_present(self) -> bool {
        self == Existence::Present
    }
}
