//! Policy - DeletionPolicy and UpdateReplacePolicy attributes
//!
//! Spellings match CloudFormation's template vocabulary exactly.
//! An unset policy is represented by `None` at the use site.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a policy string is not part of CloudFormation's vocabulary
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown {attribute} '{value}', expected one of: Retain, Delete, Snapshot")]
pub struct PolicyParseError {
    pub attribute: &'static str,
    pub value: String,
}

/// What CloudFormation does with a resource removed from the template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeletionPolicy {
    Retain,
    Delete,
    Snapshot,
}

impl DeletionPolicy {
    pub const ALL: [DeletionPolicy; 3] = [
        DeletionPolicy::Retain,
        DeletionPolicy::Delete,
        DeletionPolicy::Snapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DeletionPolicy::Retain => "Retain",
            DeletionPolicy::Delete => "Delete",
            DeletionPolicy::Snapshot => "Snapshot",
        }
    }
}

impl fmt::Display for DeletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeletionPolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PolicyParseError {
                attribute: "DeletionPolicy",
                value: s.to_string(),
            })
    }
}

/// What CloudFormation does with the old physical resource when an update replaces it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateReplacePolicy {
    Retain,
    Delete,
    Snapshot,
}

impl UpdateReplacePolicy {
    pub const ALL: [UpdateReplacePolicy; 3] = [
        UpdateReplacePolicy::Retain,
        UpdateReplacePolicy::Delete,
        UpdateReplacePolicy::Snapshot,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateReplacePolicy::Retain => "Retain",
            UpdateReplacePolicy::Delete => "Delete",
            UpdateReplacePolicy::Snapshot => "Snapshot",
        }
    }
}

impl fmt::Display for UpdateReplacePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UpdateReplacePolicy {
    type Err = PolicyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| PolicyParseError {
                attribute: "UpdateReplacePolicy",
                value: s.to_string(),
            })
    }
}
