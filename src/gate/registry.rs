//! Owner registry
//!
//! The fixed set of owners allowed to act on the gate, plus the quorum
//! threshold (M in M-of-N). Immutable once constructed.

use crate::gate::{GateError, Principal};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Owners and quorum threshold for a gate
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(try_from = "RawRegistry")]
pub struct OwnerRegistry {
    /// Owners in construction order
    members: Vec<Principal>,
    /// Minimum distinct approvals required to execute
    threshold: usize,
    /// Membership index over `members`
    #[serde(skip)]
    index: HashSet<Principal>,
}

#[derive(Deserialize)]
struct RawRegistry {
    members: Vec<Principal>,
    threshold: usize,
}

impl TryFrom<RawRegistry> for OwnerRegistry {
    type Error = GateError;

    fn try_from(raw: RawRegistry) -> Result<Self, Self::Error> {
        Self::new(raw.members, raw.threshold)
    }
}

impl OwnerRegistry {
    /// Create a registry
    ///
    /// # Arguments
    /// * `members` - Distinct owner identities, in display order
    /// * `threshold` - Approvals required before execution
    ///
    /// # Errors
    /// Returns `InvalidConfiguration` if the owner list is empty, contains
    /// a duplicate, or the threshold is outside `1..=members.len()`
    pub fn new(members: Vec<Principal>, threshold: usize) -> Result<Self, GateError> {
        if members.is_empty() {
            return Err(GateError::InvalidConfiguration(
                "owner list must not be empty".to_string(),
            ));
        }

        if threshold == 0 {
            return Err(GateError::InvalidConfiguration(
                "threshold must be at least 1".to_string(),
            ));
        }

        if threshold > members.len() {
            return Err(GateError::InvalidConfiguration(format!(
                "threshold {} exceeds owner count {}",
                threshold,
                members.len()
            )));
        }

        let mut index = HashSet::with_capacity(members.len());
        for member in &members {
            if !index.insert(member.clone()) {
                return Err(GateError::InvalidConfiguration(format!(
                    "duplicate owner {}",
                    member
                )));
            }
        }

        Ok(Self {
            members,
            threshold,
            index,
        })
    }

    /// Build a registry from raw identity strings
    ///
    /// Null or malformed identities are reported as `InvalidConfiguration`.
    pub fn from_strings<S: AsRef<str>>(
        members: &[S],
        threshold: usize,
    ) -> Result<Self, GateError> {
        let members = members
            .iter()
            .map(|m| {
                Principal::parse(m.as_ref()).map_err(|e| {
                    GateError::InvalidConfiguration(format!("invalid owner: {}", e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(members, threshold)
    }

    /// Check if a principal is an owner
    pub fn is_member(&self, principal: &Principal) -> bool {
        self.index.contains(principal)
    }

    /// Owners in construction order
    pub fn members(&self) -> &[Principal] {
        &self.members
    }

    /// Get the threshold (M)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Get the owner count (N)
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Get description like "2-of-3"
    pub fn description(&self) -> String {
        format!("{}-of-{}", self.threshold, self.members.len())
    }
}
