//! In-memory endpoint store
//!
//! Plain owned map from token to endpoint set. Locking is the caller's
//! concern; see [`crate::registry::PresenceRegistry`].

use std::collections::HashMap;
use tether_rpc::{Endpoint, EndpointSet};

use crate::error::{RegistryError, Result};

#[derive(Debug, Default)]
pub struct EndpointStore {
    entries: HashMap<String, EndpointSet>,
}

/// What a join did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinOutcome {
    /// The token did not exist before this join
    pub created: bool,
    /// The endpoint was appended (false when it was already a member)
    pub added: bool,
}

/// What a leave did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeaveOutcome {
    /// The set became empty and the token was removed
    pub dismissed: bool,
    pub remaining: usize,
}

impl EndpointStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, token: &str) -> Option<&EndpointSet> {
        self.entries.get(token)
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bind `token` to exactly `{endpoint}`, replacing any previous binding.
    /// Returns the replaced set, if any.
    pub fn bind(&mut self, token: &str, endpoint: Endpoint) -> Option<EndpointSet> {
        self.entries.insert(token.to_string(), vec![endpoint])
    }

    pub fn remove(&mut self, token: &str) -> Result<EndpointSet> {
        self.entries
            .remove(token)
            .ok_or_else(|| RegistryError::UnknownToken(token.to_string()))
    }

    /// Add `endpoint` to the token's set, creating the token if needed.
    /// An endpoint already in the set is not added twice.
    pub fn join(&mut self, token: &str, endpoint: Endpoint) -> JoinOutcome {
        let created = !self.entries.contains_key(token);
        let members = self.entries.entry(token.to_string()).or_default();

        let added = !members.contains(&endpoint);
        if added {
            members.push(endpoint);
        }

        JoinOutcome { created, added }
    }

    /// Remove `endpoint` from the token's set; an emptied set removes the token.
    pub fn leave(&mut self, token: &str, endpoint: &Endpoint) -> Result<LeaveOutcome> {
        let members = self
            .entries
            .get_mut(token)
            .ok_or_else(|| RegistryError::UnknownToken(token.to_string()))?;

        let idx = members
            .iter()
            .position(|m| m == endpoint)
            .ok_or_else(|| RegistryError::NotMember {
                token: token.to_string(),
                endpoint: endpoint.to_string(),
            })?;
        members.remove(idx);

        let remaining = members.len();
        if remaining == 0 {
            self.entries.remove(token);
        }

        Ok(LeaveOutcome {
            dismissed: remaining == 0,
            remaining,
        })
    }
}
