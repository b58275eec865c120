use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque identifier of a calling participant.
/// The authentication layer owns its meaning; the ledger only compares it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Identity {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl From<String> for Identity {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Capability that issues unique record ids.
/// Injected into the service so tests can substitute a deterministic source.
pub trait IdGen: Send + Sync {
    fn next_id(&self) -> String;
}

/// Production id source backed by random UUIDs.
/// Issued ids are never reused, even after the record they named is removed.
#[derive(Debug, Default)]
pub struct UuidIds;

impl IdGen for UuidIds {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
