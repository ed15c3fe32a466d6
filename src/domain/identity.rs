use crc32fast::Hasher as Crc32;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque textual identity of a caller.
///
/// Identities key the settled-order map and the owner index, and every
/// mutation of a task is checked against its recorded owner identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ledger account address this identity pays from.
    pub fn address(&self) -> Address {
        Address(format!("acct-{}", self.0))
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A ledger account address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 32-bit digest used when the verifier compares addresses.
    ///
    /// Comparison by digest rather than byte-for-byte is a documented
    /// precision loss: two distinct addresses can collide under crc32 and
    /// incorrectly validate a payment. Kept for compatibility with existing
    /// payment flows.
    pub fn digest(&self) -> u32 {
        let mut hasher = Crc32::new();
        hasher.update(self.0.as_bytes());
        hasher.finalize()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
