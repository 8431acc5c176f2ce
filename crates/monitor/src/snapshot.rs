//! One round's view of the node: pox state, latest block and the signer sets.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Signer public key as reported by the node (`0x`-prefixed hex, compressed secp256k1).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignerKey(pub String);

/// Length of a compressed secp256k1 public key.
pub const SIGNER_KEY_LEN: usize = 33;

impl SignerKey {
    /// Raw key bytes, if the key is well-formed hex.
    pub fn to_bytes(&self) -> Option<Vec<u8>> {
        hex::decode(self.0.strip_prefix("0x").unwrap_or(&self.0)).ok()
    }

    pub fn is_well_formed(&self) -> bool {
        self.to_bytes().is_some_and(|b| b.len() == SIGNER_KEY_LEN)
    }
}

impl fmt::Display for SignerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Signer set for one reward cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignerSet {
    pub signers: Vec<SignerKey>,
}

impl SignerSet {
    pub fn new(signers: Vec<SignerKey>) -> Self {
        Self { signers }
    }

    pub fn len(&self) -> usize {
        self.signers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signers.is_empty()
    }

    /// Keys that are not hex-encoded compressed public keys. They still count as signers.
    pub fn malformed_keys(&self) -> usize {
        self.signers.iter().filter(|k| !k.is_well_formed()).count()
    }
}

/// Composite node state fetched in one round. `None` signer sets mean the lookup failed,
/// which is distinct from a set that was fetched and is empty.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub burn_height: u64,
    pub reward_cycle_id: u64,
    pub stx_height: u64,
    pub tx_count: u64,
    pub current_signers: Option<SignerSet>,
    pub next_signers: Option<SignerSet>,
    pub next_cycle_id: u64,
    pub observed_at: Instant,
}

impl Snapshot {
    /// Current signer count for display; unreachable counts as 0.
    pub fn current_signer_count(&self) -> usize {
        self.current_signers.as_ref().map_or(0, SignerSet::len)
    }

    pub fn next_signer_count(&self) -> Option<usize> {
        self.next_signers.as_ref().map(SignerSet::len)
    }
}
