use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Set of tokens invalidated before their natural expiry.
#[cfg_attr(test, mockall::automock)]
pub trait RevocationRegistry: Send + Sync {
    /// Records `token` as revoked. Revoking twice has no further effect.
    ///
    /// `expires_at` (unix seconds) is when the entry may be purged. Every
    /// entry carries one, so the registry never grows without bound. Returns
    /// true only for the call that actually inserted the entry.
    fn revoke(&self, token: &str, expires_at: i64) -> bool;

    /// Reflects every `revoke` that completed before this call, from any thread.
    fn is_revoked(&self, token: &str) -> bool;

    /// Drops entries whose token has expired by `now` (unix seconds).
    /// Returns how many were removed.
    fn purge_expired(&self, now: i64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

type Fingerprint = [u8; 32];

fn fingerprint(token: &str) -> Fingerprint {
    Sha256::digest(token.as_bytes()).into()
}

/// In-memory registry keyed by the SHA-256 digest of the token string.
#[derive(Debug, Default)]
pub struct MemoryRevocationRegistry {
    entries: RwLock<HashMap<Fingerprint, i64>>,
}

impl MemoryRevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RevocationRegistry for MemoryRevocationRegistry {
    fn revoke(&self, token: &str, expires_at: i64) -> bool {
        match self.entries.write().entry(fingerprint(token)) {
            Entry::Occupied(mut slot) => {
                if *slot.get() < expires_at {
                    slot.insert(expires_at);
                }
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(expires_at);
                true
            }
        }
    }

    fn is_revoked(&self, token: &str) -> bool {
        self.entries.read().contains_key(&fingerprint(token))
    }

    fn purge_expired(&self, now: i64) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        let removed = before - entries.len();
        if removed > 0 {
            debug!("Purged {} expired revocation entries", removed);
        }
        removed
    }

    fn len(&self) -> usize {
        self.entries.read().len()
    }
}
