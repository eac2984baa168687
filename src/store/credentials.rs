use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::RwLock;
use tracing::debug;

use crate::error::StoreError;
use crate::store::models::UserIdentity;

/// Keyed storage of user identities, email being the key.
///
/// Implementations synchronize internally; callers share them behind an `Arc`.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialStore: Send + Sync {
    /// True iff a record exists for `email`.
    fn exists(&self, email: &str) -> bool;

    /// Inserts a new record. Never overwrites an existing one.
    fn create(&self, identity: UserIdentity) -> Result<(), StoreError>;

    fn lookup(&self, email: &str) -> Result<UserIdentity, StoreError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    users: RwLock<HashMap<String, UserIdentity>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn exists(&self, email: &str) -> bool {
        self.users.read().contains_key(email)
    }

    fn create(&self, identity: UserIdentity) -> Result<(), StoreError> {
        let mut users = self.users.write();
        match users.entry(identity.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(identity);
                debug!("Stored new credential record ({} total)", users.len());
                Ok(())
            }
        }
    }

    fn lookup(&self, email: &str) -> Result<UserIdentity, StoreError> {
        self.users
            .read()
            .get(email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    fn len(&self) -> usize {
        self.users.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn identity(email: &str, hash: &str) -> UserIdentity {
        UserIdentity::new(email.to_string(), hash.to_string())
    }

    #[test]
    fn test_create_and_lookup() {
        let store = MemoryCredentialStore::new();
        assert!(store.is_empty());
        assert!(!store.exists("a@b.com"));

        store.create(identity("a@b.com", "hash1")).unwrap();

        assert!(store.exists("a@b.com"));
        assert_eq!(store.len(), 1);
        let found = store.lookup("a@b.com").unwrap();
        assert_eq!(found.email, "a@b.com");
        assert_eq!(found.password_hash, "hash1");
    }

    #[test]
    fn test_create_does_not_overwrite() {
        let store = MemoryCredentialStore::new();
        store.create(identity("a@b.com", "hash1")).unwrap();

        let result = store.create(identity("a@b.com", "hash2"));
        assert_eq!(result, Err(StoreError::AlreadyExists));
        assert_eq!(store.lookup("a@b.com").unwrap().password_hash, "hash1");
    }

    #[test]
    fn test_lookup_missing() {
        let store = MemoryCredentialStore::new();
        assert_eq!(store.lookup("nobody@b.com"), Err(StoreError::NotFound));
    }

    #[test]
    fn test_concurrent_create_same_key_single_winner() {
        let store = Arc::new(MemoryCredentialStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || store.create(identity("race@b.com", &format!("hash{}", i))))
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(wins, 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_concurrent_create_distinct_keys() {
        let store = Arc::new(MemoryCredentialStore::new());
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let store = store.clone();
                thread::spawn(move || {
                    store.create(identity(&format!("user{}@b.com", i), "hash"))
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap().unwrap();
        }
        assert_eq!(store.len(), 16);
    }
}
