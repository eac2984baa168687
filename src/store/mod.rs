//! Storage layer for the authentication server
//!
//! Credential records and revoked tokens live behind traits so a
//! persistent backend can replace the in-memory maps without touching
//! the auth service.

pub mod credentials;
pub mod models;
pub mod revocation;

pub use credentials::{CredentialStore, MemoryCredentialStore};
pub use models::UserIdentity;
pub use revocation::{MemoryRevocationRegistry, RevocationRegistry};
