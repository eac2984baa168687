//! Authentication module
//!
//! Token lifecycle (sign-up, sign-in, refresh, revoke, validation), the
//! HS256 token codec, password hashing and the HTTP endpoints on top.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod service;
pub mod token;
pub mod validation;

pub use extractor::AuthenticatedUser;
pub use service::{AuthService, Credentials};
pub use token::{Claims, TokenCodec};
