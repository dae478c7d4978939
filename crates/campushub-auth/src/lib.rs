//! # campushub-auth
//!
//! Credential verification for CampusHub. Connections present a JWT at
//! handshake time; the [`verifier::IdentityVerifier`] turns it into a
//! [`campushub_entity::Principal`] snapshot or rejects the handshake.
//!
//! Token *issuance* belongs to the portal's login service and is out of
//! scope — the encoder here exists for that service and for tests.

pub mod jwt;
pub mod verifier;

pub use jwt::{Claims, TokenDecoder, TokenEncoder};
pub use verifier::{IdentityVerifier, JwtIdentityVerifier};
