//! The identity verifier — raw credential in, principal snapshot out.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use campushub_core::error::ErrorKind;
use campushub_core::{AppError, AppResult};
use campushub_directory::DirectoryStore;
use campushub_entity::Principal;

use super::jwt::decoder::TokenDecoder;

/// Turns a raw credential string into an authenticated [`Principal`].
///
/// Must be invoked, and must succeed, before any other component touches
/// state for a connection.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify a credential. Authentication failures (invalid, expired,
    /// unknown, or inactive principal) carry `ErrorKind::Authentication`.
    async fn verify(&self, credential: &str) -> AppResult<Principal>;
}

/// JWT-backed identity verifier.
///
/// Decodes the token locally, then loads the principal snapshot from the
/// directory store so role, department, and memberships are current at
/// connect time.
pub struct JwtIdentityVerifier {
    decoder: TokenDecoder,
    directory: Arc<dyn DirectoryStore>,
}

impl std::fmt::Debug for JwtIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtIdentityVerifier").finish()
    }
}

impl JwtIdentityVerifier {
    /// Creates a new verifier.
    pub fn new(decoder: TokenDecoder, directory: Arc<dyn DirectoryStore>) -> Self {
        Self { decoder, directory }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> AppResult<Principal> {
        let claims = self.decoder.decode(credential)?;
        let principal_id = claims.principal_id();

        let principal = self
            .directory
            .fetch_principal(principal_id)
            .await
            .map_err(|e| match e.kind {
                // Unknown principal is an auth failure; a store outage is not.
                ErrorKind::NotFound => {
                    AppError::authentication(format!("Unknown principal: {principal_id}"))
                }
                _ => e,
            })?;

        if !principal.active {
            debug!(principal_id = %principal_id, "Rejected inactive principal");
            return Err(AppError::authentication("Principal is inactive"));
        }

        Ok(principal)
    }
}
