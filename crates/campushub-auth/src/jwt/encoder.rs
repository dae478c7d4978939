//! JWT token issuance.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use campushub_core::config::auth::AuthConfig;
use campushub_core::types::id::PrincipalId;
use campushub_core::{AppError, AppResult};

use super::claims::Claims;

/// Issues signed access tokens.
///
/// Lives next to the decoder so the two always agree on algorithm and
/// claim layout; production issuance happens in the portal's login
/// service, tests mint tokens directly.
#[derive(Clone)]
pub struct TokenEncoder {
    encoding_key: EncodingKey,
    access_ttl: Duration,
}

impl std::fmt::Debug for TokenEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenEncoder").finish()
    }
}

impl TokenEncoder {
    /// Creates a new encoder from auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.jwt_secret.as_bytes()),
            access_ttl: Duration::minutes(config.jwt_access_ttl_minutes as i64),
        }
    }

    /// Issues an access token for the given principal.
    pub fn issue(&self, principal_id: PrincipalId) -> AppResult<String> {
        self.issue_with_ttl(principal_id, self.access_ttl)
    }

    /// Issues an access token with an explicit TTL (may be negative to
    /// mint already-expired tokens in tests).
    pub fn issue_with_ttl(&self, principal_id: PrincipalId, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: principal_id.into_uuid(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::new_v4(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Token encoding failed: {e}")))
    }
}
