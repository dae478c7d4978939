//! JWT claims structure used in access tokens.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use campushub_core::types::id::PrincipalId;

/// JWT claims payload embedded in every access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject — the principal ID.
    pub sub: Uuid,
    /// Issued-at timestamp (seconds since epoch).
    pub iat: i64,
    /// Expiration timestamp (seconds since epoch).
    pub exp: i64,
    /// JWT ID.
    pub jti: Uuid,
}

impl Claims {
    /// Returns the principal ID from the subject claim.
    pub fn principal_id(&self) -> PrincipalId {
        PrincipalId::from(self.sub)
    }
}
