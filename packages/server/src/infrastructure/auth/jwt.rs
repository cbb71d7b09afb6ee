//! HS256 JWT credential verifier.
//!
//! Tokens are issued by the account service with the claims `{ id, email, exp }`
//! and signed with a shared secret.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use katagami_shared::protocol::{UserId, UserIdentity};

use crate::domain::CredentialVerifier;

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub id: UserId,
    pub email: String,
    /// Expiry as Unix seconds
    pub exp: u64,
}

/// Verifies HS256-signed access tokens.
pub struct JwtCredentialVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtCredentialVerifier {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }
}

impl CredentialVerifier for JwtCredentialVerifier {
    fn verify(&self, token: &str) -> Option<UserIdentity> {
        match decode::<Claims>(token, &self.decoding_key, &self.validation) {
            Ok(data) => Some(UserIdentity::new(data.claims.id, data.claims.email)),
            Err(e) => {
                tracing::warn!("Token verification failed: {}", e);
                None
            }
        }
    }
}

/// Sign an access token for `identity` that expires at `expires_at` (Unix seconds).
pub fn issue_token(
    secret: &[u8],
    identity: &UserIdentity,
    expires_at: u64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let claims = Claims {
        id: identity.user_id,
        email: identity.email.clone(),
        exp: expires_at,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
}
