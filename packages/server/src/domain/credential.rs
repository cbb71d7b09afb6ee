//! Credential verification seam.
//!
//! Token issuance and signature checks belong to the account subsystem; the
//! gateway only needs to turn a bearer token into a user identity.

use katagami_shared::protocol::UserIdentity;

/// Verifies bearer credentials presented at connect time.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialVerifier: Send + Sync {
    /// `None` if the token is not acceptable.
    fn verify(&self, token: &str) -> Option<UserIdentity>;
}

/// Pick the bearer credential from the `token` query parameter, falling back to
/// an `Authorization: Bearer <token>` header. Blank values count as absent.
pub fn extract_bearer_token(
    query_token: Option<&str>,
    authorization: Option<&str>,
) -> Option<String> {
    if let Some(token) = query_token.map(str::trim).filter(|t| !t.is_empty()) {
        return Some(token.to_string());
    }

    authorization
        .and_then(|header| header.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}
