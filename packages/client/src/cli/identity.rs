//! Own user id for self filtering.
//!
//! The gateway verifies the token; the client only reads the `id` claim to know
//! which relayed events are echoes of its own edits.

use jsonwebtoken::{DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;

use katagami_shared::protocol::UserId;

#[derive(Debug, Deserialize)]
struct IdClaim {
    id: UserId,
}

/// Read the `id` claim of an access token without checking its signature.
pub fn user_id_from_token(token: &str) -> Option<UserId> {
    let header = decode_header(token).ok()?;
    let mut validation = Validation::new(header.alg);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.required_spec_claims.clear();

    decode::<IdClaim>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|data| data.claims.id)
        .ok()
}

/// Explicit id first, then the token's `id` claim.
///
/// Without either, echoes of own edits are not filtered on the client.
pub fn resolve_user_id(explicit: Option<UserId>, token: &str) -> Option<UserId> {
    if explicit.is_some() {
        return explicit;
    }
    let from_token = user_id_from_token(token);
    if from_token.is_none() {
        tracing::warn!(
            "No user id given and none found in the token; own edits relayed back will not be filtered"
        );
    }
    from_token
}

#[cfg(test)]
mod tests {
    use super::*;
    use katagami_server::infrastructure::auth::issue_token;
    use katagami_shared::protocol::UserIdentity;

    fn token_for(user_id: UserId) -> String {
        issue_token(b"any-secret", &UserIdentity::new(user_id, "a@example.com"), 1).unwrap()
    }

    #[test]
    fn test_user_id_from_token() {
        // テスト項目: 署名や有効期限に関係なく id クレームを読み取れる
        // given (前提条件):
        let token = token_for(7);

        // when (操作):
        let user_id = user_id_from_token(&token);

        // then (期待する結果):
        assert_eq!(user_id, Some(7));
    }

    #[test]
    fn test_user_id_from_malformed_token() {
        // テスト項目: JWT でないトークンからは id を得られない
        assert_eq!(user_id_from_token("not-a-jwt"), None);
        assert_eq!(user_id_from_token(""), None);
    }

    #[test]
    fn test_resolve_user_id_prefers_explicit() {
        // テスト項目: 明示した id がトークンの id より優先され、どちらもなければ None
        // given (前提条件):
        let token = token_for(7);

        // when (操作):
        let explicit = resolve_user_id(Some(3), &token);
        let from_token = resolve_user_id(None, &token);
        let neither = resolve_user_id(None, "opaque-token");

        // then (期待する結果):
        assert_eq!(explicit, Some(3));
        assert_eq!(from_token, Some(7));
        assert_eq!(neither, None);
    }
}
