//! Supabase access token verification (HS256)

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use uuid::Uuid;

use super::AuthError;

type HmacSha256 = Hmac<Sha256>;

/// JWT claims from Supabase auth token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: u64,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Verify a token's signature and expiry against `now` (Unix seconds)
pub fn verify_jwt(token: &str, secret: &str, now: u64) -> Result<JwtClaims, AuthError> {
    let (signed, signature_b64) = token.rsplit_once('.').ok_or(AuthError::InvalidToken)?;
    if signed.split('.').count() != 2 {
        return Err(AuthError::InvalidToken);
    }

    let provided = URL_SAFE_NO_PAD
        .decode(signature_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| AuthError::InvalidToken)?;
    mac.update(signed.as_bytes());
    mac.verify_slice(&provided)
        .map_err(|_| AuthError::InvalidToken)?;

    let claims = decode_claims(token)?;
    if claims.exp < now {
        return Err(AuthError::TokenExpired);
    }
    Ok(claims)
}

/// Read the claims without checking the signature
pub fn decode_claims(token: &str) -> Result<JwtClaims, AuthError> {
    let payload_b64 = token.split('.').nth(1).ok_or(AuthError::InvalidToken)?;
    let payload = URL_SAFE_NO_PAD
        .decode(payload_b64)
        .map_err(|_| AuthError::InvalidToken)?;
    serde_json::from_slice(&payload).map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
pub(crate) fn sign_for_test(claims: &serde_json::Value, secret: &str) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let signed = format!("{}.{}", header, payload);
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(signed.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    format!("{}.{}", signed, signature)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SECRET: &str = "super-secret-jwt-token";

    fn token(exp: u64) -> (Uuid, String) {
        let user = Uuid::new_v4();
        let claims = json!({ "sub": user, "exp": exp, "email": "a@b.c", "role": "authenticated" });
        (user, sign_for_test(&claims, SECRET))
    }

    #[test]
    fn accepts_a_valid_token() {
        let (user, token) = token(2_000);
        let claims = verify_jwt(&token, SECRET, 1_000).unwrap();
        assert_eq!(claims.sub, user);
        assert_eq!(claims.email.as_deref(), Some("a@b.c"));
    }

    #[test]
    fn rejects_expired_tokens() {
        let (_, token) = token(999);
        assert!(matches!(verify_jwt(&token, SECRET, 1_000), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn rejects_wrong_secret_and_tampering() {
        let (_, token) = token(2_000);
        assert!(matches!(verify_jwt(&token, "other", 1_000), Err(AuthError::InvalidToken)));

        let mut tampered = token.clone();
        tampered.insert(tampered.find('.').unwrap() + 2, 'x');
        assert!(verify_jwt(&tampered, SECRET, 1_000).is_err());
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(verify_jwt("abc", SECRET, 0).is_err());
        assert!(verify_jwt("a.b", SECRET, 0).is_err());
        assert!(verify_jwt("a.b.c.d", SECRET, 0).is_err());
    }

    #[test]
    fn decodes_without_verification() {
        let (user, token) = token(5);
        assert_eq!(decode_claims(&token).unwrap().sub, user);
    }
}
