use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Claims this service reads from a bearer token. The full claim set is kept
/// alongside so it can be forwarded verbatim to the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub role: Option<String>,
    pub exp: i64,
}

/// Settings needed to verify bearer tokens
#[derive(Debug, Clone)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>, jwt_audience: impl Into<String>) -> Self {
        let audience: String = jwt_audience.into();
        Self {
            jwt_secret: jwt_secret.into(),
            jwt_audience: Some(audience).filter(|a| !a.is_empty()),
        }
    }

    pub fn from_config() -> Self {
        let security = &crate::config::config().security;
        Self::new(security.jwt_secret.clone(), security.jwt_audience.clone())
    }
}

/// Authenticated caller, injected into request extensions by the auth middleware
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub role: Option<String>,
    /// Raw verified claims, forwarded to the database for row-level policies
    pub claims: Value,
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT secret not configured")]
    InvalidSecret,
    #[error("Invalid JWT token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("Invalid JWT claims: {0}")]
    InvalidClaims(#[from] serde_json::Error),
}

/// Verify a bearer token and return the caller it identifies
pub fn verify_token(token: &str, settings: &AuthSettings) -> Result<AuthUser, JwtError> {
    if settings.jwt_secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(settings.jwt_secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    match &settings.jwt_audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let token_data = decode::<Value>(token, &decoding_key, &validation)?;
    let claims: Claims = serde_json::from_value(token_data.claims.clone())?;

    Ok(AuthUser {
        user_id: claims.sub,
        role: claims.role,
        claims: token_data.claims,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token(secret: &str, claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    fn future_exp() -> i64 {
        chrono::Utc::now().timestamp() + 3600
    }

    #[test]
    fn verifies_token_and_keeps_raw_claims() {
        let user_id = Uuid::new_v4();
        let settings = AuthSettings::new("secret", "authenticated");
        let jwt = token(
            "secret",
            json!({ "sub": user_id, "role": "authenticated", "aud": "authenticated", "exp": future_exp(), "email": "a@b.c" }),
        );

        let user = verify_token(&jwt, &settings).unwrap();
        assert_eq!(user.user_id, user_id);
        assert_eq!(user.role.as_deref(), Some("authenticated"));
        assert_eq!(user.claims["email"], "a@b.c");
    }

    #[test]
    fn rejects_wrong_secret() {
        let settings = AuthSettings::new("secret", "");
        let jwt = token("other", json!({ "sub": Uuid::new_v4(), "exp": future_exp() }));
        assert!(matches!(verify_token(&jwt, &settings), Err(JwtError::InvalidToken(_))));
    }

    #[test]
    fn rejects_wrong_audience() {
        let settings = AuthSettings::new("secret", "authenticated");
        let jwt = token("secret", json!({ "sub": Uuid::new_v4(), "aud": "anon", "exp": future_exp() }));
        assert!(verify_token(&jwt, &settings).is_err());
    }

    #[test]
    fn rejects_when_secret_missing() {
        let settings = AuthSettings::new("", "");
        assert!(matches!(verify_token("x.y.z", &settings), Err(JwtError::InvalidSecret)));
    }
}
