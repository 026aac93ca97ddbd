use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

use crate::error::GithubError;
use crate::github::models::Claims;

/// GitHub rejects app assertions valid for longer than ten minutes.
pub const JWT_LIFETIME_SECS: i64 = 600;

/// A signed app assertion together with its expiry (unix seconds).
#[derive(Debug, Clone)]
pub struct AppToken {
    pub token: String,
    pub expires_at: i64,
}

impl AppToken {
    pub fn expires_within(&self, now: i64, margin_secs: i64) -> bool {
        self.expires_at - now < margin_secs
    }
}

impl Claims {
    pub fn new(app_id: &str, issued_at: i64) -> Self {
        Self {
            iat: issued_at,
            exp: issued_at + JWT_LIFETIME_SECS,
            iss: app_id.to_string(),
        }
    }
}

pub fn create_jwt(app_id: &str, key: &EncodingKey) -> Result<AppToken, GithubError> {
    create_jwt_at(app_id, key, Utc::now().timestamp())
}

pub fn create_jwt_at(app_id: &str, key: &EncodingKey, now: i64) -> Result<AppToken, GithubError> {
    let claims = Claims::new(app_id, now);
    let token = encode(&Header::new(Algorithm::RS256), &claims, key)?;
    tracing::debug!(app_id, exp = claims.exp, "minted app JWT");
    Ok(AppToken {
        token,
        expires_at: claims.exp,
    })
}
