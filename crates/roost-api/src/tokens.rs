use anyhow::anyhow;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use axum_extra::extract::cookie::CookieJar;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::warn;
use uuid::Uuid;

use roost_db::Database;
use roost_db::models::UserRow;
use roost_types::api::{AccessClaims, RefreshClaims, UserPublic};

use crate::{AppState, error::ApiError, parse_timestamp};

pub const ACCESS_COOKIE: &str = "accessToken";
pub const REFRESH_COOKIE: &str = "refreshToken";

#[derive(Debug)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues, verifies and rotates the paired access/refresh credentials.
///
/// A user record stores at most one refresh token: issuing a pair overwrites
/// whatever was there, so only the most recent login session's refresh
/// lineage stays valid. Two rotations racing on the same stale token are not
/// arbitrated beyond "last write to the user row wins".
pub struct TokenManager {
    access_encoding: EncodingKey,
    access_decoding: DecodingKey,
    refresh_encoding: EncodingKey,
    refresh_decoding: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenManager {
    pub fn new(
        access_secret: &str,
        refresh_secret: &str,
        access_ttl_minutes: i64,
        refresh_ttl_days: i64,
    ) -> Self {
        Self {
            access_encoding: EncodingKey::from_secret(access_secret.as_bytes()),
            access_decoding: DecodingKey::from_secret(access_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
            access_ttl: Duration::minutes(access_ttl_minutes),
            refresh_ttl: Duration::days(refresh_ttl_days),
        }
    }

    /// Sign a new access/refresh pair for `user` and persist the refresh
    /// token on the user row, invalidating any previously issued one.
    pub fn issue_pair(&self, db: &Database, user: &UserRow) -> Result<TokenPair, ApiError> {
        let user_id: Uuid = user
            .id
            .parse()
            .map_err(|e| anyhow!("corrupt user id '{}': {}", user.id, e))?;
        let now = Utc::now();

        let access_claims = AccessClaims {
            sub: user_id,
            username: user.username.clone(),
            email: user.email.clone(),
            iat: now.timestamp() as usize,
            exp: (now + self.access_ttl).timestamp() as usize,
        };
        let refresh_claims = RefreshClaims {
            sub: user_id,
            iat: now.timestamp() as usize,
            exp: (now + self.refresh_ttl).timestamp() as usize,
        };

        let access_token = encode(&Header::default(), &access_claims, &self.access_encoding)
            .map_err(|e| anyhow!("Token generation failed: {}", e))?;
        let refresh_token = encode(&Header::default(), &refresh_claims, &self.refresh_encoding)
            .map_err(|e| anyhow!("Token generation failed: {}", e))?;

        db.set_refresh_token(&user.id, Some(&refresh_token))?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Cryptographic signature + expiry check on an access token.
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, ApiError> {
        decode::<AccessClaims>(token, &self.access_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Access token rejected: {}", e);
                ApiError::Unauthorized("Invalid access token".into())
            })
    }

    /// Verify a refresh token, reject it when it is not the one currently
    /// stored on the user record (reuse of a rotated/revoked token), then
    /// issue a replacement pair.
    pub fn rotate(&self, db: &Database, presented: &str) -> Result<(UserRow, TokenPair), ApiError> {
        let claims = decode::<RefreshClaims>(presented, &self.refresh_decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| {
                warn!("Refresh token rejected: {}", e);
                ApiError::Unauthorized("Invalid refresh token".into())
            })?;

        let user = db
            .get_user_by_id(&claims.sub.to_string())?
            .ok_or_else(|| ApiError::Unauthorized("Invalid refresh token".into()))?;

        if user.refresh_token.as_deref() != Some(presented) {
            return Err(ApiError::Unauthorized(
                "Refresh token is expired or used".into(),
            ));
        }

        let pair = self.issue_pair(db, &user)?;
        Ok((user, pair))
    }

    /// Clear the stored refresh token (logout); later `rotate` calls with
    /// the old token fail.
    pub fn revoke(&self, db: &Database, user_id: &Uuid) -> Result<(), ApiError> {
        db.set_refresh_token(&user_id.to_string(), None)?;
        Ok(())
    }
}

/// The authenticated caller, resolved from the access token. Handlers that
/// take this as an argument are protected routes.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
}

impl CurrentUser {
    pub fn public(&self) -> UserPublic {
        UserPublic {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            full_name: self.full_name.clone(),
            image: self.image.clone(),
            created_at: self.created_at,
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let token = token_from_parts(parts)?;
        let claims = state.tokens.verify_access(&token)?;

        // The token may outlive the account; reject when the user is gone.
        let user = state
            .db
            .get_user_by_id(&claims.sub.to_string())?
            .ok_or_else(|| ApiError::Unauthorized("Invalid access token".into()))?;

        Ok(CurrentUser {
            id: claims.sub,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            image: user.image,
            created_at: parse_timestamp(&user.created_at),
        })
    }
}

/// Access token from the `accessToken` cookie or `Authorization: Bearer`.
fn token_from_parts(parts: &Parts) -> Result<String, ApiError> {
    let jar = CookieJar::from_headers(&parts.headers);
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        return Ok(cookie.value().to_string());
    }

    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|token| token.to_string())
        .ok_or_else(|| ApiError::Unauthorized("Authentication token is missing".into()))
}
