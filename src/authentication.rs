use std::sync::Arc;

use anyhow::{Context, Result};
use argon2::PasswordVerifier;
use argon2::{password_hash::SaltString, Argon2, PasswordHash};
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{errors::RequestError, AppState};

#[derive(Debug, Serialize, Deserialize)]
struct AuthClaim {
    id: i64,
    exp: i64,
}

/// Issues and checks the bearer tokens that identify the current user.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Arc<str>,
    ttl: time::Duration,
}

impl TokenSigner {
    pub fn new(secret: &str, ttl_days: i64) -> Self {
        Self {
            secret: Arc::from(secret),
            ttl: time::Duration::days(ttl_days),
        }
    }

    pub fn issue(&self, id: i64) -> Result<String> {
        let expiry_date = OffsetDateTime::now_utc() + self.ttl;
        let claim = AuthClaim {
            id,
            exp: expiry_date.unix_timestamp(),
        };

        jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claim,
            &jsonwebtoken::EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .context("Failed to generate jwt token")
    }

    pub fn verify(&self, token: &str) -> Result<i64, RequestError> {
        let token_data = jsonwebtoken::decode::<AuthClaim>(
            token,
            &jsonwebtoken::DecodingKey::from_secret(self.secret.as_bytes()),
            &jsonwebtoken::Validation::default(),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected token");
            RequestError::NotAuthorized("Invalid Token")
        })?;
        let claim = token_data.claims;
        if claim.exp < OffsetDateTime::now_utc().unix_timestamp() {
            return Err(RequestError::NotAuthorized("Token expired"));
        }
        Ok(claim.id)
    }
}

pub struct AuthUser {
    pub id: i64,
}

/// The current user when the request carries a token.
pub struct MaybeUser(pub Option<AuthUser>);

impl MaybeUser {
    pub fn get_id(&self) -> Option<i64> {
        self.0.as_ref().map(|a| a.id)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let header = match parts.headers.get("Authorization") {
            Some(header) => header,
            None => return Ok(MaybeUser(None)),
        };
        let header = header
            .to_str()
            .map_err(|_| RequestError::NotAuthorized("Invalid token"))?;

        let token = header
            .strip_prefix("Token ")
            .ok_or(RequestError::NotAuthorized("Invalid token"))?;

        let id = state.tokens.verify(token)?;

        Ok(MaybeUser(Some(AuthUser { id })))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = RequestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let MaybeUser(user) = MaybeUser::from_request_parts(parts, state).await?;
        user.ok_or(RequestError::NotAuthorized("Need to be authorized"))
    }
}

pub async fn verify_password_argon2(password: String, hash: &str) -> Result<bool> {
    let hash = hash.to_owned();
    tokio::task::spawn_blocking(move || {
        let hash = PasswordHash::new(hash.as_str())
            .map_err(|_| anyhow::anyhow!("Failed to verify password"))?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &hash)
            .is_ok())
    })
    .await
    .context("Failed to verify password")?
}

pub async fn hash_password_argon2(password: String) -> Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(rand::thread_rng());
        let hash = PasswordHash::generate(Argon2::default(), password, salt.as_salt())
            .map_err(|_| anyhow::anyhow!("Failed to hash password"))?;
        Ok(hash.to_string())
    })
    .await
    .context("Failed to hash password")?
}
