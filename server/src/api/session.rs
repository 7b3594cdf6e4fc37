use std::convert::Infallible;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AppState;
use crate::entity::app_user;

/// Cookie carrying the signed session token.
pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// User id (UUID, stored as string in JWT)
    pub sub: Uuid,
    pub username: String,
    /// Unix timestamp expiry
    pub exp: u64,
}

pub fn encode_jwt(claims: &Claims, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_ref()),
    )
}

pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )?;
    Ok(data.claims)
}

/// Sign a session for `user` and render it as a `Set-Cookie` value.
pub fn login_cookie(
    state: &AppState,
    user: &app_user::Model,
) -> Result<String, jsonwebtoken::errors::Error> {
    let max_age = state.session_expiry_hours.saturating_mul(3600);
    let claims = Claims {
        sub: user.id,
        username: user.username.clone(),
        exp: (Utc::now().timestamp() as u64).saturating_add(max_age),
    };
    let token = encode_jwt(&claims, &state.session_secret)?;
    Ok(format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}"
    ))
}

/// `Set-Cookie` value that makes the browser drop the session.
pub fn logout_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; Path=/; SameSite=Lax; Max-Age=0")
}

fn extract_bearer(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

fn extract_cookie(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|h| h.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value)
}

fn session_claims(parts: &Parts, secret: &str) -> Option<Claims> {
    let token = extract_bearer(parts).or_else(|| extract_cookie(parts))?;
    decode_jwt(token, secret).ok()
}

/// Extractor: the caller's session, `None` when anonymous or the token is
/// invalid/expired. Never rejects.
pub struct Session(pub Option<Claims>);

impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        Ok(Session(session_claims(parts, &state.session_secret)))
    }
}

/// Extractor: requires a valid session.
pub struct AuthClaims(pub Claims);

impl<S> FromRequestParts<S> for AuthClaims
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        session_claims(parts, &state.session_secret)
            .map(AuthClaims)
            .ok_or((StatusCode::UNAUTHORIZED, "Missing, invalid or expired session"))
    }
}
