use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use model::entities::{prelude::*, user};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::schemas::AppState;

/// Token signing configuration.
///
/// Loaded from the environment at startup; the secret never appears in
/// debug output or logs.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    pub access_ttl_seconds: i64,
    pub refresh_ttl_seconds: i64,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("access_ttl_seconds", &self.access_ttl_seconds)
            .field("refresh_ttl_seconds", &self.refresh_ttl_seconds)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, access_ttl_seconds: i64, refresh_ttl_seconds: i64) -> Self {
        Self {
            secret: secret.into(),
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    /// Read `JWT_SECRET`, `JWT_ACCESS_TTL_SECONDS` and
    /// `JWT_REFRESH_TTL_SECONDS` from the environment. Only the secret is
    /// mandatory.
    pub fn from_env() -> anyhow::Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        let access_ttl_seconds = std::env::var("JWT_ACCESS_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600);
        let refresh_ttl_seconds = std::env::var("JWT_REFRESH_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(7 * 24 * 3600);
        Ok(Self::new(secret, access_ttl_seconds, refresh_ttl_seconds))
    }

    fn encoding_key(&self) -> EncodingKey {
        EncodingKey::from_secret(self.secret.as_bytes())
    }

    fn decoding_key(&self) -> DecodingKey {
        DecodingKey::from_secret(self.secret.as_bytes())
    }
}

/// Claims carried by both access and refresh tokens.
///
/// `token_type` distinguishes the two; refresh tokens are only accepted by
/// the refresh endpoint and access tokens only by the extractor below.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i32,
    pub username: String,
    pub email: String,
    pub role: String,
    pub is_verified: bool,
    /// "access" or "refresh".
    pub token_type: String,
    /// Unique token id, used to revoke refresh tokens on logout.
    pub jti: String,
    pub exp: i64,
    pub iat: i64,
}

/// Access and refresh token issued together at login.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

fn build_claims(user: &user::Model, token_type: &str, ttl_seconds: i64) -> Claims {
    let now = Utc::now().timestamp();
    Claims {
        sub: user.id,
        username: user.username.clone(),
        email: user.email.clone(),
        role: sea_orm::ActiveEnum::to_value(&user.role),
        is_verified: user.is_verified,
        token_type: token_type.to_string(),
        jti: Uuid::new_v4().to_string(),
        exp: now + ttl_seconds,
        iat: now,
    }
}

/// Issue a fresh access token for the user.
pub fn issue_access_token(config: &AuthConfig, user: &user::Model) -> Result<String, ApiError> {
    let claims = build_claims(user, "access", config.access_ttl_seconds);
    encode(&Header::default(), &claims, &config.encoding_key())
        .map_err(|e| ApiError::Unauthorized(format!("failed to sign token: {}", e)))
}

/// Issue the access/refresh pair returned by login and registration.
pub fn issue_token_pair(config: &AuthConfig, user: &user::Model) -> Result<TokenPair, ApiError> {
    let access = issue_access_token(config, user)?;
    let refresh_claims = build_claims(user, "refresh", config.refresh_ttl_seconds);
    let refresh = encode(&Header::default(), &refresh_claims, &config.encoding_key())
        .map_err(|e| ApiError::Unauthorized(format!("failed to sign token: {}", e)))?;
    trace!(user_id = user.id, "issued token pair");
    Ok(TokenPair { access, refresh })
}

/// Decode and verify a token, including its expiry.
pub fn decode_token(config: &AuthConfig, token: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(token, &config.decoding_key(), &Validation::default())
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("token rejected: {}", e);
            ApiError::Unauthorized("invalid or expired token".to_string())
        })
}

fn hex_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Salted SHA-256 password hash, stored as `salt$hexdigest`.
pub fn hash_password(password: &str) -> String {
    let salt = Uuid::new_v4().simple().to_string();
    let digest = hex_digest(&salt, password);
    format!("{}${}", salt, digest)
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    match stored.split_once('$') {
        Some((salt, digest)) => hex_digest(salt, password) == digest,
        None => false,
    }
}

/// Write permissions over the managed collections. Students and companies
/// get read-only, role-scoped access; only admins hold capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    ManageUsers,
    ManageStudents,
    ManageCompanies,
    ManageStages,
    ManageProgress,
    ManageDates,
    ImportData,
}

const ADMIN_CAPABILITIES: &[Capability] = &[
    Capability::ManageUsers,
    Capability::ManageStudents,
    Capability::ManageCompanies,
    Capability::ManageStages,
    Capability::ManageProgress,
    Capability::ManageDates,
    Capability::ImportData,
];

pub fn capabilities(role: user::UserRole) -> &'static [Capability] {
    match role {
        user::UserRole::Admin => ADMIN_CAPABILITIES,
        user::UserRole::Student | user::UserRole::Company => &[],
    }
}

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Loads the user row so handlers see current role and flags, not
/// the ones frozen into the token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
    pub claims: Claims,
}

impl AuthUser {
    pub fn is_admin(&self) -> bool {
        self.user.role == user::UserRole::Admin
    }

    pub fn require(&self, capability: Capability) -> Result<(), ApiError> {
        if capabilities(self.user.role).contains(&capability) {
            Ok(())
        } else {
            warn!(
                user_id = self.user.id,
                "denied {:?} to role {:?}", capability, self.user.role
            );
            Err(ApiError::Forbidden(
                "you do not have permission to perform this action".to_string(),
            ))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                ApiError::Unauthorized("authentication credentials were not provided".to_string())
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            ApiError::Unauthorized("invalid authorization header".to_string())
        })?;

        let claims = decode_token(&state.auth, token)?;
        if claims.token_type != "access" {
            return Err(ApiError::Unauthorized(
                "refresh tokens cannot be used for authentication".to_string(),
            ));
        }

        let user = User::find()
            .filter(user::Column::Id.eq(claims.sub))
            .one(&state.db)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("user no longer exists".to_string()))?;

        if !user.is_active {
            return Err(ApiError::Unauthorized("account is disabled".to_string()));
        }

        Ok(AuthUser { user, claims })
    }
}
