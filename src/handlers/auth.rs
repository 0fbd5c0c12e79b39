use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, TimeZone, Utc};
use model::entities::{prelude::*, revoked_token, user};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{
    AuthUser, Capability, decode_token, hash_password, issue_access_token, issue_token_pair,
    verify_password,
};
use crate::error::{ApiError, map_unique_violation};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for account registration
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 3, message = "username must be at least 3 characters"))]
    pub username: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
    /// Must match `password`.
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    /// "STUDENT", "ADMIN" or "COMPANY"; defaults to "STUDENT".
    pub role: Option<String>,
    #[serde(default)]
    pub phone: String,
}

/// Request body for login
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for logout
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct LogoutRequest {
    /// The refresh token to revoke.
    pub refresh: String,
}

/// Request body for refreshing an access token
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh: String,
}

/// Request body for profile updates; username and role are immutable
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Request body for password changes
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub new_password: String,
    /// Must match `new_password`.
    pub new_password2: String,
}

/// Account response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,
    pub phone: String,
    pub is_verified: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user::Model> for UserResponse {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            first_name: model.first_name,
            last_name: model.last_name,
            role: sea_orm::ActiveEnum::to_value(&model.role),
            phone: model.phone,
            is_verified: model.is_verified,
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// Access/refresh token pair
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenPairResponse {
    pub access: String,
    pub refresh: String,
}

/// Registration response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub tokens: TokenPairResponse,
}

/// Login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub user: UserResponse,
    pub tokens: TokenPairResponse,
}

/// Refresh response carrying a new access token only
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AccessTokenResponse {
    pub access: String,
}

fn parse_role(value: Option<&str>) -> Result<user::UserRole, ApiError> {
    let raw = value.unwrap_or("STUDENT");
    sea_orm::ActiveEnum::try_from_value(&raw.to_string())
        .map_err(|_| ApiError::Validation(format!("unknown role '{}'", raw)))
}

/// Register a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = ApiResponse<RegisterResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RegisterResponse>>), ApiError> {
    trace!("Entering register function");
    request.validate()?;
    if request.password != request.password2 {
        return Err(ApiError::Validation("passwords do not match".to_string()));
    }
    let role = parse_role(request.role.as_deref())?;

    debug!("Registering account with username: {}", request.username);
    let now = Utc::now();
    let new_user = user::ActiveModel {
        username: Set(request.username.clone()),
        email: Set(request.email.clone()),
        password_hash: Set(hash_password(&request.password)),
        first_name: Set(request.first_name.clone()),
        last_name: Set(request.last_name.clone()),
        role: Set(role),
        phone: Set(request.phone.clone()),
        is_verified: Set(false),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = new_user
        .insert(&state.db)
        .await
        .map_err(|e| map_unique_violation(e, "an account with this username or email already exists"))?;

    info!("Account created with ID: {}, username: {}", created.id, created.username);
    let tokens = issue_token_pair(&state.auth, &created)?;
    let response = ApiResponse::new(
        RegisterResponse {
            user: UserResponse::from(created),
            tokens: TokenPairResponse {
                access: tokens.access,
                refresh: tokens.refresh,
            },
        },
        "Account created successfully",
    );
    Ok((StatusCode::CREATED, Json(response)))
}

/// Log in with username and password
#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Invalid credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    trace!("Entering login function");

    let account = User::find()
        .filter(user::Column::Username.eq(&request.username))
        .one(&state.db)
        .await?;

    let account = match account {
        Some(account) if verify_password(&request.password, &account.password_hash) => account,
        _ => {
            warn!("Failed login attempt for username: {}", request.username);
            return Err(ApiError::Unauthorized("invalid username or password".to_string()));
        }
    };

    if !account.is_active {
        return Err(ApiError::Unauthorized("account is disabled".to_string()));
    }

    info!("Login successful for user ID: {}", account.id);
    let tokens = issue_token_pair(&state.auth, &account)?;
    Ok(Json(ApiResponse::new(
        LoginResponse {
            user: UserResponse::from(account),
            tokens: TokenPairResponse {
                access: tokens.access,
                refresh: tokens.refresh,
            },
        },
        "Login successful",
    )))
}

/// Revoke a refresh token
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    request_body = LogoutRequest,
    responses(
        (status = 200, description = "Token revoked", body = ApiResponse<String>),
        (status = 401, description = "Invalid token", body = ErrorResponse)
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering logout function");
    let claims = decode_token(&state.auth, &request.refresh)?;
    if claims.token_type != "refresh" {
        return Err(ApiError::Unauthorized("not a refresh token".to_string()));
    }

    let expires_at = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let revoked = revoked_token::ActiveModel {
        jti: Set(claims.jti.clone()),
        expires_at: Set(expires_at),
        revoked_at: Set(Utc::now()),
        ..Default::default()
    };

    // A second logout with the same token is a no-op, not an error.
    if let Err(db_error) = revoked.insert(&state.db).await {
        let text = db_error.to_string().to_lowercase();
        if !text.contains("unique") && !text.contains("constraint") {
            return Err(ApiError::Database(db_error));
        }
    }

    info!("Refresh token revoked for user ID: {}", claims.sub);
    Ok(Json(ApiResponse::new(
        "logged out".to_string(),
        "Refresh token revoked",
    )))
}

/// Exchange a refresh token for a new access token
#[utoipa::path(
    post,
    path = "/api/auth/token/refresh",
    tag = "auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access token issued", body = ApiResponse<AccessTokenResponse>),
        (status = 401, description = "Invalid or revoked token", body = ErrorResponse)
    )
)]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<ApiResponse<AccessTokenResponse>>, ApiError> {
    trace!("Entering refresh_token function");
    let claims = decode_token(&state.auth, &request.refresh)?;
    if claims.token_type != "refresh" {
        return Err(ApiError::Unauthorized("not a refresh token".to_string()));
    }

    let revoked = RevokedToken::find()
        .filter(revoked_token::Column::Jti.eq(&claims.jti))
        .one(&state.db)
        .await?;
    if revoked.is_some() {
        warn!("Rejected revoked refresh token for user ID: {}", claims.sub);
        return Err(ApiError::Unauthorized("token has been revoked".to_string()));
    }

    let account = User::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("user no longer exists".to_string()))?;
    if !account.is_active {
        return Err(ApiError::Unauthorized("account is disabled".to_string()));
    }

    let access = issue_access_token(&state.auth, &account)?;
    Ok(Json(ApiResponse::new(
        AccessTokenResponse { access },
        "Access token refreshed",
    )))
}

/// Get the authenticated account's profile
#[utoipa::path(
    get,
    path = "/api/auth/profile",
    tag = "auth",
    responses(
        (status = 200, description = "Profile retrieved", body = ApiResponse<UserResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn profile(auth: AuthUser) -> Json<ApiResponse<UserResponse>> {
    Json(ApiResponse::new(
        UserResponse::from(auth.user),
        "Profile retrieved successfully",
    ))
}

/// Update the authenticated account's profile
#[utoipa::path(
    put,
    path = "/api/auth/profile/update",
    tag = "auth",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<UserResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    trace!("Entering update_profile function");
    request.validate()?;

    let mut active: user::ActiveModel = auth.user.into();
    if let Some(first_name) = request.first_name {
        active.first_name = Set(first_name);
    }
    if let Some(last_name) = request.last_name {
        active.last_name = Set(last_name);
    }
    if let Some(email) = request.email {
        active.email = Set(email);
    }
    if let Some(phone) = request.phone {
        active.phone = Set(phone);
    }
    active.updated_at = Set(Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| map_unique_violation(e, "an account with this email already exists"))?;

    info!("Profile updated for user ID: {}", updated.id);
    Ok(Json(ApiResponse::new(
        UserResponse::from(updated),
        "Profile updated successfully",
    )))
}

/// Change the authenticated account's password
#[utoipa::path(
    post,
    path = "/api/auth/change-password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = ApiResponse<String>),
        (status = 400, description = "Old password incorrect", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn change_password(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    trace!("Entering change_password function");
    request.validate()?;
    if request.new_password != request.new_password2 {
        return Err(ApiError::Validation("new passwords do not match".to_string()));
    }

    if !verify_password(&request.old_password, &auth.user.password_hash) {
        return Err(ApiError::Validation("old password is incorrect".to_string()));
    }

    let user_id = auth.user.id;
    let mut active: user::ActiveModel = auth.user.into();
    active.password_hash = Set(hash_password(&request.new_password));
    active.updated_at = Set(Utc::now());
    active.update(&state.db).await?;

    info!("Password changed for user ID: {}", user_id);
    Ok(Json(ApiResponse::new(
        "password changed".to_string(),
        "Password changed successfully",
    )))
}

/// List accounts. Admins see every account; everyone else sees only their
/// own.
#[utoipa::path(
    get,
    path = "/api/auth/users",
    tag = "auth",
    responses(
        (status = 200, description = "Accounts retrieved", body = ApiResponse<Vec<UserResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<UserResponse>>>, ApiError> {
    let users = if auth.is_admin() {
        User::find()
            .order_by_asc(user::Column::Id)
            .all(&state.db)
            .await?
    } else {
        vec![auth.user]
    };
    let data: Vec<UserResponse> = users.into_iter().map(UserResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Accounts retrieved successfully")))
}

/// Get one account by id (admin, or the account itself)
#[utoipa::path(
    get,
    path = "/api/auth/users/{id}",
    tag = "auth",
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account retrieved", body = ApiResponse<UserResponse>),
        (status = 403, description = "Someone else's account", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    if auth.user.id != id {
        auth.require(Capability::ManageUsers)?;
    }

    let account = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user with id {} not found", id)))?;
    Ok(Json(ApiResponse::new(
        UserResponse::from(account),
        "Account retrieved successfully",
    )))
}

/// Mark an account as verified (admin only)
#[utoipa::path(
    post,
    path = "/api/auth/users/{id}/verify",
    tag = "auth",
    params(("id" = i32, Path, description = "Account ID")),
    responses(
        (status = 200, description = "Account verified", body = ApiResponse<UserResponse>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Account not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn verify_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<UserResponse>>, ApiError> {
    auth.require(Capability::ManageUsers)?;

    let account = User::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("user with id {} not found", id)))?;

    let mut active: user::ActiveModel = account.into();
    active.is_verified = Set(true);
    active.updated_at = Set(Utc::now());
    let updated = active.update(&state.db).await?;

    info!("Account verified: user ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        UserResponse::from(updated),
        "Account verified successfully",
    )))
}
