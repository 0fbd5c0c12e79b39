use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use model::entities::{important_date, prelude::*};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, Capability};
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a calendar entry
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateDateRequest {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// "DRIVE", "DEADLINE", "TEST", "INTERVIEW", "RESULT" or "OTHER".
    pub event_type: String,
    pub company_id: Option<i32>,
    pub event_date: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub link: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Request body for updating a calendar entry
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateDateRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub event_type: Option<String>,
    /// Explicit `null` detaches the event from its company.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<Option<i32>>,
    pub event_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub link: Option<String>,
    pub is_active: Option<bool>,
}

/// Calendar entry response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ImportantDateResponse {
    pub id: i32,
    pub title: String,
    pub description: String,
    pub event_type: String,
    pub company_id: Option<i32>,
    pub event_date: DateTime<Utc>,
    pub location: String,
    pub link: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<important_date::Model> for ImportantDateResponse {
    fn from(model: important_date::Model) -> Self {
        Self {
            id: model.id,
            title: model.title,
            description: model.description,
            event_type: sea_orm::ActiveEnum::to_value(&model.event_type),
            company_id: model.company_id,
            event_date: model.event_date,
            location: model.location,
            link: model.link,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn parse_event_type(raw: &str) -> Result<important_date::EventType, ApiError> {
    sea_orm::ActiveEnum::try_from_value(&raw.to_string())
        .map_err(|_| ApiError::Validation(format!("unknown event_type '{}'", raw)))
}

async fn check_company_exists(state: &AppState, company_id: i32) -> Result<(), ApiError> {
    Company::find_by_id(company_id)
        .one(&state.db)
        .await?
        .map(|_| ())
        .ok_or_else(|| {
            ApiError::Validation(format!("company with id {} does not exist", company_id))
        })
}

/// List calendar entries, soonest first
#[utoipa::path(
    get,
    path = "/api/important-dates",
    tag = "important-dates",
    responses(
        (status = 200, description = "Calendar retrieved", body = ApiResponse<Vec<ImportantDateResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_dates(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ImportantDateResponse>>>, ApiError> {
    trace!("Entering list_dates function");
    let entries = ImportantDate::find()
        .order_by_asc(important_date::Column::EventDate)
        .all(&state.db)
        .await?;
    let data: Vec<ImportantDateResponse> =
        entries.into_iter().map(ImportantDateResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Calendar retrieved successfully")))
}

/// Create a calendar entry (admin only)
#[utoipa::path(
    post,
    path = "/api/important-dates",
    tag = "important-dates",
    request_body = CreateDateRequest,
    responses(
        (status = 201, description = "Calendar entry created", body = ApiResponse<ImportantDateResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_date(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateDateRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ImportantDateResponse>>), ApiError> {
    trace!("Entering create_date function");
    auth.require(Capability::ManageDates)?;
    request.validate()?;
    let event_type = parse_event_type(&request.event_type)?;
    if let Some(company_id) = request.company_id {
        check_company_exists(&state, company_id).await?;
    }

    let now = Utc::now();
    let created = important_date::ActiveModel {
        title: Set(request.title),
        description: Set(request.description),
        event_type: Set(event_type),
        company_id: Set(request.company_id),
        event_date: Set(request.event_date),
        location: Set(request.location),
        link: Set(request.link),
        is_active: Set(request.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Calendar entry created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ImportantDateResponse::from(created),
            "Calendar entry created successfully",
        )),
    ))
}

/// Get one calendar entry by id
#[utoipa::path(
    get,
    path = "/api/important-dates/{id}",
    tag = "important-dates",
    params(("id" = i32, Path, description = "Calendar entry ID")),
    responses(
        (status = 200, description = "Calendar entry retrieved", body = ApiResponse<ImportantDateResponse>),
        (status = 404, description = "Calendar entry not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_date(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ImportantDateResponse>>, ApiError> {
    let found = ImportantDate::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("calendar entry with id {} not found", id)))?;
    Ok(Json(ApiResponse::new(
        ImportantDateResponse::from(found),
        "Calendar entry retrieved successfully",
    )))
}

/// Update a calendar entry (admin only)
#[utoipa::path(
    put,
    path = "/api/important-dates/{id}",
    tag = "important-dates",
    params(("id" = i32, Path, description = "Calendar entry ID")),
    request_body = UpdateDateRequest,
    responses(
        (status = 200, description = "Calendar entry updated", body = ApiResponse<ImportantDateResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Calendar entry not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_date(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateDateRequest>,
) -> Result<Json<ApiResponse<ImportantDateResponse>>, ApiError> {
    trace!("Entering update_date function");
    auth.require(Capability::ManageDates)?;

    let found = ImportantDate::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("calendar entry with id {} not found", id)))?;

    let mut active: important_date::ActiveModel = found.into();
    if let Some(title) = request.title {
        active.title = Set(title);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(raw) = request.event_type {
        active.event_type = Set(parse_event_type(&raw)?);
    }
    if let Some(company_update) = request.company_id {
        if let Some(company_id) = company_update {
            check_company_exists(&state, company_id).await?;
        }
        active.company_id = Set(company_update);
    }
    if let Some(event_date) = request.event_date {
        active.event_date = Set(event_date);
    }
    if let Some(location) = request.location {
        active.location = Set(location);
    }
    if let Some(link) = request.link {
        active.link = Set(link);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!("Calendar entry updated: ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        ImportantDateResponse::from(updated),
        "Calendar entry updated successfully",
    )))
}

/// Delete a calendar entry (admin only)
#[utoipa::path(
    delete,
    path = "/api/important-dates/{id}",
    tag = "important-dates",
    params(("id" = i32, Path, description = "Calendar entry ID")),
    responses(
        (status = 200, description = "Calendar entry deleted", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Calendar entry not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_date(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require(Capability::ManageDates)?;

    let found = ImportantDate::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("calendar entry with id {} not found", id)))?;

    ImportantDate::delete_by_id(found.id).exec(&state.db).await?;
    info!("Calendar entry deleted: ID {}", id);
    Ok(Json(ApiResponse::new(
        format!("calendar entry {} deleted", id),
        "Calendar entry deleted successfully",
    )))
}

/// Next ten upcoming active events
#[utoipa::path(
    get,
    path = "/api/important-dates/upcoming",
    tag = "important-dates",
    responses(
        (status = 200, description = "Upcoming events retrieved", body = ApiResponse<Vec<ImportantDateResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upcoming_dates(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ImportantDateResponse>>>, ApiError> {
    let entries = ImportantDate::find()
        .filter(important_date::Column::IsActive.eq(true))
        .filter(important_date::Column::EventDate.gte(Utc::now()))
        .order_by_asc(important_date::Column::EventDate)
        .limit(10)
        .all(&state.db)
        .await?;
    let data: Vec<ImportantDateResponse> =
        entries.into_iter().map(ImportantDateResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Upcoming events retrieved successfully")))
}
