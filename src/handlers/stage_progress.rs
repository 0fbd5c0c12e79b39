use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use model::entities::{placement_progress, placement_stage, prelude::*, stage_progress, user};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, JoinType, QueryFilter,
    QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};
use utoipa::ToSchema;

use crate::auth::{AuthUser, Capability};
use crate::error::{ApiError, map_unique_violation};
use crate::helpers::scoping::resolve_student_profile;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for recording a stage outcome
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateStageProgressRequest {
    pub placement_progress_id: i32,
    pub stage_id: i32,
    /// "PENDING", "CLEARED" or "FAILED"; defaults to "PENDING".
    pub result: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub feedback: String,
}

/// Request body for updating a stage outcome
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateStageProgressRequest {
    pub result: Option<String>,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub feedback: Option<String>,
}

/// Stage outcome response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageProgressResponse {
    pub id: i32,
    pub placement_progress_id: i32,
    pub stage_id: i32,
    pub result: String,
    pub scheduled_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,
    pub feedback: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<stage_progress::Model> for StageProgressResponse {
    fn from(model: stage_progress::Model) -> Self {
        Self {
            id: model.id,
            placement_progress_id: model.placement_progress_id,
            stage_id: model.stage_id,
            result: sea_orm::ActiveEnum::to_value(&model.result),
            scheduled_date: model.scheduled_date,
            completed_date: model.completed_date,
            feedback: model.feedback,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn parse_result(raw: &str) -> Result<stage_progress::StageResult, ApiError> {
    sea_orm::ActiveEnum::try_from_value(&raw.to_string())
        .map_err(|_| ApiError::Validation(format!("unknown result '{}'", raw)))
}

/// Application ids the caller may see, or None for full admin access.
/// Roles that are neither admin nor student see nothing.
async fn scoped_progress_ids(
    state: &AppState,
    auth: &AuthUser,
) -> Result<Option<Vec<i32>>, ApiError> {
    if auth.user.role == user::UserRole::Admin {
        return Ok(None);
    }
    if auth.user.role != user::UserRole::Student {
        return Ok(Some(Vec::new()));
    }
    let profile = resolve_student_profile(&state.db, &auth.user).await?;
    let Some(profile) = profile else {
        return Ok(Some(Vec::new()));
    };
    let ids: Vec<i32> = PlacementProgress::find()
        .filter(placement_progress::Column::StudentId.eq(profile.id))
        .select_only()
        .column(placement_progress::Column::Id)
        .into_tuple()
        .all(&state.db)
        .await?;
    Ok(Some(ids))
}

/// List stage outcomes visible to the caller
#[utoipa::path(
    get,
    path = "/api/stage-progress",
    tag = "stage-progress",
    responses(
        (status = 200, description = "Stage outcomes retrieved", body = ApiResponse<Vec<StageProgressResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_stage_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<StageProgressResponse>>>, ApiError> {
    trace!("Entering list_stage_progress function");
    let mut query = StageProgress::find();
    if let Some(ids) = scoped_progress_ids(&state, &auth).await? {
        query = query.filter(stage_progress::Column::PlacementProgressId.is_in(ids));
    }

    // Pipeline order, not insertion order.
    let records = query
        .join(JoinType::InnerJoin, stage_progress::Relation::Stage.def())
        .order_by_asc(placement_stage::Column::SequenceOrder)
        .all(&state.db)
        .await?;
    let data: Vec<StageProgressResponse> =
        records.into_iter().map(StageProgressResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Stage outcomes retrieved successfully")))
}

/// Record a stage outcome (admin only)
#[utoipa::path(
    post,
    path = "/api/stage-progress",
    tag = "stage-progress",
    request_body = CreateStageProgressRequest,
    responses(
        (status = 201, description = "Stage outcome recorded", body = ApiResponse<StageProgressResponse>),
        (status = 400, description = "Invalid request or duplicate stage record", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_stage_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateStageProgressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StageProgressResponse>>), ApiError> {
    trace!("Entering create_stage_progress function");
    auth.require(Capability::ManageProgress)?;

    PlacementProgress::find_by_id(request.placement_progress_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!(
                "application with id {} does not exist",
                request.placement_progress_id
            ))
        })?;
    PlacementStage::find_by_id(request.stage_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!("stage with id {} does not exist", request.stage_id))
        })?;

    let result = match request.result.as_deref() {
        Some(raw) => parse_result(raw)?,
        None => stage_progress::StageResult::Pending,
    };

    let now = Utc::now();
    let created = stage_progress::ActiveModel {
        placement_progress_id: Set(request.placement_progress_id),
        stage_id: Set(request.stage_id),
        result: Set(result),
        scheduled_date: Set(request.scheduled_date),
        completed_date: Set(request.completed_date),
        feedback: Set(request.feedback),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| map_unique_violation(e, "this stage is already recorded for the application"))?;

    info!("Stage outcome recorded with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StageProgressResponse::from(created),
            "Stage outcome recorded successfully",
        )),
    ))
}

/// Get one stage outcome by id
#[utoipa::path(
    get,
    path = "/api/stage-progress/{id}",
    tag = "stage-progress",
    params(("id" = i32, Path, description = "Stage outcome ID")),
    responses(
        (status = 200, description = "Stage outcome retrieved", body = ApiResponse<StageProgressResponse>),
        (status = 404, description = "Stage outcome not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stage_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<StageProgressResponse>>, ApiError> {
    let record = StageProgress::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stage outcome with id {} not found", id)))?;

    if let Some(ids) = scoped_progress_ids(&state, &auth).await? {
        if !ids.contains(&record.placement_progress_id) {
            return Err(ApiError::NotFound(format!("stage outcome with id {} not found", id)));
        }
    }
    Ok(Json(ApiResponse::new(
        StageProgressResponse::from(record),
        "Stage outcome retrieved successfully",
    )))
}

/// Update a stage outcome (admin only)
#[utoipa::path(
    put,
    path = "/api/stage-progress/{id}",
    tag = "stage-progress",
    params(("id" = i32, Path, description = "Stage outcome ID")),
    request_body = UpdateStageProgressRequest,
    responses(
        (status = 200, description = "Stage outcome updated", body = ApiResponse<StageProgressResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Stage outcome not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_stage_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStageProgressRequest>,
) -> Result<Json<ApiResponse<StageProgressResponse>>, ApiError> {
    trace!("Entering update_stage_progress function");
    auth.require(Capability::ManageProgress)?;

    let record = StageProgress::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stage outcome with id {} not found", id)))?;

    let mut active: stage_progress::ActiveModel = record.into();
    if let Some(raw) = request.result {
        active.result = Set(parse_result(&raw)?);
    }
    if let Some(scheduled_date) = request.scheduled_date {
        active.scheduled_date = Set(Some(scheduled_date));
    }
    if let Some(completed_date) = request.completed_date {
        active.completed_date = Set(Some(completed_date));
    }
    if let Some(feedback) = request.feedback {
        active.feedback = Set(feedback);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!("Stage outcome updated: ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        StageProgressResponse::from(updated),
        "Stage outcome updated successfully",
    )))
}

/// Delete a stage outcome (admin only)
#[utoipa::path(
    delete,
    path = "/api/stage-progress/{id}",
    tag = "stage-progress",
    params(("id" = i32, Path, description = "Stage outcome ID")),
    responses(
        (status = 200, description = "Stage outcome deleted", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Stage outcome not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_stage_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require(Capability::ManageProgress)?;

    let record = StageProgress::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stage outcome with id {} not found", id)))?;

    StageProgress::delete_by_id(record.id).exec(&state.db).await?;
    info!("Stage outcome deleted: ID {}", id);
    Ok(Json(ApiResponse::new(
        format!("stage outcome {} deleted", id),
        "Stage outcome deleted successfully",
    )))
}
