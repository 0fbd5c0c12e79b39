use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use model::entities::{placement_stage, prelude::*};
use sea_orm::{ActiveModelTrait, ActiveValue::Set, EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, Capability};
use crate::error::ApiError;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a pipeline stage
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateStageRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    /// "APPLICATION", "APTITUDE", "TECHNICAL1".."TECHNICAL3", "HR" or "FINAL".
    pub stage_type: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_sequence")]
    pub sequence_order: i32,
}

fn default_sequence() -> i32 {
    1
}

/// Request body for updating a pipeline stage
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateStageRequest {
    pub name: Option<String>,
    pub stage_type: Option<String>,
    pub description: Option<String>,
    pub sequence_order: Option<i32>,
}

/// Pipeline stage response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StageResponse {
    pub id: i32,
    pub name: String,
    pub stage_type: String,
    pub description: String,
    pub sequence_order: i32,
}

impl From<placement_stage::Model> for StageResponse {
    fn from(model: placement_stage::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            stage_type: sea_orm::ActiveEnum::to_value(&model.stage_type),
            description: model.description,
            sequence_order: model.sequence_order,
        }
    }
}

fn parse_stage_type(raw: &str) -> Result<placement_stage::StageType, ApiError> {
    sea_orm::ActiveEnum::try_from_value(&raw.to_string())
        .map_err(|_| ApiError::Validation(format!("unknown stage_type '{}'", raw)))
}

/// List pipeline stages in sequence order
#[utoipa::path(
    get,
    path = "/api/stages",
    tag = "stages",
    responses(
        (status = 200, description = "Stages retrieved", body = ApiResponse<Vec<StageResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_stages(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<StageResponse>>>, ApiError> {
    trace!("Entering list_stages function");
    let stages = PlacementStage::find()
        .order_by_asc(placement_stage::Column::SequenceOrder)
        .all(&state.db)
        .await?;
    let data: Vec<StageResponse> = stages.into_iter().map(StageResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Stages retrieved successfully")))
}

/// Create a pipeline stage (admin only)
#[utoipa::path(
    post,
    path = "/api/stages",
    tag = "stages",
    request_body = CreateStageRequest,
    responses(
        (status = 201, description = "Stage created", body = ApiResponse<StageResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_stage(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateStageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StageResponse>>), ApiError> {
    trace!("Entering create_stage function");
    auth.require(Capability::ManageStages)?;
    request.validate()?;
    let stage_type = parse_stage_type(&request.stage_type)?;

    let created = placement_stage::ActiveModel {
        name: Set(request.name),
        stage_type: Set(stage_type),
        description: Set(request.description),
        sequence_order: Set(request.sequence_order),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Stage created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StageResponse::from(created),
            "Stage created successfully",
        )),
    ))
}

/// Get one pipeline stage by id
#[utoipa::path(
    get,
    path = "/api/stages/{id}",
    tag = "stages",
    params(("id" = i32, Path, description = "Stage ID")),
    responses(
        (status = 200, description = "Stage retrieved", body = ApiResponse<StageResponse>),
        (status = 404, description = "Stage not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_stage(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<StageResponse>>, ApiError> {
    let found = PlacementStage::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stage with id {} not found", id)))?;
    Ok(Json(ApiResponse::new(
        StageResponse::from(found),
        "Stage retrieved successfully",
    )))
}

/// Update a pipeline stage (admin only)
#[utoipa::path(
    put,
    path = "/api/stages/{id}",
    tag = "stages",
    params(("id" = i32, Path, description = "Stage ID")),
    request_body = UpdateStageRequest,
    responses(
        (status = 200, description = "Stage updated", body = ApiResponse<StageResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Stage not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_stage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStageRequest>,
) -> Result<Json<ApiResponse<StageResponse>>, ApiError> {
    trace!("Entering update_stage function");
    auth.require(Capability::ManageStages)?;

    let found = PlacementStage::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stage with id {} not found", id)))?;

    let mut active: placement_stage::ActiveModel = found.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(raw) = request.stage_type {
        active.stage_type = Set(parse_stage_type(&raw)?);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(sequence_order) = request.sequence_order {
        active.sequence_order = Set(sequence_order);
    }

    let updated = active.update(&state.db).await?;
    info!("Stage updated: ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        StageResponse::from(updated),
        "Stage updated successfully",
    )))
}

/// Delete a pipeline stage (admin only)
#[utoipa::path(
    delete,
    path = "/api/stages/{id}",
    tag = "stages",
    params(("id" = i32, Path, description = "Stage ID")),
    responses(
        (status = 200, description = "Stage deleted", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Stage not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_stage(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require(Capability::ManageStages)?;

    let found = PlacementStage::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("stage with id {} not found", id)))?;

    PlacementStage::delete_by_id(found.id).exec(&state.db).await?;
    info!("Stage deleted: ID {}", id);
    Ok(Json(ApiResponse::new(
        format!("stage {} deleted", id),
        "Stage deleted successfully",
    )))
}
