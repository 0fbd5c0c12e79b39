use std::collections::HashMap;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, NaiveDate, Utc};
use common::{BranchCount, PlacementStatistics, StatusCount, placement_percentage, two_places};
use model::entities::{placement_progress, prelude::*, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Iterable, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};
use utoipa::ToSchema;

use crate::auth::{AuthUser, Capability};
use crate::error::{ApiError, map_unique_violation};
use crate::helpers::scoping::{require_student_profile, resolve_student_profile};
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for recording an application
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateProgressRequest {
    pub student_id: i32,
    pub company_id: i32,
    pub current_stage_id: Option<i32>,
    /// Defaults to "APPLIED".
    pub status: Option<String>,
    /// Defaults to today.
    pub application_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

/// Distinguishes a present `null` (`Some(None)`) from an omitted field
/// (`None`, via `#[serde(default)]`).
fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<i32>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}

/// Request body for updating an application
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateProgressRequest {
    /// Explicit `null` clears the current stage; omitting the field leaves
    /// it unchanged.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub current_stage_id: Option<Option<i32>>,
    pub status: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

/// Application progress response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProgressResponse {
    pub id: i32,
    pub student_id: i32,
    pub company_id: i32,
    pub current_stage_id: Option<i32>,
    pub status: String,
    pub application_date: NaiveDate,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<placement_progress::Model> for ProgressResponse {
    fn from(model: placement_progress::Model) -> Self {
        Self {
            id: model.id,
            student_id: model.student_id,
            company_id: model.company_id,
            current_stage_id: model.current_stage_id,
            status: sea_orm::ActiveEnum::to_value(&model.status),
            application_date: model.application_date,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// A student's own applications
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MyProgressResponse {
    pub count: u64,
    pub results: Vec<ProgressResponse>,
}

fn parse_status(raw: &str) -> Result<placement_progress::ProgressStatus, ApiError> {
    sea_orm::ActiveEnum::try_from_value(&raw.to_string())
        .map_err(|_| ApiError::Validation(format!("unknown status '{}'", raw)))
}

async fn check_stage_exists(state: &AppState, stage_id: i32) -> Result<(), ApiError> {
    PlacementStage::find_by_id(stage_id)
        .one(&state.db)
        .await?
        .map(|_| ())
        .ok_or_else(|| ApiError::Validation(format!("stage with id {} does not exist", stage_id)))
}

/// List applications visible to the caller
#[utoipa::path(
    get,
    path = "/api/placement-progress",
    tag = "placement-progress",
    responses(
        (status = 200, description = "Applications retrieved", body = ApiResponse<Vec<ProgressResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProgressResponse>>>, ApiError> {
    trace!("Entering list_progress function");
    let mut query = PlacementProgress::find();
    match auth.user.role {
        user::UserRole::Admin => {}
        user::UserRole::Student => match resolve_student_profile(&state.db, &auth.user).await? {
            Some(profile) => {
                query = query.filter(placement_progress::Column::StudentId.eq(profile.id));
            }
            None => {
                return Ok(Json(ApiResponse::new(
                    Vec::new(),
                    "Applications retrieved successfully",
                )));
            }
        },
        _ => {
            return Ok(Json(ApiResponse::new(
                Vec::new(),
                "Applications retrieved successfully",
            )));
        }
    }

    let records = query
        .order_by_desc(placement_progress::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    let data: Vec<ProgressResponse> = records.into_iter().map(ProgressResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Applications retrieved successfully")))
}

/// Record a new application (admin only)
#[utoipa::path(
    post,
    path = "/api/placement-progress",
    tag = "placement-progress",
    request_body = CreateProgressRequest,
    responses(
        (status = 201, description = "Application recorded", body = ApiResponse<ProgressResponse>),
        (status = 400, description = "Invalid request or duplicate application", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateProgressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProgressResponse>>), ApiError> {
    trace!("Entering create_progress function");
    auth.require(Capability::ManageProgress)?;

    // FK pre-checks so callers get a 400 naming the bad reference instead
    // of an opaque constraint failure.
    Student::find_by_id(request.student_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!("student with id {} does not exist", request.student_id))
        })?;
    Company::find_by_id(request.company_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| {
            ApiError::Validation(format!("company with id {} does not exist", request.company_id))
        })?;
    if let Some(stage_id) = request.current_stage_id {
        check_stage_exists(&state, stage_id).await?;
    }

    let status = match request.status.as_deref() {
        Some(raw) => parse_status(raw)?,
        None => placement_progress::ProgressStatus::Applied,
    };
    let application_date = request
        .application_date
        .unwrap_or_else(|| Utc::now().date_naive());

    let now = Utc::now();
    let created = placement_progress::ActiveModel {
        student_id: Set(request.student_id),
        company_id: Set(request.company_id),
        current_stage_id: Set(request.current_stage_id),
        status: Set(status),
        application_date: Set(application_date),
        notes: Set(request.notes),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| map_unique_violation(e, "this student has already applied to this company"))?;

    info!("Application recorded with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ProgressResponse::from(created),
            "Application recorded successfully",
        )),
    ))
}

/// One application by id, subject to the caller's scope.
async fn visible_progress(
    state: &AppState,
    auth: &AuthUser,
    id: i32,
) -> Result<placement_progress::Model, ApiError> {
    let record = PlacementProgress::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("application with id {} not found", id)))?;

    match auth.user.role {
        user::UserRole::Admin => {}
        user::UserRole::Student => {
            let own = resolve_student_profile(&state.db, &auth.user).await?;
            if own.map(|p| p.id) != Some(record.student_id) {
                return Err(ApiError::NotFound(format!("application with id {} not found", id)));
            }
        }
        _ => {
            return Err(ApiError::NotFound(format!("application with id {} not found", id)));
        }
    }
    Ok(record)
}

/// Get one application by id
#[utoipa::path(
    get,
    path = "/api/placement-progress/{id}",
    tag = "placement-progress",
    params(("id" = i32, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application retrieved", body = ApiResponse<ProgressResponse>),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ProgressResponse>>, ApiError> {
    let record = visible_progress(&state, &auth, id).await?;
    Ok(Json(ApiResponse::new(
        ProgressResponse::from(record),
        "Application retrieved successfully",
    )))
}

/// Update an application (admin only)
#[utoipa::path(
    put,
    path = "/api/placement-progress/{id}",
    tag = "placement-progress",
    params(("id" = i32, Path, description = "Application ID")),
    request_body = UpdateProgressRequest,
    responses(
        (status = 200, description = "Application updated", body = ApiResponse<ProgressResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateProgressRequest>,
) -> Result<Json<ApiResponse<ProgressResponse>>, ApiError> {
    trace!("Entering update_progress function");
    auth.require(Capability::ManageProgress)?;

    let record = PlacementProgress::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("application with id {} not found", id)))?;

    let mut active: placement_progress::ActiveModel = record.into();
    if let Some(stage_update) = request.current_stage_id {
        if let Some(stage_id) = stage_update {
            check_stage_exists(&state, stage_id).await?;
        }
        active.current_stage_id = Set(stage_update);
    }
    if let Some(raw) = request.status {
        active.status = Set(parse_status(&raw)?);
    }
    if let Some(application_date) = request.application_date {
        active.application_date = Set(application_date);
    }
    if let Some(notes) = request.notes {
        active.notes = Set(notes);
    }
    active.updated_at = Set(Utc::now());

    let updated = active.update(&state.db).await?;
    info!("Application updated: ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        ProgressResponse::from(updated),
        "Application updated successfully",
    )))
}

/// Delete an application (admin only)
#[utoipa::path(
    delete,
    path = "/api/placement-progress/{id}",
    tag = "placement-progress",
    params(("id" = i32, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Application deleted", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Application not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_progress(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require(Capability::ManageProgress)?;

    let record = PlacementProgress::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("application with id {} not found", id)))?;

    PlacementProgress::delete_by_id(record.id).exec(&state.db).await?;
    info!("Application deleted: ID {}", id);
    Ok(Json(ApiResponse::new(
        format!("application {} deleted", id),
        "Application deleted successfully",
    )))
}

/// Aggregate placement statistics
#[utoipa::path(
    get,
    path = "/api/placement-progress/statistics",
    tag = "placement-progress",
    responses(
        (status = 200, description = "Statistics computed", body = ApiResponse<PlacementStatistics>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn statistics(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<PlacementStatistics>>, ApiError> {
    trace!("Entering statistics function");

    let students = Student::find().all(&state.db).await?;
    let applications = PlacementProgress::find().all(&state.db).await?;
    let total_companies = Company::find()
        .filter(model::entities::company::Column::IsActive.eq(true))
        .count(&state.db)
        .await?;
    let packages: HashMap<i32, Decimal> = Company::find()
        .all(&state.db)
        .await?
        .into_iter()
        .map(|c| (c.id, c.package_offered))
        .collect();

    let total_students = students.len() as u64;
    let placed_students = students.iter().filter(|s| s.is_placed).count() as u64;

    let mut status_counts: HashMap<String, u64> = HashMap::new();
    let mut accepted_packages: Vec<Decimal> = Vec::new();
    let mut offers_received = 0u64;
    let mut offers_accepted = 0u64;
    for application in &applications {
        let status = sea_orm::ActiveEnum::to_value(&application.status);
        *status_counts.entry(status).or_insert(0) += 1;
        match application.status {
            placement_progress::ProgressStatus::OfferReceived => offers_received += 1,
            placement_progress::ProgressStatus::OfferAccepted => {
                offers_accepted += 1;
                if let Some(package) = packages.get(&application.company_id) {
                    accepted_packages.push(*package);
                }
            }
            _ => {}
        }
    }

    // Mean package over accepted offers, weighted per application.
    let average_package = if accepted_packages.is_empty() {
        two_places(Decimal::ZERO)
    } else {
        let sum: Decimal = accepted_packages.iter().sum();
        two_places(sum / Decimal::from(accepted_packages.len()))
    };

    // Stable ordering by enum declaration order, zero-count statuses omitted.
    let status_breakdown: Vec<StatusCount> = placement_progress::ProgressStatus::iter()
        .filter_map(|status| {
            let key = sea_orm::ActiveEnum::to_value(&status);
            status_counts.get(&key).map(|count| StatusCount {
                status: key,
                count: *count,
            })
        })
        .collect();

    let mut branch_counts: HashMap<String, u64> = HashMap::new();
    for profile in students.iter().filter(|s| s.is_placed) {
        *branch_counts.entry(profile.branch.clone()).or_insert(0) += 1;
    }
    let mut branch_wise_placement: Vec<BranchCount> = branch_counts
        .into_iter()
        .map(|(branch, count)| BranchCount { branch, count })
        .collect();
    branch_wise_placement.sort_by(|a, b| a.branch.cmp(&b.branch));

    let stats = PlacementStatistics {
        total_students,
        placed_students,
        placement_percentage: placement_percentage(placed_students, total_students),
        total_companies,
        total_applications: applications.len() as u64,
        offers_received,
        offers_accepted,
        average_package,
        status_breakdown,
        branch_wise_placement,
    };

    debug!(
        "Statistics computed: {} students, {} applications",
        stats.total_students, stats.total_applications
    );
    Ok(Json(ApiResponse::new(stats, "Statistics computed successfully")))
}

/// Ten most recently updated applications, across all students
#[utoipa::path(
    get,
    path = "/api/placement-progress/recent_updates",
    tag = "placement-progress",
    responses(
        (status = 200, description = "Recent updates retrieved", body = ApiResponse<Vec<ProgressResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn recent_updates(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<ProgressResponse>>>, ApiError> {
    let records = PlacementProgress::find()
        .order_by_desc(placement_progress::Column::UpdatedAt)
        .limit(10)
        .all(&state.db)
        .await?;
    let data: Vec<ProgressResponse> = records.into_iter().map(ProgressResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Recent updates retrieved successfully")))
}

/// The calling student's own applications
#[utoipa::path(
    get,
    path = "/api/placement-progress/my_progress",
    tag = "placement-progress",
    responses(
        (status = 200, description = "Own applications retrieved", body = ApiResponse<MyProgressResponse>),
        (status = 404, description = "No student profile linked to this account", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn my_progress(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<MyProgressResponse>>, ApiError> {
    let profile = require_student_profile(&state.db, &auth.user).await?;

    let records = PlacementProgress::find()
        .filter(placement_progress::Column::StudentId.eq(profile.id))
        .order_by_desc(placement_progress::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    let results: Vec<ProgressResponse> = records.into_iter().map(ProgressResponse::from).collect();
    Ok(Json(ApiResponse::new(
        MyProgressResponse {
            count: results.len() as u64,
            results,
        },
        "Own applications retrieved successfully",
    )))
}
