use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use common::two_places;
use model::entities::{company, placement_progress, prelude::*, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{info, trace};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, Capability};
use crate::error::{ApiError, map_unique_violation};
use crate::handlers::placement_progress::ProgressResponse;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a company
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// "PRODUCT", "SERVICE", "STARTUP" or "MNC".
    pub company_type: String,
    #[serde(default)]
    pub website: String,
    /// Annual package in LPA, serialized as a string.
    pub package_offered: Decimal,
    pub min_cgpa_required: Decimal,
    #[serde(default)]
    pub eligible_branches: String,
    pub job_role: String,
    #[serde(default)]
    pub job_location: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub contact_email: String,
    #[serde(default)]
    pub contact_phone: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Request body for updating a company
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub company_type: Option<String>,
    pub website: Option<String>,
    pub package_offered: Option<Decimal>,
    pub min_cgpa_required: Option<Decimal>,
    pub eligible_branches: Option<String>,
    pub job_role: Option<String>,
    pub job_location: Option<String>,
    pub contact_person: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub is_active: Option<bool>,
}

/// Company response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CompanyResponse {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub company_type: String,
    pub website: String,
    pub package_offered: Decimal,
    pub min_cgpa_required: Decimal,
    pub eligible_branches: String,
    pub job_role: String,
    pub job_location: String,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<company::Model> for CompanyResponse {
    fn from(model: company::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            description: model.description,
            company_type: sea_orm::ActiveEnum::to_value(&model.company_type),
            website: model.website,
            package_offered: two_places(model.package_offered),
            min_cgpa_required: model.min_cgpa_required,
            eligible_branches: model.eligible_branches,
            job_role: model.job_role,
            job_location: model.job_location,
            contact_person: model.contact_person,
            contact_email: model.contact_email,
            contact_phone: model.contact_phone,
            is_active: model.is_active,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn parse_company_type(raw: &str) -> Result<company::CompanyType, ApiError> {
    sea_orm::ActiveEnum::try_from_value(&raw.to_string())
        .map_err(|_| ApiError::Validation(format!("unknown company_type '{}'", raw)))
}

fn validate_min_cgpa(cgpa: Decimal) -> Result<(), ApiError> {
    if cgpa < Decimal::ZERO || cgpa > Decimal::from(10) {
        return Err(ApiError::Validation(
            "min_cgpa_required must be between 0 and 10".to_string(),
        ));
    }
    Ok(())
}

/// List all companies
#[utoipa::path(
    get,
    path = "/api/companies",
    tag = "companies",
    responses(
        (status = 200, description = "Companies retrieved", body = ApiResponse<Vec<CompanyResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_companies(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<CompanyResponse>>>, ApiError> {
    trace!("Entering list_companies function");
    let companies = Company::find()
        .order_by_desc(company::Column::PackageOffered)
        .all(&state.db)
        .await?;
    let data: Vec<CompanyResponse> = companies.into_iter().map(CompanyResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Companies retrieved successfully")))
}

/// Create a company (admin only)
#[utoipa::path(
    post,
    path = "/api/companies",
    tag = "companies",
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = ApiResponse<CompanyResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CompanyResponse>>), ApiError> {
    trace!("Entering create_company function");
    auth.require(Capability::ManageCompanies)?;
    request.validate()?;
    validate_min_cgpa(request.min_cgpa_required)?;
    if request.package_offered < Decimal::ZERO {
        return Err(ApiError::Validation("package_offered must not be negative".to_string()));
    }
    let company_type = parse_company_type(&request.company_type)?;

    let now = Utc::now();
    let created = company::ActiveModel {
        name: Set(request.name),
        description: Set(request.description),
        company_type: Set(company_type),
        website: Set(request.website),
        package_offered: Set(request.package_offered),
        min_cgpa_required: Set(request.min_cgpa_required),
        eligible_branches: Set(request.eligible_branches),
        job_role: Set(request.job_role),
        job_location: Set(request.job_location),
        contact_person: Set(request.contact_person),
        contact_email: Set(request.contact_email),
        contact_phone: Set(request.contact_phone),
        is_active: Set(request.is_active),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await?;

    info!("Company created with ID: {}", created.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CompanyResponse::from(created),
            "Company created successfully",
        )),
    ))
}

/// Get one company by id
#[utoipa::path(
    get,
    path = "/api/companies/{id}",
    tag = "companies",
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company retrieved", body = ApiResponse<CompanyResponse>),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_company(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<CompanyResponse>>, ApiError> {
    let found = Company::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company with id {} not found", id)))?;
    Ok(Json(ApiResponse::new(
        CompanyResponse::from(found),
        "Company retrieved successfully",
    )))
}

/// Update a company (admin only)
#[utoipa::path(
    put,
    path = "/api/companies/{id}",
    tag = "companies",
    params(("id" = i32, Path, description = "Company ID")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = ApiResponse<CompanyResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateCompanyRequest>,
) -> Result<Json<ApiResponse<CompanyResponse>>, ApiError> {
    trace!("Entering update_company function");
    auth.require(Capability::ManageCompanies)?;
    request.validate()?;
    if let Some(cgpa) = request.min_cgpa_required {
        validate_min_cgpa(cgpa)?;
    }
    if let Some(package) = request.package_offered {
        if package < Decimal::ZERO {
            return Err(ApiError::Validation("package_offered must not be negative".to_string()));
        }
    }

    let found = Company::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company with id {} not found", id)))?;

    let mut active: company::ActiveModel = found.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(description) = request.description {
        active.description = Set(description);
    }
    if let Some(raw) = request.company_type {
        active.company_type = Set(parse_company_type(&raw)?);
    }
    if let Some(website) = request.website {
        active.website = Set(website);
    }
    if let Some(package_offered) = request.package_offered {
        active.package_offered = Set(package_offered);
    }
    if let Some(min_cgpa_required) = request.min_cgpa_required {
        active.min_cgpa_required = Set(min_cgpa_required);
    }
    if let Some(eligible_branches) = request.eligible_branches {
        active.eligible_branches = Set(eligible_branches);
    }
    if let Some(job_role) = request.job_role {
        active.job_role = Set(job_role);
    }
    if let Some(job_location) = request.job_location {
        active.job_location = Set(job_location);
    }
    if let Some(contact_person) = request.contact_person {
        active.contact_person = Set(contact_person);
    }
    if let Some(contact_email) = request.contact_email {
        active.contact_email = Set(contact_email);
    }
    if let Some(contact_phone) = request.contact_phone {
        active.contact_phone = Set(contact_phone);
    }
    if let Some(is_active) = request.is_active {
        active.is_active = Set(is_active);
    }
    active.updated_at = Set(Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| map_unique_violation(e, "company update violates a constraint"))?;

    info!("Company updated: ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        CompanyResponse::from(updated),
        "Company updated successfully",
    )))
}

/// Delete a company (admin only)
#[utoipa::path(
    delete,
    path = "/api/companies/{id}",
    tag = "companies",
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Company deleted", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_company(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require(Capability::ManageCompanies)?;

    let found = Company::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company with id {} not found", id)))?;

    Company::delete_by_id(found.id).exec(&state.db).await?;
    info!("Company deleted: ID {}", id);
    Ok(Json(ApiResponse::new(
        format!("company {} deleted", id),
        "Company deleted successfully",
    )))
}

/// List companies currently recruiting
#[utoipa::path(
    get,
    path = "/api/companies/active_companies",
    tag = "companies",
    responses(
        (status = 200, description = "Active companies retrieved", body = ApiResponse<Vec<CompanyResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn active_companies(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<CompanyResponse>>>, ApiError> {
    let companies = Company::find()
        .filter(company::Column::IsActive.eq(true))
        .order_by_desc(company::Column::PackageOffered)
        .all(&state.db)
        .await?;
    let data: Vec<CompanyResponse> = companies.into_iter().map(CompanyResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Active companies retrieved successfully")))
}

/// Applications received by one company (admin and company roles)
#[utoipa::path(
    get,
    path = "/api/companies/{id}/applicants",
    tag = "companies",
    params(("id" = i32, Path, description = "Company ID")),
    responses(
        (status = 200, description = "Applicants retrieved", body = ApiResponse<Vec<ProgressResponse>>),
        (status = 403, description = "Student role cannot list applicants", body = ErrorResponse),
        (status = 404, description = "Company not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn company_applicants(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ProgressResponse>>>, ApiError> {
    if auth.user.role == user::UserRole::Student {
        return Err(ApiError::Forbidden(
            "students cannot list company applicants".to_string(),
        ));
    }

    let found = Company::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company with id {} not found", id)))?;

    let applicants = PlacementProgress::find()
        .filter(placement_progress::Column::CompanyId.eq(found.id))
        .order_by_desc(placement_progress::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    let data: Vec<ProgressResponse> = applicants.into_iter().map(ProgressResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Applicants retrieved successfully")))
}
