use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::auth::AuthConfig;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Token signing configuration
    pub auth: AuthConfig,
}

/// API response wrapper
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success status
    pub success: bool,
}

impl<T> ApiResponse<T> {
    pub fn new(data: T, message: impl Into<String>) -> Self {
        Self {
            data,
            message: message.into(),
            success: true,
        }
    }
}

/// Error response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::refresh_token,
        crate::handlers::auth::profile,
        crate::handlers::auth::update_profile,
        crate::handlers::auth::change_password,
        crate::handlers::auth::list_users,
        crate::handlers::auth::get_user,
        crate::handlers::auth::verify_user,
        crate::handlers::students::list_students,
        crate::handlers::students::create_student,
        crate::handlers::students::get_student,
        crate::handlers::students::update_student,
        crate::handlers::students::delete_student,
        crate::handlers::students::placed_students,
        crate::handlers::students::unplaced_students,
        crate::handlers::students::placement_history,
        crate::handlers::students::upload_csv,
        crate::handlers::companies::list_companies,
        crate::handlers::companies::create_company,
        crate::handlers::companies::get_company,
        crate::handlers::companies::update_company,
        crate::handlers::companies::delete_company,
        crate::handlers::companies::active_companies,
        crate::handlers::companies::company_applicants,
        crate::handlers::stages::list_stages,
        crate::handlers::stages::create_stage,
        crate::handlers::stages::get_stage,
        crate::handlers::stages::update_stage,
        crate::handlers::stages::delete_stage,
        crate::handlers::placement_progress::list_progress,
        crate::handlers::placement_progress::create_progress,
        crate::handlers::placement_progress::get_progress,
        crate::handlers::placement_progress::update_progress,
        crate::handlers::placement_progress::delete_progress,
        crate::handlers::placement_progress::statistics,
        crate::handlers::placement_progress::recent_updates,
        crate::handlers::placement_progress::my_progress,
        crate::handlers::stage_progress::list_stage_progress,
        crate::handlers::stage_progress::create_stage_progress,
        crate::handlers::stage_progress::get_stage_progress,
        crate::handlers::stage_progress::update_stage_progress,
        crate::handlers::stage_progress::delete_stage_progress,
        crate::handlers::important_dates::list_dates,
        crate::handlers::important_dates::create_date,
        crate::handlers::important_dates::get_date,
        crate::handlers::important_dates::update_date,
        crate::handlers::important_dates::delete_date,
        crate::handlers::important_dates::upcoming_dates,
    ),
    components(
        schemas(
            ApiResponse<crate::handlers::auth::UserResponse>,
            ApiResponse<crate::handlers::students::StudentResponse>,
            ApiResponse<crate::handlers::companies::CompanyResponse>,
            ApiResponse<crate::handlers::placement_progress::ProgressResponse>,
            ApiResponse<common::PlacementStatistics>,
            ApiResponse<common::ImportSummary>,
            ErrorResponse,
            HealthResponse,
            common::PlacementStatistics,
            common::StatusCount,
            common::BranchCount,
            common::ImportSummary,
            crate::handlers::auth::RegisterRequest,
            crate::handlers::auth::LoginRequest,
            crate::handlers::auth::LogoutRequest,
            crate::handlers::auth::RefreshRequest,
            crate::handlers::auth::UpdateProfileRequest,
            crate::handlers::auth::ChangePasswordRequest,
            crate::handlers::auth::UserResponse,
            crate::handlers::auth::TokenPairResponse,
            crate::handlers::auth::RegisterResponse,
            crate::handlers::auth::LoginResponse,
            crate::handlers::auth::AccessTokenResponse,
            crate::handlers::students::CreateStudentRequest,
            crate::handlers::students::UpdateStudentRequest,
            crate::handlers::students::StudentResponse,
            crate::handlers::companies::CreateCompanyRequest,
            crate::handlers::companies::UpdateCompanyRequest,
            crate::handlers::companies::CompanyResponse,
            crate::handlers::stages::CreateStageRequest,
            crate::handlers::stages::UpdateStageRequest,
            crate::handlers::stages::StageResponse,
            crate::handlers::placement_progress::CreateProgressRequest,
            crate::handlers::placement_progress::UpdateProgressRequest,
            crate::handlers::placement_progress::ProgressResponse,
            crate::handlers::placement_progress::MyProgressResponse,
            crate::handlers::stage_progress::CreateStageProgressRequest,
            crate::handlers::stage_progress::UpdateStageProgressRequest,
            crate::handlers::stage_progress::StageProgressResponse,
            crate::handlers::important_dates::CreateDateRequest,
            crate::handlers::important_dates::UpdateDateRequest,
            crate::handlers::important_dates::ImportantDateResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "auth", description = "Registration, login, and user management"),
        (name = "students", description = "Student profiles and CSV import"),
        (name = "companies", description = "Company listings"),
        (name = "stages", description = "Recruitment pipeline stages"),
        (name = "placement-progress", description = "Per-application progress and statistics"),
        (name = "stage-progress", description = "Per-stage outcomes"),
        (name = "important-dates", description = "Recruitment calendar"),
    ),
    info(
        title = "Placement Tracking API",
        description = "College placement tracking system - students, companies, recruitment pipelines, and important dates",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
