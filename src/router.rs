use crate::handlers::{
    auth::{
        change_password, get_user, list_users, login, logout, profile, refresh_token, register,
        update_profile, verify_user,
    },
    companies::{
        active_companies, company_applicants, create_company, delete_company, get_company,
        list_companies, update_company,
    },
    health::{api_root, favicon, health_check},
    important_dates::{
        create_date, delete_date, get_date, list_dates, update_date, upcoming_dates,
    },
    placement_progress::{
        create_progress, delete_progress, get_progress, list_progress, my_progress,
        recent_updates, statistics, update_progress,
    },
    stage_progress::{
        create_stage_progress, delete_stage_progress, get_stage_progress, list_stage_progress,
        update_stage_progress,
    },
    stages::{create_stage, delete_stage, get_stage, list_stages, update_stage},
    students::{
        create_student, delete_student, get_student, list_students, placed_students,
        placement_history, unplaced_students, update_student, upload_csv,
    },
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    Router,
    routing::{delete, get, post, put},
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Discovery and health
        .route("/", get(api_root))
        .route("/health", get(health_check))
        .route("/favicon.ico", get(favicon))
        // Auth routes
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
        .route("/api/auth/token/refresh", post(refresh_token))
        .route("/api/auth/profile", get(profile))
        .route("/api/auth/profile/update", put(update_profile))
        .route("/api/auth/change-password", post(change_password))
        .route("/api/auth/users", get(list_users))
        .route("/api/auth/users/:id", get(get_user))
        .route("/api/auth/users/:id/verify", post(verify_user))
        // Student routes; fixed paths go before the id capture
        .route("/api/students", get(list_students))
        .route("/api/students", post(create_student))
        .route("/api/students/placed_students", get(placed_students))
        .route("/api/students/unplaced_students", get(unplaced_students))
        .route("/api/students/upload_csv", post(upload_csv))
        .route("/api/students/:id", get(get_student))
        .route("/api/students/:id", put(update_student))
        .route("/api/students/:id", delete(delete_student))
        .route("/api/students/:id/placement_history", get(placement_history))
        // Company routes
        .route("/api/companies", get(list_companies))
        .route("/api/companies", post(create_company))
        .route("/api/companies/active_companies", get(active_companies))
        .route("/api/companies/:id", get(get_company))
        .route("/api/companies/:id", put(update_company))
        .route("/api/companies/:id", delete(delete_company))
        .route("/api/companies/:id/applicants", get(company_applicants))
        // Pipeline stage routes
        .route("/api/stages", get(list_stages))
        .route("/api/stages", post(create_stage))
        .route("/api/stages/:id", get(get_stage))
        .route("/api/stages/:id", put(update_stage))
        .route("/api/stages/:id", delete(delete_stage))
        // Application progress routes
        .route("/api/placement-progress", get(list_progress))
        .route("/api/placement-progress", post(create_progress))
        .route("/api/placement-progress/statistics", get(statistics))
        .route("/api/placement-progress/recent_updates", get(recent_updates))
        .route("/api/placement-progress/my_progress", get(my_progress))
        .route("/api/placement-progress/:id", get(get_progress))
        .route("/api/placement-progress/:id", put(update_progress))
        .route("/api/placement-progress/:id", delete(delete_progress))
        // Stage outcome routes
        .route("/api/stage-progress", get(list_stage_progress))
        .route("/api/stage-progress", post(create_stage_progress))
        .route("/api/stage-progress/:id", get(get_stage_progress))
        .route("/api/stage-progress/:id", put(update_stage_progress))
        .route("/api/stage-progress/:id", delete(delete_stage_progress))
        // Calendar routes
        .route("/api/important-dates", get(list_dates))
        .route("/api/important-dates", post(create_date))
        .route("/api/important-dates/upcoming", get(upcoming_dates))
        .route("/api/important-dates/:id", get(get_date))
        .route("/api/important-dates/:id", put(update_date))
        .route("/api/important-dates/:id", delete(delete_date))
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(TimeoutLayer::new(Duration::from_secs(30)))
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
