use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use chrono::{DateTime, Utc};
use common::{ImportSummary, two_places};
use model::entities::{placement_progress, prelude::*, student, user};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{AuthUser, Capability, hash_password};
use crate::error::{ApiError, map_unique_violation};
use crate::handlers::placement_progress::ProgressResponse;
use crate::helpers::csv_import::import_students;
use crate::helpers::scoping::resolve_student_profile;
use crate::schemas::{ApiResponse, AppState, ErrorResponse};

/// Request body for creating a student profile
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateStudentRequest {
    #[validate(length(min = 1, message = "enrollment_number must not be empty"))]
    pub enrollment_number: String,
    #[validate(length(min = 1, message = "name must not be empty"))]
    pub name: String,
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub branch: String,
    pub year: String,
    /// Serialized as a string, e.g. "8.75".
    pub cgpa: Decimal,
    #[serde(default)]
    pub skills: String,
    #[serde(default)]
    pub is_placed: bool,
}

/// Request body for updating a student profile; the enrollment number is
/// immutable
#[derive(Debug, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateStudentRequest {
    pub name: Option<String>,
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub branch: Option<String>,
    pub year: Option<String>,
    pub cgpa: Option<Decimal>,
    pub skills: Option<String>,
    pub is_placed: Option<bool>,
}

/// Student response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StudentResponse {
    pub id: i32,
    pub user_id: Option<i32>,
    pub enrollment_number: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub branch: String,
    pub year: String,
    pub cgpa: Decimal,
    pub skills: String,
    pub is_placed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<student::Model> for StudentResponse {
    fn from(model: student::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            enrollment_number: model.enrollment_number,
            name: model.name,
            email: model.email,
            phone: model.phone,
            branch: model.branch,
            year: model.year,
            cgpa: two_places(model.cgpa),
            skills: model.skills,
            is_placed: model.is_placed,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

fn validate_cgpa(cgpa: Decimal) -> Result<(), ApiError> {
    if cgpa < Decimal::ZERO || cgpa > Decimal::from(10) {
        return Err(ApiError::Validation("cgpa must be between 0 and 10".to_string()));
    }
    Ok(())
}

/// Students a caller is allowed to see. Admins see all, students see only
/// their own profile, every other role sees none.
async fn visible_students(
    state: &AppState,
    auth: &AuthUser,
) -> Result<Vec<student::Model>, ApiError> {
    match auth.user.role {
        user::UserRole::Admin => Ok(Student::find()
            .order_by_desc(student::Column::CreatedAt)
            .all(&state.db)
            .await?),
        user::UserRole::Student => Ok(resolve_student_profile(&state.db, &auth.user)
            .await?
            .into_iter()
            .collect()),
        _ => Ok(Vec::new()),
    }
}

/// One student by id, subject to the caller's scope. Out-of-scope ids read
/// as missing rather than forbidden.
async fn visible_student(
    state: &AppState,
    auth: &AuthUser,
    id: i32,
) -> Result<student::Model, ApiError> {
    let profile = Student::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("student with id {} not found", id)))?;

    match auth.user.role {
        user::UserRole::Admin => {}
        user::UserRole::Student => {
            let own = resolve_student_profile(&state.db, &auth.user).await?;
            if own.map(|p| p.id) != Some(profile.id) {
                return Err(ApiError::NotFound(format!("student with id {} not found", id)));
            }
        }
        _ => {
            return Err(ApiError::NotFound(format!("student with id {} not found", id)));
        }
    }
    Ok(profile)
}

/// List students visible to the caller
#[utoipa::path(
    get,
    path = "/api/students",
    tag = "students",
    responses(
        (status = 200, description = "Students retrieved", body = ApiResponse<Vec<StudentResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_students(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<StudentResponse>>>, ApiError> {
    trace!("Entering list_students function");
    let students = visible_students(&state, &auth).await?;
    let data: Vec<StudentResponse> = students.into_iter().map(StudentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Students retrieved successfully")))
}

/// Create a student profile (admin only)
///
/// Also provisions a student login account named after the enrollment
/// number, unless an account with the student's email already exists, in
/// which case the profile is linked to it.
#[utoipa::path(
    post,
    path = "/api/students",
    tag = "students",
    request_body = CreateStudentRequest,
    responses(
        (status = 201, description = "Student created", body = ApiResponse<StudentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(request): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StudentResponse>>), ApiError> {
    trace!("Entering create_student function");
    auth.require(Capability::ManageStudents)?;
    request.validate()?;
    validate_cgpa(request.cgpa)?;

    let enrollment_number = request.enrollment_number.to_uppercase();
    let now = Utc::now();

    let existing_account = User::find()
        .filter(user::Column::Email.eq(&request.email))
        .one(&state.db)
        .await?;
    let account_id = match existing_account {
        Some(account) => {
            debug!("Linking new student profile to existing account {}", account.id);
            account.id
        }
        None => {
            // Initial password is the enrollment number; students are
            // expected to change it after first login.
            let account = user::ActiveModel {
                username: Set(enrollment_number.to_lowercase()),
                email: Set(request.email.clone()),
                password_hash: Set(hash_password(&enrollment_number)),
                first_name: Set(request.name.clone()),
                last_name: Set(String::new()),
                role: Set(user::UserRole::Student),
                phone: Set(request.phone.clone()),
                is_verified: Set(false),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
                ..Default::default()
            }
            .insert(&state.db)
            .await
            .map_err(|e| map_unique_violation(e, "an account with this username already exists"))?;
            info!("Provisioned login account {} for new student", account.id);
            account.id
        }
    };

    let profile = student::ActiveModel {
        user_id: Set(Some(account_id)),
        enrollment_number: Set(enrollment_number),
        name: Set(request.name),
        email: Set(request.email),
        phone: Set(request.phone),
        branch: Set(request.branch),
        year: Set(request.year),
        cgpa: Set(request.cgpa),
        skills: Set(request.skills),
        is_placed: Set(request.is_placed),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.db)
    .await
    .map_err(|e| {
        map_unique_violation(e, "a student with this enrollment number or email already exists")
    })?;

    info!("Student created with ID: {}", profile.id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            StudentResponse::from(profile),
            "Student created successfully",
        )),
    ))
}

/// Get one student by id
#[utoipa::path(
    get,
    path = "/api/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student retrieved", body = ApiResponse<StudentResponse>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<StudentResponse>>, ApiError> {
    let profile = visible_student(&state, &auth, id).await?;
    Ok(Json(ApiResponse::new(
        StudentResponse::from(profile),
        "Student retrieved successfully",
    )))
}

/// Update a student profile (admin only)
#[utoipa::path(
    put,
    path = "/api/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student ID")),
    request_body = UpdateStudentRequest,
    responses(
        (status = 200, description = "Student updated", body = ApiResponse<StudentResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
    Json(request): Json<UpdateStudentRequest>,
) -> Result<Json<ApiResponse<StudentResponse>>, ApiError> {
    trace!("Entering update_student function");
    auth.require(Capability::ManageStudents)?;
    request.validate()?;
    if let Some(cgpa) = request.cgpa {
        validate_cgpa(cgpa)?;
    }

    let profile = Student::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("student with id {} not found", id)))?;

    let mut active: student::ActiveModel = profile.into();
    if let Some(name) = request.name {
        active.name = Set(name);
    }
    if let Some(email) = request.email {
        active.email = Set(email);
    }
    if let Some(phone) = request.phone {
        active.phone = Set(phone);
    }
    if let Some(branch) = request.branch {
        active.branch = Set(branch);
    }
    if let Some(year) = request.year {
        active.year = Set(year);
    }
    if let Some(cgpa) = request.cgpa {
        active.cgpa = Set(cgpa);
    }
    if let Some(skills) = request.skills {
        active.skills = Set(skills);
    }
    if let Some(is_placed) = request.is_placed {
        active.is_placed = Set(is_placed);
    }
    active.updated_at = Set(Utc::now());

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| map_unique_violation(e, "a student with this email already exists"))?;

    info!("Student updated: ID {}", updated.id);
    Ok(Json(ApiResponse::new(
        StudentResponse::from(updated),
        "Student updated successfully",
    )))
}

/// Delete a student profile (admin only)
#[utoipa::path(
    delete,
    path = "/api/students/{id}",
    tag = "students",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "Student deleted", body = ApiResponse<String>),
        (status = 403, description = "Not an admin", body = ErrorResponse),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_student(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    auth.require(Capability::ManageStudents)?;

    let profile = Student::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("student with id {} not found", id)))?;

    Student::delete_by_id(profile.id).exec(&state.db).await?;
    info!("Student deleted: ID {}", id);
    Ok(Json(ApiResponse::new(
        format!("student {} deleted", id),
        "Student deleted successfully",
    )))
}

/// List all placed students
#[utoipa::path(
    get,
    path = "/api/students/placed_students",
    tag = "students",
    responses(
        (status = 200, description = "Placed students retrieved", body = ApiResponse<Vec<StudentResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn placed_students(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<StudentResponse>>>, ApiError> {
    let students = Student::find()
        .filter(student::Column::IsPlaced.eq(true))
        .order_by_desc(student::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let data: Vec<StudentResponse> = students.into_iter().map(StudentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Placed students retrieved successfully")))
}

/// List all unplaced students
#[utoipa::path(
    get,
    path = "/api/students/unplaced_students",
    tag = "students",
    responses(
        (status = 200, description = "Unplaced students retrieved", body = ApiResponse<Vec<StudentResponse>>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn unplaced_students(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<ApiResponse<Vec<StudentResponse>>>, ApiError> {
    let students = Student::find()
        .filter(student::Column::IsPlaced.eq(false))
        .order_by_desc(student::Column::CreatedAt)
        .all(&state.db)
        .await?;
    let data: Vec<StudentResponse> = students.into_iter().map(StudentResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Unplaced students retrieved successfully")))
}

/// Application history of one student, newest first
#[utoipa::path(
    get,
    path = "/api/students/{id}/placement_history",
    tag = "students",
    params(("id" = i32, Path, description = "Student ID")),
    responses(
        (status = 200, description = "History retrieved", body = ApiResponse<Vec<ProgressResponse>>),
        (status = 404, description = "Student not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn placement_history(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<Vec<ProgressResponse>>>, ApiError> {
    let profile = visible_student(&state, &auth, id).await?;

    let history = PlacementProgress::find()
        .filter(placement_progress::Column::StudentId.eq(profile.id))
        .order_by_desc(placement_progress::Column::UpdatedAt)
        .all(&state.db)
        .await?;
    let data: Vec<ProgressResponse> = history.into_iter().map(ProgressResponse::from).collect();
    Ok(Json(ApiResponse::new(data, "Placement history retrieved successfully")))
}

/// Bulk import students from a CSV file (admin only)
#[utoipa::path(
    post,
    path = "/api/students/upload_csv",
    tag = "students",
    request_body(content = Vec<u8>, description = "CSV file upload", content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Import finished", body = ApiResponse<ImportSummary>),
        (status = 400, description = "No file uploaded", body = ErrorResponse),
        (status = 403, description = "Not an admin", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_csv(
    State(state): State<AppState>,
    auth: AuthUser,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    trace!("Entering upload_csv function");
    auth.require(Capability::ImportData)?;

    let mut bytes: Option<Vec<u8>> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(format!("malformed multipart body: {}", e)))?
    {
        if let Some(file_name) = field.file_name() {
            if !file_name.to_lowercase().ends_with(".csv") {
                warn!(file_name = %file_name, "Rejected upload with non-CSV extension");
                return Err(ApiError::Validation("file must be a .csv file".to_string()));
            }
        }
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::Validation(format!("failed to read upload: {}", e)))?;
        bytes = Some(data.to_vec());
        break;
    }

    let bytes = bytes.ok_or_else(|| ApiError::Validation("no file uploaded".to_string()))?;
    if bytes.is_empty() {
        warn!("Empty CSV upload rejected");
        return Err(ApiError::Validation("uploaded file is empty".to_string()));
    }

    let summary = import_students(&state.db, &bytes).await?;
    Ok(Json(ApiResponse::new(summary, "Import finished")))
}
