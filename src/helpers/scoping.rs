//! Role-based query scoping.
//!
//! Admins see everything; students see only their own profile and its
//! related records; any other role sees an empty set. The student profile may
//! have been imported before the account was registered, so the link is
//! resolved by user id first and by email or enrollment number as a fallback,
//! and the missing `user_id` is written back when the fallback hits.

use model::entities::{prelude::*, student, user};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter,
};
use tracing::{debug, info};

use crate::error::ApiError;

/// Find the student profile belonging to a user account.
///
/// Looks up the direct `user_id` link first. If there is none, falls back to
/// matching the account email or the username read as an enrollment number,
/// and repairs the link on a hit.
pub async fn resolve_student_profile(
    db: &DatabaseConnection,
    account: &user::Model,
) -> Result<Option<student::Model>, ApiError> {
    if let Some(profile) = Student::find()
        .filter(student::Column::UserId.eq(account.id))
        .one(db)
        .await?
    {
        return Ok(Some(profile));
    }

    let fallback = Student::find()
        .filter(
            Condition::all().add(student::Column::UserId.is_null()).add(
                Condition::any()
                    .add(student::Column::Email.eq(&account.email))
                    .add(student::Column::EnrollmentNumber.eq(account.username.to_uppercase())),
            ),
        )
        .one(db)
        .await?;

    match fallback {
        Some(profile) => {
            info!(
                student_id = profile.id,
                user_id = account.id,
                "linked orphaned student profile to account"
            );
            let mut active = profile.into_active_model();
            active.user_id = Set(Some(account.id));
            let repaired = active.update(db).await?;
            Ok(Some(repaired))
        }
        None => {
            debug!(user_id = account.id, "no student profile for account");
            Ok(None)
        }
    }
}

/// The student profile a student-role caller is scoped to, or 404 when the
/// account has no profile at all.
pub async fn require_student_profile(
    db: &DatabaseConnection,
    account: &user::Model,
) -> Result<student::Model, ApiError> {
    resolve_student_profile(db, account)
        .await?
        .ok_or_else(|| ApiError::NotFound("no student profile linked to this account".to_string()))
}
