//! This file serves as the root for all SeaORM entity modules.
//! We define the data models for the placement tracking application here:
//! accounts, the student/company/stage catalog, the per-application
//! progress trackers, and the recruitment calendar.

pub mod company;
pub mod important_date;
pub mod placement_progress;
pub mod placement_stage;
pub mod revoked_token;
pub mod stage_progress;
pub mod student;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::company::Entity as Company;
    pub use super::important_date::Entity as ImportantDate;
    pub use super::placement_progress::Entity as PlacementProgress;
    pub use super::placement_stage::Entity as PlacementStage;
    pub use super::revoked_token::Entity as RevokedToken;
    pub use super::stage_progress::Entity as StageProgress;
    pub use super::student::Entity as Student;
    pub use super::user::Entity as User;
}

#[cfg(test)]
mod test {
    use chrono::{NaiveDate, Utc};
    use migration::{Migrator, MigratorTrait};
    use rust_decimal::Decimal;
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, ConnectionTrait, Database, DatabaseConnection, DbErr,
        EntityTrait, QueryFilter, Set,
    };

    use super::*;
    use prelude::*;

    async fn setup_db() -> Result<DatabaseConnection, DbErr> {
        let db = Database::connect("sqlite::memory:").await?;

        // Enable foreign keys
        db.execute_unprepared("PRAGMA foreign_keys = ON;").await?;

        Migrator::up(&db, None).await.expect("Migrations failed.");
        Ok(db)
    }

    fn student_active(enrollment: &str, email: &str) -> student::ActiveModel {
        let now = Utc::now();
        student::ActiveModel {
            user_id: Set(None),
            enrollment_number: Set(enrollment.to_string()),
            name: Set("Test Student".to_string()),
            email: Set(email.to_string()),
            phone: Set("9999999999".to_string()),
            branch: Set("CSE".to_string()),
            year: Set("4".to_string()),
            cgpa: Set(Decimal::new(850, 2)), // 8.50
            skills: Set("rust,sql".to_string()),
            is_placed: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    fn company_active(name: &str) -> company::ActiveModel {
        let now = Utc::now();
        company::ActiveModel {
            name: Set(name.to_string()),
            description: Set("A company".to_string()),
            company_type: Set(company::CompanyType::Product),
            website: Set(String::new()),
            package_offered: Set(Decimal::new(1200, 2)), // 12.00 LPA
            min_cgpa_required: Set(Decimal::new(700, 2)),
            eligible_branches: Set("CSE,IT".to_string()),
            job_role: Set("Engineer".to_string()),
            job_location: Set("Remote".to_string()),
            contact_person: Set("HR".to_string()),
            contact_email: Set("hr@example.com".to_string()),
            contact_phone: Set("8888888888".to_string()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_entity_integration() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let user = user::ActiveModel {
            username: Set("en2021cs001".to_string()),
            email: Set("alice@example.com".to_string()),
            password_hash: Set("hash".to_string()),
            first_name: Set("Alice".to_string()),
            last_name: Set(String::new()),
            role: Set(user::UserRole::Student),
            phone: Set(String::new()),
            is_verified: Set(false),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let mut student = student_active("EN2021CS001", "alice@example.com");
        student.user_id = Set(Some(user.id));
        let student = student.insert(&db).await?;

        let company = company_active("Acme").insert(&db).await?;

        let stage = placement_stage::ActiveModel {
            name: Set("Aptitude Test".to_string()),
            stage_type: Set(placement_stage::StageType::Aptitude),
            description: Set(String::new()),
            sequence_order: Set(1),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let progress = placement_progress::ActiveModel {
            student_id: Set(student.id),
            company_id: Set(company.id),
            current_stage_id: Set(Some(stage.id)),
            status: Set(placement_progress::ProgressStatus::Applied),
            application_date: Set(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()),
            notes: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let stage_detail = stage_progress::ActiveModel {
            placement_progress_id: Set(progress.id),
            stage_id: Set(stage.id),
            result: Set(stage_progress::StageResult::Pending),
            scheduled_date: Set(None),
            completed_date: Set(None),
            feedback: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        important_date::ActiveModel {
            title: Set("Acme Drive".to_string()),
            description: Set("On-campus drive".to_string()),
            event_type: Set(important_date::EventType::Drive),
            company_id: Set(Some(company.id)),
            event_date: Set(now),
            location: Set("Auditorium".to_string()),
            link: Set(String::new()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Read back through relations
        let found = Student::find()
            .filter(student::Column::EnrollmentNumber.eq("EN2021CS001"))
            .one(&db)
            .await?
            .expect("student should exist");
        assert_eq!(found.user_id, Some(user.id));

        let applications = PlacementProgress::find()
            .filter(placement_progress::Column::CompanyId.eq(company.id))
            .all(&db)
            .await?;
        assert_eq!(applications.len(), 1);
        assert_eq!(applications[0].id, progress.id);

        let details = StageProgress::find()
            .filter(stage_progress::Column::PlacementProgressId.eq(progress.id))
            .all(&db)
            .await?;
        assert_eq!(details.len(), 1);
        assert_eq!(details[0].id, stage_detail.id);

        Ok(())
    }

    #[tokio::test]
    async fn test_unique_student_company_pair() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let student = student_active("EN2021IT002", "bob@example.com")
            .insert(&db)
            .await?;
        let company = company_active("Globex").insert(&db).await?;

        let first = placement_progress::ActiveModel {
            student_id: Set(student.id),
            company_id: Set(company.id),
            current_stage_id: Set(None),
            status: Set(placement_progress::ProgressStatus::Applied),
            application_date: Set(NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()),
            notes: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(first.is_ok());

        let duplicate = placement_progress::ActiveModel {
            student_id: Set(student.id),
            company_id: Set(company.id),
            current_stage_id: Set(None),
            status: Set(placement_progress::ProgressStatus::Shortlisted),
            application_date: Set(NaiveDate::from_ymd_opt(2024, 8, 2).unwrap()),
            notes: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await;
        assert!(duplicate.is_err(), "second record for the same pair must be rejected");

        Ok(())
    }

    #[tokio::test]
    async fn test_cascade_delete_progress() -> Result<(), DbErr> {
        let db = setup_db().await?;
        let now = Utc::now();

        let student = student_active("EN2021ME003", "carol@example.com")
            .insert(&db)
            .await?;
        let company = company_active("Initech").insert(&db).await?;
        let stage = placement_stage::ActiveModel {
            name: Set("HR Round".to_string()),
            stage_type: Set(placement_stage::StageType::Hr),
            description: Set(String::new()),
            sequence_order: Set(5),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        let progress = placement_progress::ActiveModel {
            student_id: Set(student.id),
            company_id: Set(company.id),
            current_stage_id: Set(None),
            status: Set(placement_progress::ProgressStatus::InProgress),
            application_date: Set(NaiveDate::from_ymd_opt(2024, 9, 1).unwrap()),
            notes: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        stage_progress::ActiveModel {
            placement_progress_id: Set(progress.id),
            stage_id: Set(stage.id),
            result: Set(stage_progress::StageResult::Pending),
            scheduled_date: Set(None),
            completed_date: Set(None),
            feedback: Set(String::new()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&db)
        .await?;

        // Deleting the student cascades its progress and stage details.
        Student::delete_by_id(student.id).exec(&db).await?;

        assert_eq!(PlacementProgress::find().all(&db).await?.len(), 0);
        assert_eq!(StageProgress::find().all(&db).await?.len(), 0);

        Ok(())
    }
}
