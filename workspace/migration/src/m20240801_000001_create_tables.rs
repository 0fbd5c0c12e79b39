use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create users table
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    .col(pk_auto(Users::Id))
                    .col(string(Users::Username).unique_key())
                    .col(string(Users::Email).unique_key())
                    .col(string(Users::PasswordHash))
                    .col(string(Users::FirstName))
                    .col(string(Users::LastName))
                    .col(string_len(Users::Role, 20))
                    .col(string(Users::Phone))
                    .col(boolean(Users::IsVerified).default(false))
                    .col(boolean(Users::IsActive).default(true))
                    .col(timestamp_with_time_zone(Users::CreatedAt))
                    .col(timestamp_with_time_zone(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create students table
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(pk_auto(Students::Id))
                    .col(integer_null(Students::UserId).unique_key())
                    .col(string_len(Students::EnrollmentNumber, 20).unique_key())
                    .col(string(Students::Name))
                    .col(string(Students::Email).unique_key())
                    .col(string(Students::Phone))
                    .col(string_len(Students::Branch, 10))
                    .col(string_len(Students::Year, 1))
                    .col(decimal_len(Students::Cgpa, 4, 2))
                    .col(text(Students::Skills))
                    .col(boolean(Students::IsPlaced).default(false))
                    .col(timestamp_with_time_zone(Students::CreatedAt))
                    .col(timestamp_with_time_zone(Students::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_student_user")
                            .from(Students::Table, Students::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create companies table
        manager
            .create_table(
                Table::create()
                    .table(Companies::Table)
                    .if_not_exists()
                    .col(pk_auto(Companies::Id))
                    .col(string(Companies::Name))
                    .col(text(Companies::Description))
                    .col(string_len(Companies::CompanyType, 20))
                    .col(string(Companies::Website))
                    .col(decimal_len(Companies::PackageOffered, 10, 2))
                    .col(decimal_len(Companies::MinCgpaRequired, 4, 2))
                    .col(string(Companies::EligibleBranches))
                    .col(string(Companies::JobRole))
                    .col(string(Companies::JobLocation))
                    .col(string(Companies::ContactPerson))
                    .col(string(Companies::ContactEmail))
                    .col(string(Companies::ContactPhone))
                    .col(boolean(Companies::IsActive).default(true))
                    .col(timestamp_with_time_zone(Companies::CreatedAt))
                    .col(timestamp_with_time_zone(Companies::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        // Create placement_stages table
        manager
            .create_table(
                Table::create()
                    .table(PlacementStages::Table)
                    .if_not_exists()
                    .col(pk_auto(PlacementStages::Id))
                    .col(string(PlacementStages::Name))
                    .col(string_len(PlacementStages::StageType, 20))
                    .col(text(PlacementStages::Description))
                    .col(integer(PlacementStages::SequenceOrder).default(1))
                    .to_owned(),
            )
            .await?;

        // Create placement_progress table
        manager
            .create_table(
                Table::create()
                    .table(PlacementProgress::Table)
                    .if_not_exists()
                    .col(pk_auto(PlacementProgress::Id))
                    .col(integer(PlacementProgress::StudentId))
                    .col(integer(PlacementProgress::CompanyId))
                    .col(integer_null(PlacementProgress::CurrentStageId))
                    .col(string_len(PlacementProgress::Status, 20).default("APPLIED"))
                    .col(date(PlacementProgress::ApplicationDate))
                    .col(text(PlacementProgress::Notes))
                    .col(timestamp_with_time_zone(PlacementProgress::CreatedAt))
                    .col(timestamp_with_time_zone(PlacementProgress::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_placement_progress_student")
                            .from(PlacementProgress::Table, PlacementProgress::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_placement_progress_company")
                            .from(PlacementProgress::Table, PlacementProgress::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_placement_progress_current_stage")
                            .from(PlacementProgress::Table, PlacementProgress::CurrentStageId)
                            .to(PlacementStages::Table, PlacementStages::Id)
                            .on_delete(ForeignKeyAction::SetNull)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Exactly one progress record per (student, company)
        manager
            .create_index(
                Index::create()
                    .name("uq_placement_progress_student_company")
                    .table(PlacementProgress::Table)
                    .col(PlacementProgress::StudentId)
                    .col(PlacementProgress::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create stage_progress table
        manager
            .create_table(
                Table::create()
                    .table(StageProgress::Table)
                    .if_not_exists()
                    .col(pk_auto(StageProgress::Id))
                    .col(integer(StageProgress::PlacementProgressId))
                    .col(integer(StageProgress::StageId))
                    .col(string_len(StageProgress::Result, 20).default("PENDING"))
                    .col(timestamp_with_time_zone_null(StageProgress::ScheduledDate))
                    .col(timestamp_with_time_zone_null(StageProgress::CompletedDate))
                    .col(text(StageProgress::Feedback))
                    .col(timestamp_with_time_zone(StageProgress::CreatedAt))
                    .col(timestamp_with_time_zone(StageProgress::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stage_progress_progress")
                            .from(StageProgress::Table, StageProgress::PlacementProgressId)
                            .to(PlacementProgress::Table, PlacementProgress::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_stage_progress_stage")
                            .from(StageProgress::Table, StageProgress::StageId)
                            .to(PlacementStages::Table, PlacementStages::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One record per stage per progress
        manager
            .create_index(
                Index::create()
                    .name("uq_stage_progress_progress_stage")
                    .table(StageProgress::Table)
                    .col(StageProgress::PlacementProgressId)
                    .col(StageProgress::StageId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Create important_dates table
        manager
            .create_table(
                Table::create()
                    .table(ImportantDates::Table)
                    .if_not_exists()
                    .col(pk_auto(ImportantDates::Id))
                    .col(string(ImportantDates::Title))
                    .col(text(ImportantDates::Description))
                    .col(string_len(ImportantDates::EventType, 20))
                    .col(integer_null(ImportantDates::CompanyId))
                    .col(timestamp_with_time_zone(ImportantDates::EventDate))
                    .col(string(ImportantDates::Location))
                    .col(string(ImportantDates::Link))
                    .col(boolean(ImportantDates::IsActive).default(true))
                    .col(timestamp_with_time_zone(ImportantDates::CreatedAt))
                    .col(timestamp_with_time_zone(ImportantDates::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_important_date_company")
                            .from(ImportantDates::Table, ImportantDates::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create revoked_tokens table
        manager
            .create_table(
                Table::create()
                    .table(RevokedTokens::Table)
                    .if_not_exists()
                    .col(pk_auto(RevokedTokens::Id))
                    .col(string(RevokedTokens::Jti).unique_key())
                    .col(timestamp_with_time_zone(RevokedTokens::ExpiresAt))
                    .col(timestamp_with_time_zone(RevokedTokens::RevokedAt))
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RevokedTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ImportantDates::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(StageProgress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlacementProgress::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PlacementStages::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Companies::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
    Username,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Role,
    Phone,
    IsVerified,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Students {
    Table,
    Id,
    UserId,
    EnrollmentNumber,
    Name,
    Email,
    Phone,
    Branch,
    Year,
    Cgpa,
    Skills,
    IsPlaced,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Companies {
    Table,
    Id,
    Name,
    Description,
    CompanyType,
    Website,
    PackageOffered,
    MinCgpaRequired,
    EligibleBranches,
    JobRole,
    JobLocation,
    ContactPerson,
    ContactEmail,
    ContactPhone,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PlacementStages {
    Table,
    Id,
    Name,
    StageType,
    Description,
    SequenceOrder,
}

#[derive(DeriveIden)]
enum PlacementProgress {
    Table,
    Id,
    StudentId,
    CompanyId,
    CurrentStageId,
    Status,
    ApplicationDate,
    Notes,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum StageProgress {
    Table,
    Id,
    PlacementProgressId,
    StageId,
    Result,
    ScheduledDate,
    CompletedDate,
    Feedback,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ImportantDates {
    Table,
    Id,
    Title,
    Description,
    EventType,
    CompanyId,
    EventDate,
    Location,
    Link,
    IsActive,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum RevokedTokens {
    Table,
    Id,
    Jti,
    ExpiresAt,
    RevokedAt,
}
