use sea_orm::entity::prelude::*;

/// Status of one application. There is no enforced transition graph;
/// an admin update may set any status directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProgressStatus {
    #[sea_orm(string_value = "APPLIED")]
    Applied,
    #[sea_orm(string_value = "IN_PROGRESS")]
    InProgress,
    #[sea_orm(string_value = "SHORTLISTED")]
    Shortlisted,
    #[sea_orm(string_value = "SELECTED")]
    Selected,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "OFFER_RECEIVED")]
    OfferReceived,
    #[sea_orm(string_value = "OFFER_ACCEPTED")]
    OfferAccepted,
    #[sea_orm(string_value = "OFFER_DECLINED")]
    OfferDeclined,
}

/// One student's application to one company.
/// Exactly one record may exist per (student, company) pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "placement_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub student_id: i32,
    pub company_id: i32,
    /// Current pipeline position, independent of `status`.
    pub current_stage_id: Option<i32>,
    pub status: ProgressStatus,
    pub application_date: Date,
    pub notes: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::student::Entity",
        from = "Column::StudentId",
        to = "super::student::Column::Id",
        on_delete = "Cascade"
    )]
    Student,
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
    #[sea_orm(
        belongs_to = "super::placement_stage::Entity",
        from = "Column::CurrentStageId",
        to = "super::placement_stage::Column::Id",
        on_delete = "SetNull"
    )]
    CurrentStage,
    #[sea_orm(has_many = "super::stage_progress::Entity")]
    StageProgress,
}

impl Related<super::student::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Student.def()
    }
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl Related<super::placement_stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CurrentStage.def()
    }
}

impl Related<super::stage_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
