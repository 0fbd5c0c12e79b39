use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum StageResult {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CLEARED")]
    Cleared,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

/// Outcome of one pipeline stage within a placement progress record.
/// Exactly one record may exist per (placement_progress, stage) pair.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "stage_progress")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub placement_progress_id: i32,
    pub stage_id: i32,
    pub result: StageResult,
    pub scheduled_date: Option<DateTimeUtc>,
    pub completed_date: Option<DateTimeUtc>,
    pub feedback: String,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::placement_progress::Entity",
        from = "Column::PlacementProgressId",
        to = "super::placement_progress::Column::Id",
        on_delete = "Cascade"
    )]
    PlacementProgress,
    #[sea_orm(
        belongs_to = "super::placement_stage::Entity",
        from = "Column::StageId",
        to = "super::placement_stage::Column::Id",
        on_delete = "Cascade"
    )]
    Stage,
}

impl Related<super::placement_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlacementProgress.def()
    }
}

impl Related<super::placement_stage::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stage.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
