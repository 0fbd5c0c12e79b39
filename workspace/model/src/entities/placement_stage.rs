use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum StageType {
    #[sea_orm(string_value = "APPLICATION")]
    Application,
    #[sea_orm(string_value = "APTITUDE")]
    Aptitude,
    #[sea_orm(string_value = "TECHNICAL1")]
    Technical1,
    #[sea_orm(string_value = "TECHNICAL2")]
    Technical2,
    #[sea_orm(string_value = "TECHNICAL3")]
    Technical3,
    #[sea_orm(string_value = "HR")]
    Hr,
    #[sea_orm(string_value = "FINAL")]
    Final,
}

/// One step of a recruitment pipeline, ordered by `sequence_order`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "placement_stages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub stage_type: StageType,
    pub description: String,
    pub sequence_order: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stage_progress::Entity")]
    StageProgress,
}

impl Related<super::stage_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StageProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
