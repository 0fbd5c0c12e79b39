use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum EventType {
    #[sea_orm(string_value = "DRIVE")]
    Drive,
    #[sea_orm(string_value = "DEADLINE")]
    Deadline,
    #[sea_orm(string_value = "TEST")]
    Test,
    #[sea_orm(string_value = "INTERVIEW")]
    Interview,
    #[sea_orm(string_value = "RESULT")]
    Result,
    #[sea_orm(string_value = "OTHER")]
    Other,
}

/// A calendar entry for the recruitment season, optionally tied to a company.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "important_dates")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub description: String,
    pub event_type: EventType,
    pub company_id: Option<i32>,
    pub event_date: DateTimeUtc,
    pub location: String,
    /// Event registration or meeting link.
    pub link: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::company::Entity",
        from = "Column::CompanyId",
        to = "super::company::Column::Id",
        on_delete = "Cascade"
    )]
    Company,
}

impl Related<super::company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Company.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
