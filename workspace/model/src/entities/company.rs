use sea_orm::entity::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum CompanyType {
    #[sea_orm(string_value = "PRODUCT")]
    Product,
    #[sea_orm(string_value = "SERVICE")]
    Service,
    #[sea_orm(string_value = "STARTUP")]
    Startup,
    #[sea_orm(string_value = "MNC")]
    Mnc,
}

/// A recruiting company with one job opening per record.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
    pub description: String,
    pub company_type: CompanyType,
    pub website: String,
    /// Annual package in LPA.
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub package_offered: Decimal,
    /// Bounded to [0, 10] at the API layer.
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub min_cgpa_required: Decimal,
    /// Comma-separated branch codes the opening accepts.
    pub eligible_branches: String,
    pub job_role: String,
    pub job_location: String,
    pub contact_person: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::placement_progress::Entity")]
    PlacementProgress,
    #[sea_orm(has_many = "super::important_date::Entity")]
    ImportantDate,
}

impl Related<super::placement_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlacementProgress.def()
    }
}

impl Related<super::important_date::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ImportantDate.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
