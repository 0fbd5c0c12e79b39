use sea_orm::entity::prelude::*;

/// A student profile tracked by the placement cell.
///
/// The optional `user_id` links the profile to a login account; it may be
/// null for students imported before their account was registered, and is
/// repaired lazily by the access-control layer (see the service crate).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub user_id: Option<i32>,
    /// Immutable institutional identifier, e.g. "EN2021CS001".
    #[sea_orm(unique)]
    pub enrollment_number: String,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    pub phone: String,
    /// Academic branch code, e.g. "CSE", "ECE".
    pub branch: String,
    /// Year of study, "1" through "4".
    pub year: String,
    /// Bounded to [0, 10] at the API layer.
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub cgpa: Decimal,
    /// Comma-separated skills.
    pub skills: String,
    pub is_placed: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(has_many = "super::placement_progress::Entity")]
    PlacementProgress,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::placement_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlacementProgress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
