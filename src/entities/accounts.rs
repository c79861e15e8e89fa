use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    /// Name shown in the greeting, distinct from the login username.
    pub display_name: String,

    /// Argon2id password hash. Never serialized into a response.
    pub password_hash: String,

    /// Reserved flag; no route reads it yet.
    pub is_admin: bool,

    pub profile_image: String,

    /// Declared alongside the profile picture but not written by any route.
    pub background_image: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::icon_links::Entity")]
    IconLinks,
}

impl Related<super::icon_links::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::IconLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
