use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    /// Stored lower-cased; unique regardless of the case it was typed in.
    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id hash of the password. Plaintext is never persisted.
    pub password_digest: String,

    /// Opaque 64-char hex token, assigned on creation and rotated on sign-in.
    #[sea_orm(unique)]
    pub remember_token: String,

    pub admin: bool,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::microposts::Entity")]
    Microposts,
}

impl Related<super::microposts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Microposts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
