//! User credential table entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{Credential, Password};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Credential {
    fn from(model: Model) -> Self {
        Credential {
            id: model.id,
            username: model.username,
            password_hash: Password::from_hash(model.password_hash),
        }
    }
}
