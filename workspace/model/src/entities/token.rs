use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, Set, SqlErr};
use tracing::debug;

use super::user;
use crate::identity;

/// An opaque API token. Each user holds at most one; logging in again returns
/// the existing key.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    #[sea_orm(unique)]
    pub user_id: i32,
    pub created: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Returns the user's token, issuing a fresh key on first use.
///
/// Two first logins can race past the lookup; the loser of the insert gets
/// the winner's row back.
pub async fn get_or_create<C: ConnectionTrait>(db: &C, user: &user::Model) -> Result<Model, DbErr> {
    if let Some(existing) = find_by_user(db, user.id).await? {
        return Ok(existing);
    }

    debug!("Issuing new token for user {}", user.id);
    let inserted = ActiveModel {
        key: Set(identity::generate_token_key()),
        user_id: Set(user.id),
        created: Set(chrono::Utc::now()),
    }
    .insert(db)
    .await;

    match inserted {
        Ok(token) => Ok(token),
        Err(db_err) => match db_err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                debug!("Token for user {} was issued concurrently", user.id);
                find_by_user(db, user.id)
                    .await?
                    .ok_or(db_err)
            }
            _ => Err(db_err),
        },
    }
}

async fn find_by_user<C: ConnectionTrait>(db: &C, user_id: i32) -> Result<Option<Model>, DbErr> {
    Entity::find()
        .filter(Column::UserId.eq(user_id))
        .one(db)
        .await
}

/// Resolves a token key to its owner.
pub async fn find_user<C: ConnectionTrait>(db: &C, key: &str) -> Result<Option<user::Model>, DbErr> {
    let found = Entity::find_by_id(key.to_owned())
        .find_also_related(user::Entity)
        .one(db)
        .await?;

    Ok(found.and_then(|(_, user)| user))
}
