use crate::entity::user;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use coursehub_core::domain::{Role, UserId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub role: Role,
    pub password_hash: String,
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord>;
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>>;
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    async fn usernames(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, String>>;
}

#[derive(Clone)]
pub struct SeaOrmUserRepository {
    db: DatabaseConnection,
}

impl SeaOrmUserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_role(code: i16) -> Result<Role> {
        match code {
            0 => Ok(Role::Student),
            1 => Ok(Role::Educator),
            2 => Ok(Role::Admin),
            _ => Err(anyhow!("invalid user.role code from database: {code}")),
        }
    }

    fn map_role_code(role: Role) -> i16 {
        match role {
            Role::Student => 0,
            Role::Educator => 1,
            Role::Admin => 2,
        }
    }

    fn map_model(model: user::Model) -> Result<UserRecord> {
        let id = UserId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid user.id '{}' from database: {e}", model.id))?;

        Ok(UserRecord {
            id,
            username: model.username,
            email: model.email,
            role: Self::map_role(model.role)?,
            password_hash: model.password_hash,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl UserRepository for SeaOrmUserRepository {
    async fn create(&self, new_user: NewUser) -> Result<UserRecord> {
        let id = UserId::new();
        let now = Utc::now().naive_utc();

        let active_model = user::ActiveModel {
            id: Set(id.to_string()),
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            role: Set(Self::map_role_code(new_user.role)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_model(model)
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        let model = user::Entity::find_by_id(user_id.to_string())
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let model = user::Entity::find()
            .filter(user::Column::Username.eq(username))
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn usernames(&self, user_ids: &[UserId]) -> Result<HashMap<UserId, String>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let models = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids.iter().map(|id| id.to_string())))
            .all(&self.db)
            .await?;

        models
            .into_iter()
            .map(|model| {
                let record = Self::map_model(model)?;
                Ok((record.id, record.username))
            })
            .collect()
    }
}
