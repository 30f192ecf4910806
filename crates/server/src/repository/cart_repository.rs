use crate::entity::cart_item;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;
use coursehub_core::domain::{BundleId, CartItemId, CourseId, UserId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};
use std::str::FromStr;

/// What a cart line points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CartTarget {
    Course(CourseId),
    Bundle(BundleId),
}

#[derive(Debug, Clone)]
pub struct CartItemRecord {
    pub id: CartItemId,
    pub user_id: UserId,
    pub target: CartTarget,
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn add(&self, user_id: UserId, target: CartTarget) -> Result<CartItemRecord>;
    async fn contains(&self, user_id: UserId, target: CartTarget) -> Result<bool>;
    async fn list(&self, user_id: UserId) -> Result<Vec<CartItemRecord>>;
    async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<bool>;
    async fn clear(&self, user_id: UserId) -> Result<u64>;
}

#[derive(Clone)]
pub struct SeaOrmCartRepository {
    db: DatabaseConnection,
}

impl SeaOrmCartRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_model(model: cart_item::Model) -> Result<CartItemRecord> {
        let id = CartItemId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid cart_item.id '{}' from database: {e}", model.id))?;
        let user_id = UserId::from_str(&model.user_id).map_err(|e| {
            anyhow!(
                "invalid cart_item.user_id '{}' from database: {e}",
                model.user_id
            )
        })?;

        let target = match (model.course_id, model.bundle_id) {
            (Some(course_id), None) => CartTarget::Course(
                CourseId::from_str(&course_id)
                    .map_err(|e| anyhow!("invalid cart_item.course_id '{course_id}': {e}"))?,
            ),
            (None, Some(bundle_id)) => CartTarget::Bundle(
                BundleId::from_str(&bundle_id)
                    .map_err(|e| anyhow!("invalid cart_item.bundle_id '{bundle_id}': {e}"))?,
            ),
            _ => {
                return Err(anyhow!(
                    "cart_item {} must reference exactly one course or bundle",
                    model.id
                ));
            }
        };

        Ok(CartItemRecord {
            id,
            user_id,
            target,
        })
    }

    fn target_columns(target: CartTarget) -> (Option<String>, Option<String>) {
        match target {
            CartTarget::Course(id) => (Some(id.to_string()), None),
            CartTarget::Bundle(id) => (None, Some(id.to_string())),
        }
    }
}

#[async_trait]
impl CartRepository for SeaOrmCartRepository {
    async fn add(&self, user_id: UserId, target: CartTarget) -> Result<CartItemRecord> {
        let (course_id, bundle_id) = Self::target_columns(target);

        let active_model = cart_item::ActiveModel {
            id: Set(CartItemId::new().to_string()),
            user_id: Set(user_id.to_string()),
            course_id: Set(course_id),
            bundle_id: Set(bundle_id),
            created_at: Set(Utc::now().naive_utc()),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_model(model)
    }

    async fn contains(&self, user_id: UserId, target: CartTarget) -> Result<bool> {
        let query = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id.to_string()));
        let query = match target {
            CartTarget::Course(id) => query.filter(cart_item::Column::CourseId.eq(id.to_string())),
            CartTarget::Bundle(id) => query.filter(cart_item::Column::BundleId.eq(id.to_string())),
        };

        Ok(query.one(&self.db).await?.is_some())
    }

    async fn list(&self, user_id: UserId) -> Result<Vec<CartItemRecord>> {
        let models = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(user_id.to_string()))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn remove(&self, user_id: UserId, item_id: CartItemId) -> Result<bool> {
        let result = cart_item::Entity::delete_many()
            .filter(cart_item::Column::Id.eq(item_id.to_string()))
            .filter(cart_item::Column::UserId.eq(user_id.to_string()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn clear(&self, user_id: UserId) -> Result<u64> {
        let result = cart_item::Entity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id.to_string()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected)
    }
}
