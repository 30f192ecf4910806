use crate::entity::{cart_item, enrollment, order, order_item};
use crate::repository::cart_repository::CartTarget;
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDateTime;
use coursehub_core::domain::{BundleId, CourseId, OrderId, OrderStatus, Price, UserId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, ModelTrait, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use std::collections::HashSet;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct OrderItemRecord {
    pub target: CartTarget,
    pub title: String,
    pub price: Price,
}

#[derive(Debug, Clone)]
pub struct OrderRecord {
    pub id: OrderId,
    pub user_id: UserId,
    pub status: OrderStatus,
    pub total: Price,
    pub items: Vec<OrderItemRecord>,
    pub created_at: NaiveDateTime,
    pub paid_at: Option<NaiveDateTime>,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Creates a pending order from `items` and empties the user's cart.
    async fn place(
        &self,
        user_id: UserId,
        items: Vec<OrderItemRecord>,
        placed_at: NaiveDateTime,
    ) -> Result<OrderRecord>;
    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;
    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>>;
    /// Marks a pending order paid and enrolls its owner in `course_ids`.
    /// Returns `None` when the order is missing or no longer pending.
    async fn mark_paid(
        &self,
        order_id: OrderId,
        course_ids: &[CourseId],
        paid_at: NaiveDateTime,
    ) -> Result<Option<OrderRecord>>;
    /// Cancels a pending order. Returns `None` when the order is missing or
    /// no longer pending.
    async fn cancel(&self, order_id: OrderId) -> Result<Option<OrderRecord>>;
    async fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> Result<bool>;
    async fn enrolled_course_ids(&self, user_id: UserId) -> Result<HashSet<CourseId>>;
}

#[derive(Clone)]
pub struct SeaOrmOrderRepository {
    db: DatabaseConnection,
}

impl SeaOrmOrderRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_status(code: i16) -> Result<OrderStatus> {
        match code {
            0 => Ok(OrderStatus::Pending),
            1 => Ok(OrderStatus::Paid),
            2 => Ok(OrderStatus::Cancelled),
            _ => Err(anyhow!("invalid order.status code from database: {code}")),
        }
    }

    fn map_status_code(status: OrderStatus) -> i16 {
        match status {
            OrderStatus::Pending => 0,
            OrderStatus::Paid => 1,
            OrderStatus::Cancelled => 2,
        }
    }

    fn map_item(model: order_item::Model) -> Result<OrderItemRecord> {
        let target = match (model.course_id, model.bundle_id) {
            (Some(course_id), None) => CartTarget::Course(
                CourseId::from_str(&course_id)
                    .map_err(|e| anyhow!("invalid order_item.course_id '{course_id}': {e}"))?,
            ),
            (None, Some(bundle_id)) => CartTarget::Bundle(
                BundleId::from_str(&bundle_id)
                    .map_err(|e| anyhow!("invalid order_item.bundle_id '{bundle_id}': {e}"))?,
            ),
            _ => {
                return Err(anyhow!(
                    "order_item {} must reference exactly one course or bundle",
                    model.id
                ));
            }
        };

        Ok(OrderItemRecord {
            target,
            title: model.title,
            price: Price::new(model.price_cents)?,
        })
    }

    fn map_model(model: order::Model, items: Vec<order_item::Model>) -> Result<OrderRecord> {
        let id = OrderId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid order.id '{}' from database: {e}", model.id))?;
        let user_id = UserId::from_str(&model.user_id).map_err(|e| {
            anyhow!(
                "invalid order.user_id '{}' from database: {e}",
                model.user_id
            )
        })?;

        Ok(OrderRecord {
            id,
            user_id,
            status: Self::map_status(model.status)?,
            total: Price::new(model.total_cents)?,
            items: items
                .into_iter()
                .map(Self::map_item)
                .collect::<Result<Vec<_>>>()?,
            created_at: model.created_at,
            paid_at: model.paid_at,
        })
    }

    /// Moves a pending order to `status`; false when it was not pending.
    async fn leave_pending<C: ConnectionTrait>(
        conn: &C,
        order_id: OrderId,
        status: OrderStatus,
        paid_at: Option<NaiveDateTime>,
    ) -> Result<bool> {
        let result = order::Entity::update_many()
            .col_expr(order::Column::Status, Expr::value(Self::map_status_code(status)))
            .col_expr(order::Column::PaidAt, Expr::value(paid_at))
            .filter(order::Column::Id.eq(order_id.to_string()))
            .filter(order::Column::Status.eq(Self::map_status_code(OrderStatus::Pending)))
            .exec(conn)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn place(
        &self,
        user_id: UserId,
        items: Vec<OrderItemRecord>,
        placed_at: NaiveDateTime,
    ) -> Result<OrderRecord> {
        let id = OrderId::new();
        let total = Price::total(items.iter().map(|item| item.price))?;
        let txn = self.db.begin().await?;

        let model = order::ActiveModel {
            id: Set(id.to_string()),
            user_id: Set(user_id.to_string()),
            status: Set(Self::map_status_code(OrderStatus::Pending)),
            total_cents: Set(total.cents()),
            created_at: Set(placed_at),
            paid_at: Set(None),
        }
        .insert(&txn)
        .await?;

        let mut item_models = Vec::with_capacity(items.len());
        for item in items {
            let (course_id, bundle_id) = match item.target {
                CartTarget::Course(course_id) => (Some(course_id.to_string()), None),
                CartTarget::Bundle(bundle_id) => (None, Some(bundle_id.to_string())),
            };
            let item_model = order_item::ActiveModel {
                id: Set(uuid::Uuid::new_v4().to_string()),
                order_id: Set(id.to_string()),
                course_id: Set(course_id),
                bundle_id: Set(bundle_id),
                title: Set(item.title),
                price_cents: Set(item.price.cents()),
            }
            .insert(&txn)
            .await?;
            item_models.push(item_model);
        }

        cart_item::Entity::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id.to_string()))
            .exec(&txn)
            .await?;

        txn.commit().await?;
        Self::map_model(model, item_models)
    }

    async fn find_by_id(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        let Some(model) = order::Entity::find_by_id(order_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let items = model.find_related(order_item::Entity).all(&self.db).await?;
        Self::map_model(model, items).map(Some)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<OrderRecord>> {
        let rows = order::Entity::find()
            .filter(order::Column::UserId.eq(user_id.to_string()))
            .order_by_desc(order::Column::CreatedAt)
            .find_with_related(order_item::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(model, items)| Self::map_model(model, items))
            .collect()
    }

    async fn mark_paid(
        &self,
        order_id: OrderId,
        course_ids: &[CourseId],
        paid_at: NaiveDateTime,
    ) -> Result<Option<OrderRecord>> {
        let txn = self.db.begin().await?;

        // the status flip comes first so a concurrent cancel cannot slip in
        if !Self::leave_pending(&txn, order_id, OrderStatus::Paid, Some(paid_at)).await? {
            txn.rollback().await?;
            return Ok(None);
        }

        let user_id: Option<String> = order::Entity::find_by_id(order_id.to_string())
            .select_only()
            .column(order::Column::UserId)
            .into_tuple()
            .one(&txn)
            .await?;
        let user_id =
            user_id.ok_or_else(|| anyhow!("order {order_id} disappeared while being paid"))?;

        let already: Vec<String> = enrollment::Entity::find()
            .select_only()
            .column(enrollment::Column::CourseId)
            .filter(enrollment::Column::UserId.eq(user_id.clone()))
            .into_tuple()
            .all(&txn)
            .await?;
        let already: HashSet<String> = already.into_iter().collect();

        for course_id in course_ids {
            let course_id = course_id.to_string();
            if already.contains(&course_id) {
                continue;
            }
            enrollment::ActiveModel {
                user_id: Set(user_id.clone()),
                course_id: Set(course_id),
                order_id: Set(order_id.to_string()),
                created_at: Set(paid_at),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;
        self.find_by_id(order_id).await
    }

    async fn cancel(&self, order_id: OrderId) -> Result<Option<OrderRecord>> {
        if !Self::leave_pending(&self.db, order_id, OrderStatus::Cancelled, None).await? {
            return Ok(None);
        }

        self.find_by_id(order_id).await
    }

    async fn is_enrolled(&self, user_id: UserId, course_id: CourseId) -> Result<bool> {
        let model = enrollment::Entity::find_by_id((user_id.to_string(), course_id.to_string()))
            .one(&self.db)
            .await?;

        Ok(model.is_some())
    }

    async fn enrolled_course_ids(&self, user_id: UserId) -> Result<HashSet<CourseId>> {
        let ids: Vec<String> = enrollment::Entity::find()
            .select_only()
            .column(enrollment::Column::CourseId)
            .filter(enrollment::Column::UserId.eq(user_id.to_string()))
            .into_tuple()
            .all(&self.db)
            .await?;

        ids.iter()
            .map(|raw| {
                CourseId::from_str(raw)
                    .map_err(|e| anyhow!("invalid enrollment.course_id '{raw}': {e}"))
            })
            .collect()
    }
}
