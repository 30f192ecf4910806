use crate::clock::Clock;
use crate::repository::cart_repository::{CartRepository, CartTarget};
use crate::repository::course_repository::CourseRepository;
use crate::repository::order_repository::{OrderItemRecord, OrderRecord, OrderRepository};
use crate::service::auth_service::AuthenticatedUser;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::parse_id;
use coursehub_api_types::commerce::AddCartItemRequest;
use coursehub_core::domain::{BundleId, CartItemId, CourseId, OrderId, OrderStatus, Price, Role};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{info, warn};

/// A cart entry resolved to what it currently costs.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub id: CartItemId,
    pub target: CartTarget,
    pub title: String,
    pub price: Price,
}

#[derive(Debug, Clone)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total: Price,
}

pub struct CommerceService {
    carts: Arc<dyn CartRepository>,
    orders: Arc<dyn OrderRepository>,
    courses: Arc<dyn CourseRepository>,
    clock: Arc<dyn Clock>,
}

impl CommerceService {
    pub fn new(
        carts: Arc<dyn CartRepository>,
        orders: Arc<dyn OrderRepository>,
        courses: Arc<dyn CourseRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            carts,
            orders,
            courses,
            clock,
        }
    }

    fn parse_target(request: &AddCartItemRequest) -> ServiceResult<CartTarget> {
        match (request.course_id.as_deref(), request.bundle_id.as_deref()) {
            (Some(course_id), None) => Ok(CartTarget::Course(parse_id("course id", course_id)?)),
            (None, Some(bundle_id)) => Ok(CartTarget::Bundle(parse_id("bundle id", bundle_id)?)),
            _ => Err(ServiceError::Validation(
                "exactly one of course_id and bundle_id is required".to_string(),
            )),
        }
    }

    #[tracing::instrument(skip(self, request), fields(user_id = %actor.id))]
    pub async fn add_to_cart(
        &self,
        actor: &AuthenticatedUser,
        request: AddCartItemRequest,
    ) -> ServiceResult<CartView> {
        let target = Self::parse_target(&request)?;
        let owned = self.orders.enrolled_course_ids(actor.id).await?;

        let price = match target {
            CartTarget::Course(course_id) => {
                let course = self
                    .courses
                    .find_by_id(course_id)
                    .await?
                    .filter(|c| c.published)
                    .ok_or_else(|| ServiceError::not_found("course"))?;
                if course.educator_id == actor.id {
                    return Err(ServiceError::Validation(
                        "you cannot buy your own course".to_string(),
                    ));
                }
                if owned.contains(&course_id) {
                    return Err(ServiceError::Conflict(
                        "course already purchased".to_string(),
                    ));
                }
                course.price
            }
            CartTarget::Bundle(bundle_id) => {
                let bundle = self
                    .courses
                    .find_bundle(bundle_id)
                    .await?
                    .ok_or_else(|| ServiceError::not_found("bundle"))?;
                if bundle.course_ids.iter().all(|id| owned.contains(id)) {
                    return Err(ServiceError::Conflict(
                        "every course of this bundle is already purchased".to_string(),
                    ));
                }
                bundle.price
            }
        };

        if self.carts.contains(actor.id, target).await? {
            return Err(ServiceError::Conflict("item already in cart".to_string()));
        }
        self.cart(actor).await?.total.checked_add(price)?;

        let item = self.carts.add(actor.id, target).await?;
        info!(cart_item_id = %item.id, "cart item added");
        self.cart(actor).await
    }

    pub async fn remove_from_cart(
        &self,
        actor: &AuthenticatedUser,
        item_id: CartItemId,
    ) -> ServiceResult<CartView> {
        if !self.carts.remove(actor.id, item_id).await? {
            return Err(ServiceError::not_found("cart item"));
        }
        self.cart(actor).await
    }

    pub async fn clear_cart(&self, actor: &AuthenticatedUser) -> ServiceResult<()> {
        self.carts.clear(actor.id).await?;
        Ok(())
    }

    /// Resolves cart entries to current titles and prices. Entries whose
    /// course was unpublished since are left out.
    pub async fn cart(&self, actor: &AuthenticatedUser) -> ServiceResult<CartView> {
        let items = self.carts.list(actor.id).await?;

        let course_ids: Vec<CourseId> = items
            .iter()
            .filter_map(|item| match item.target {
                CartTarget::Course(id) => Some(id),
                CartTarget::Bundle(_) => None,
            })
            .collect();
        let courses: HashMap<CourseId, _> = self
            .courses
            .find_many(&course_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut lines = Vec::with_capacity(items.len());
        for item in items {
            let line = match item.target {
                CartTarget::Course(course_id) => courses
                    .get(&course_id)
                    .filter(|c| c.published)
                    .map(|c| (c.title.clone(), c.price)),
                CartTarget::Bundle(bundle_id) => self
                    .courses
                    .find_bundle(bundle_id)
                    .await?
                    .map(|b| (b.title, b.price)),
            };
            if let Some((title, price)) = line {
                lines.push(CartLine {
                    id: item.id,
                    target: item.target,
                    title,
                    price,
                });
            }
        }

        let total = Price::total(lines.iter().map(|line| line.price))?;
        Ok(CartView { lines, total })
    }

    #[tracing::instrument(skip(self), fields(user_id = %actor.id))]
    pub async fn checkout(&self, actor: &AuthenticatedUser) -> ServiceResult<OrderRecord> {
        let cart = self.cart(actor).await?;
        if cart.lines.is_empty() {
            return Err(ServiceError::Validation("cart is empty".to_string()));
        }

        let items = cart
            .lines
            .into_iter()
            .map(|line| OrderItemRecord {
                target: line.target,
                title: line.title,
                price: line.price,
            })
            .collect();

        let order = self.orders.place(actor.id, items, self.clock.now()).await?;
        info!(order_id = %order.id, total_cents = order.total.cents(), "order placed");
        Ok(order)
    }

    pub async fn list_orders(&self, actor: &AuthenticatedUser) -> ServiceResult<Vec<OrderRecord>> {
        Ok(self.orders.list_by_user(actor.id).await?)
    }

    pub async fn get_order(
        &self,
        actor: &AuthenticatedUser,
        order_id: OrderId,
    ) -> ServiceResult<OrderRecord> {
        self.orders
            .find_by_id(order_id)
            .await?
            .filter(|order| order.user_id == actor.id || actor.role == Role::Admin)
            .ok_or_else(|| ServiceError::not_found("order"))
    }

    /// Marks a pending order paid and enrolls the buyer in every course it
    /// covers, bundles expanded.
    #[tracing::instrument(skip(self), fields(user_id = %actor.id))]
    pub async fn confirm_order(
        &self,
        actor: &AuthenticatedUser,
        order_id: OrderId,
    ) -> ServiceResult<OrderRecord> {
        let order = self.get_order(actor, order_id).await?;
        order.status.transition_to(OrderStatus::Paid)?;

        let mut course_ids = BTreeSet::new();
        for item in &order.items {
            match item.target {
                CartTarget::Course(course_id) => {
                    course_ids.insert(course_id);
                }
                CartTarget::Bundle(bundle_id) => {
                    course_ids.extend(self.bundle_courses(bundle_id).await?);
                }
            }
        }

        // courses deleted after checkout cannot be enrolled in
        let requested: Vec<CourseId> = course_ids.into_iter().collect();
        let existing: Vec<CourseId> = self
            .courses
            .find_many(&requested)
            .await?
            .into_iter()
            .map(|c| c.id)
            .collect();
        if existing.len() != requested.len() {
            warn!(
                missing = requested.len() - existing.len(),
                "order references deleted courses"
            );
        }

        let paid = self
            .orders
            .mark_paid(order_id, &existing, self.clock.now())
            .await?
            .ok_or_else(Self::no_longer_pending)?;

        info!(order_id = %paid.id, enrollments = existing.len(), "order paid");
        Ok(paid)
    }

    /// The order changed status between the read and the write.
    fn no_longer_pending() -> ServiceError {
        ServiceError::Conflict("order is no longer pending".to_string())
    }

    async fn bundle_courses(&self, bundle_id: BundleId) -> ServiceResult<Vec<CourseId>> {
        match self.courses.find_bundle(bundle_id).await? {
            Some(bundle) => Ok(bundle.course_ids),
            None => {
                warn!(%bundle_id, "ordered bundle no longer exists");
                Ok(Vec::new())
            }
        }
    }

    #[tracing::instrument(skip(self), fields(user_id = %actor.id))]
    pub async fn cancel_order(
        &self,
        actor: &AuthenticatedUser,
        order_id: OrderId,
    ) -> ServiceResult<OrderRecord> {
        let order = self.get_order(actor, order_id).await?;
        order.status.transition_to(OrderStatus::Cancelled)?;

        let cancelled = self
            .orders
            .cancel(order_id)
            .await?
            .ok_or_else(Self::no_longer_pending)?;
        info!(order_id = %cancelled.id, "order cancelled");
        Ok(cancelled)
    }
}
