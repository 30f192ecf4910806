use crate::entity::{bundle, bundle_course, course};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use coursehub_core::domain::{BundleId, CourseId, Price, UserId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, TransactionTrait,
};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: CourseId,
    pub educator_id: UserId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub published: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewCourse {
    pub educator_id: UserId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub published: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CourseChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub published: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct BundleRecord {
    pub id: BundleId,
    pub educator_id: UserId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub course_ids: Vec<CourseId>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBundle {
    pub educator_id: UserId,
    pub title: String,
    pub description: String,
    pub price: Price,
    pub course_ids: Vec<CourseId>,
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, new_course: NewCourse) -> Result<CourseRecord>;
    async fn find_by_id(&self, course_id: CourseId) -> Result<Option<CourseRecord>>;
    async fn find_many(&self, course_ids: &[CourseId]) -> Result<Vec<CourseRecord>>;
    async fn list_published(&self) -> Result<Vec<CourseRecord>>;
    async fn list_by_educator(&self, educator_id: UserId) -> Result<Vec<CourseRecord>>;
    async fn update(
        &self,
        course_id: CourseId,
        changes: CourseChanges,
    ) -> Result<Option<CourseRecord>>;
    async fn delete(&self, course_id: CourseId) -> Result<bool>;

    async fn create_bundle(&self, new_bundle: NewBundle) -> Result<BundleRecord>;
    async fn find_bundle(&self, bundle_id: BundleId) -> Result<Option<BundleRecord>>;
    async fn list_bundles(&self) -> Result<Vec<BundleRecord>>;
    async fn delete_bundle(&self, bundle_id: BundleId) -> Result<bool>;
}

#[derive(Clone)]
pub struct SeaOrmCourseRepository {
    db: DatabaseConnection,
}

impl SeaOrmCourseRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_model(model: course::Model) -> Result<CourseRecord> {
        let id = CourseId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid course.id '{}' from database: {e}", model.id))?;
        let educator_id = UserId::from_str(&model.educator_id).map_err(|e| {
            anyhow!(
                "invalid course.educator_id '{}' from database: {e}",
                model.educator_id
            )
        })?;

        Ok(CourseRecord {
            id,
            educator_id,
            title: model.title,
            description: model.description,
            price: Price::new(model.price_cents)?,
            published: model.published,
            created_at: model.created_at,
        })
    }

    fn map_bundle(model: bundle::Model, links: Vec<bundle_course::Model>) -> Result<BundleRecord> {
        let id = BundleId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid bundle.id '{}' from database: {e}", model.id))?;
        let educator_id = UserId::from_str(&model.educator_id).map_err(|e| {
            anyhow!(
                "invalid bundle.educator_id '{}' from database: {e}",
                model.educator_id
            )
        })?;
        let course_ids = links
            .into_iter()
            .map(|link| {
                CourseId::from_str(&link.course_id).map_err(|e| {
                    anyhow!(
                        "invalid bundle_course.course_id '{}' from database: {e}",
                        link.course_id
                    )
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BundleRecord {
            id,
            educator_id,
            title: model.title,
            description: model.description,
            price: Price::new(model.price_cents)?,
            course_ids,
            created_at: model.created_at,
        })
    }
}

#[async_trait]
impl CourseRepository for SeaOrmCourseRepository {
    async fn create(&self, new_course: NewCourse) -> Result<CourseRecord> {
        let id = CourseId::new();
        let now = Utc::now().naive_utc();

        let active_model = course::ActiveModel {
            id: Set(id.to_string()),
            educator_id: Set(new_course.educator_id.to_string()),
            title: Set(new_course.title),
            description: Set(new_course.description),
            price_cents: Set(new_course.price.cents()),
            published: Set(new_course.published),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_model(model)
    }

    async fn find_by_id(&self, course_id: CourseId) -> Result<Option<CourseRecord>> {
        let model = course::Entity::find_by_id(course_id.to_string())
            .one(&self.db)
            .await?;

        model.map(Self::map_model).transpose()
    }

    async fn find_many(&self, course_ids: &[CourseId]) -> Result<Vec<CourseRecord>> {
        if course_ids.is_empty() {
            return Ok(Vec::new());
        }

        let models = course::Entity::find()
            .filter(course::Column::Id.is_in(course_ids.iter().map(|id| id.to_string())))
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn list_published(&self) -> Result<Vec<CourseRecord>> {
        let models = course::Entity::find()
            .filter(course::Column::Published.eq(true))
            .order_by_desc(course::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn list_by_educator(&self, educator_id: UserId) -> Result<Vec<CourseRecord>> {
        let models = course::Entity::find()
            .filter(course::Column::EducatorId.eq(educator_id.to_string()))
            .order_by_desc(course::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_model).collect()
    }

    async fn update(
        &self,
        course_id: CourseId,
        changes: CourseChanges,
    ) -> Result<Option<CourseRecord>> {
        let Some(model) = course::Entity::find_by_id(course_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        if let Some(title) = changes.title {
            active_model.title = Set(title);
        }
        if let Some(description) = changes.description {
            active_model.description = Set(description);
        }
        if let Some(price) = changes.price {
            active_model.price_cents = Set(price.cents());
        }
        if let Some(published) = changes.published {
            active_model.published = Set(published);
        }
        active_model.updated_at = Set(Utc::now().naive_utc());

        let updated = active_model.update(&self.db).await?;
        Self::map_model(updated).map(Some)
    }

    async fn delete(&self, course_id: CourseId) -> Result<bool> {
        let result = course::Entity::delete_by_id(course_id.to_string())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn create_bundle(&self, new_bundle: NewBundle) -> Result<BundleRecord> {
        let id = BundleId::new();
        let now = Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let model = bundle::ActiveModel {
            id: Set(id.to_string()),
            educator_id: Set(new_bundle.educator_id.to_string()),
            title: Set(new_bundle.title),
            description: Set(new_bundle.description),
            price_cents: Set(new_bundle.price.cents()),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut links = Vec::with_capacity(new_bundle.course_ids.len());
        for course_id in new_bundle.course_ids {
            let link = bundle_course::ActiveModel {
                bundle_id: Set(id.to_string()),
                course_id: Set(course_id.to_string()),
            }
            .insert(&txn)
            .await?;
            links.push(link);
        }

        txn.commit().await?;
        Self::map_bundle(model, links)
    }

    async fn find_bundle(&self, bundle_id: BundleId) -> Result<Option<BundleRecord>> {
        let Some(model) = bundle::Entity::find_by_id(bundle_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let links = model.find_related(bundle_course::Entity).all(&self.db).await?;
        Self::map_bundle(model, links).map(Some)
    }

    async fn list_bundles(&self) -> Result<Vec<BundleRecord>> {
        let rows = bundle::Entity::find()
            .order_by_desc(bundle::Column::CreatedAt)
            .find_with_related(bundle_course::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(model, links)| Self::map_bundle(model, links))
            .collect()
    }

    async fn delete_bundle(&self, bundle_id: BundleId) -> Result<bool> {
        let result = bundle::Entity::delete_by_id(bundle_id.to_string())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}

