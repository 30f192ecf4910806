use crate::entity::{announcement, faq};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use coursehub_core::domain::{AnnouncementId, CourseId, FaqId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder,
};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct AnnouncementRecord {
    pub id: AnnouncementId,
    pub course_id: CourseId,
    pub title: String,
    pub body: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct FaqRecord {
    pub id: FaqId,
    pub course_id: CourseId,
    pub question: String,
    pub answer: String,
    pub position: i32,
}

/// Course-scoped announcements and FAQ entries.
#[async_trait]
pub trait ContentRepository: Send + Sync {
    async fn create_announcement(
        &self,
        course_id: CourseId,
        title: String,
        body: String,
    ) -> Result<AnnouncementRecord>;
    async fn list_announcements(&self, course_id: CourseId) -> Result<Vec<AnnouncementRecord>>;
    async fn delete_announcement(
        &self,
        course_id: CourseId,
        announcement_id: AnnouncementId,
    ) -> Result<bool>;

    async fn create_faq(
        &self,
        course_id: CourseId,
        question: String,
        answer: String,
    ) -> Result<FaqRecord>;
    async fn list_faqs(&self, course_id: CourseId) -> Result<Vec<FaqRecord>>;
    async fn delete_faq(&self, course_id: CourseId, faq_id: FaqId) -> Result<bool>;
}

#[derive(Clone)]
pub struct SeaOrmContentRepository {
    db: DatabaseConnection,
}

impl SeaOrmContentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn parse_course_id(raw: &str, table: &str) -> Result<CourseId> {
        CourseId::from_str(raw)
            .map_err(|e| anyhow!("invalid {table}.course_id '{raw}' from database: {e}"))
    }

    fn map_announcement(model: announcement::Model) -> Result<AnnouncementRecord> {
        let id = AnnouncementId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid announcement.id '{}' from database: {e}", model.id))?;

        Ok(AnnouncementRecord {
            id,
            course_id: Self::parse_course_id(&model.course_id, "announcement")?,
            title: model.title,
            body: model.body,
            created_at: model.created_at,
        })
    }

    fn map_faq(model: faq::Model) -> Result<FaqRecord> {
        let id = FaqId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid faq.id '{}' from database: {e}", model.id))?;

        Ok(FaqRecord {
            id,
            course_id: Self::parse_course_id(&model.course_id, "faq")?,
            question: model.question,
            answer: model.answer,
            position: model.position,
        })
    }
}

#[async_trait]
impl ContentRepository for SeaOrmContentRepository {
    async fn create_announcement(
        &self,
        course_id: CourseId,
        title: String,
        body: String,
    ) -> Result<AnnouncementRecord> {
        let active_model = announcement::ActiveModel {
            id: Set(AnnouncementId::new().to_string()),
            course_id: Set(course_id.to_string()),
            title: Set(title),
            body: Set(body),
            created_at: Set(Utc::now().naive_utc()),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_announcement(model)
    }

    async fn list_announcements(&self, course_id: CourseId) -> Result<Vec<AnnouncementRecord>> {
        let models = announcement::Entity::find()
            .filter(announcement::Column::CourseId.eq(course_id.to_string()))
            .order_by_desc(announcement::Column::CreatedAt)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_announcement).collect()
    }

    async fn delete_announcement(
        &self,
        course_id: CourseId,
        announcement_id: AnnouncementId,
    ) -> Result<bool> {
        let result = announcement::Entity::delete_many()
            .filter(announcement::Column::Id.eq(announcement_id.to_string()))
            .filter(announcement::Column::CourseId.eq(course_id.to_string()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn create_faq(
        &self,
        course_id: CourseId,
        question: String,
        answer: String,
    ) -> Result<FaqRecord> {
        let position = faq::Entity::find()
            .filter(faq::Column::CourseId.eq(course_id.to_string()))
            .order_by_desc(faq::Column::Position)
            .one(&self.db)
            .await?
            .map_or(0, |last| last.position + 1);

        let active_model = faq::ActiveModel {
            id: Set(FaqId::new().to_string()),
            course_id: Set(course_id.to_string()),
            question: Set(question),
            answer: Set(answer),
            position: Set(position),
        };

        let model = active_model.insert(&self.db).await?;
        Self::map_faq(model)
    }

    async fn list_faqs(&self, course_id: CourseId) -> Result<Vec<FaqRecord>> {
        let models = faq::Entity::find()
            .filter(faq::Column::CourseId.eq(course_id.to_string()))
            .order_by_asc(faq::Column::Position)
            .all(&self.db)
            .await?;

        models.into_iter().map(Self::map_faq).collect()
    }

    async fn delete_faq(&self, course_id: CourseId, faq_id: FaqId) -> Result<bool> {
        let result = faq::Entity::delete_many()
            .filter(faq::Column::Id.eq(faq_id.to_string()))
            .filter(faq::Column::CourseId.eq(course_id.to_string()))
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }
}
