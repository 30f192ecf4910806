use crate::entity::{review, user};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use coursehub_core::domain::{CourseId, Rating, ReviewId, UserId};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, QuerySelect,
};
use std::collections::HashMap;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct ReviewRecord {
    pub id: ReviewId,
    pub course_id: CourseId,
    pub student_id: UserId,
    pub username: String,
    pub rating: Rating,
    pub comment: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone)]
pub struct NewReview {
    pub course_id: CourseId,
    pub student_id: UserId,
    pub rating: Rating,
    pub comment: String,
}

#[async_trait]
pub trait ReviewRepository: Send + Sync {
    async fn create(&self, new_review: NewReview) -> Result<ReviewRecord>;
    async fn find_by_id(&self, review_id: ReviewId) -> Result<Option<ReviewRecord>>;
    async fn find_by_course_and_student(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<Option<ReviewRecord>>;
    async fn update(
        &self,
        review_id: ReviewId,
        rating: Rating,
        comment: String,
    ) -> Result<Option<ReviewRecord>>;
    async fn delete(&self, review_id: ReviewId) -> Result<bool>;
    async fn list_by_course(&self, course_id: CourseId) -> Result<Vec<ReviewRecord>>;
    async fn ratings_for_course(&self, course_id: CourseId) -> Result<Vec<Rating>>;
    async fn ratings_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<HashMap<CourseId, Vec<Rating>>>;
}

#[derive(Clone)]
pub struct SeaOrmReviewRepository {
    db: DatabaseConnection,
}

impl SeaOrmReviewRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn map_rating(value: i16) -> Result<Rating> {
        let value = u8::try_from(value)
            .map_err(|_| anyhow!("invalid review.rating from database: {value}"))?;
        Ok(Rating::new(value)?)
    }

    fn map_model(model: review::Model, author: Option<user::Model>) -> Result<ReviewRecord> {
        let id = ReviewId::from_str(&model.id)
            .map_err(|e| anyhow!("invalid review.id '{}' from database: {e}", model.id))?;
        let course_id = CourseId::from_str(&model.course_id).map_err(|e| {
            anyhow!(
                "invalid review.course_id '{}' from database: {e}",
                model.course_id
            )
        })?;
        let student_id = UserId::from_str(&model.user_id).map_err(|e| {
            anyhow!(
                "invalid review.user_id '{}' from database: {e}",
                model.user_id
            )
        })?;
        let username = author
            .map(|u| u.username)
            .ok_or_else(|| anyhow!("review {} has no author", model.id))?;

        Ok(ReviewRecord {
            id,
            course_id,
            student_id,
            username,
            rating: Self::map_rating(model.rating)?,
            comment: model.comment,
            created_at: model.created_at,
        })
    }

    async fn load(&self, review_id: &str) -> Result<Option<ReviewRecord>> {
        let row = review::Entity::find_by_id(review_id)
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;

        row.map(|(model, author)| Self::map_model(model, author))
            .transpose()
    }
}

#[async_trait]
impl ReviewRepository for SeaOrmReviewRepository {
    async fn create(&self, new_review: NewReview) -> Result<ReviewRecord> {
        let id = ReviewId::new();
        let now = Utc::now().naive_utc();

        let active_model = review::ActiveModel {
            id: Set(id.to_string()),
            course_id: Set(new_review.course_id.to_string()),
            user_id: Set(new_review.student_id.to_string()),
            rating: Set(i16::from(new_review.rating.value())),
            comment: Set(new_review.comment),
            created_at: Set(now),
            updated_at: Set(now),
        };

        active_model.insert(&self.db).await?;
        self.load(&id.to_string())
            .await?
            .ok_or_else(|| anyhow!("review {id} vanished after insert"))
    }

    async fn find_by_id(&self, review_id: ReviewId) -> Result<Option<ReviewRecord>> {
        self.load(&review_id.to_string()).await
    }

    async fn find_by_course_and_student(
        &self,
        course_id: CourseId,
        student_id: UserId,
    ) -> Result<Option<ReviewRecord>> {
        let row = review::Entity::find()
            .filter(review::Column::CourseId.eq(course_id.to_string()))
            .filter(review::Column::UserId.eq(student_id.to_string()))
            .find_also_related(user::Entity)
            .one(&self.db)
            .await?;

        row.map(|(model, author)| Self::map_model(model, author))
            .transpose()
    }

    async fn update(
        &self,
        review_id: ReviewId,
        rating: Rating,
        comment: String,
    ) -> Result<Option<ReviewRecord>> {
        let Some(model) = review::Entity::find_by_id(review_id.to_string())
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut active_model = model.into_active_model();
        active_model.rating = Set(i16::from(rating.value()));
        active_model.comment = Set(comment);
        active_model.updated_at = Set(Utc::now().naive_utc());
        active_model.update(&self.db).await?;

        self.load(&review_id.to_string()).await
    }

    async fn delete(&self, review_id: ReviewId) -> Result<bool> {
        let result = review::Entity::delete_by_id(review_id.to_string())
            .exec(&self.db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    async fn list_by_course(&self, course_id: CourseId) -> Result<Vec<ReviewRecord>> {
        let rows = review::Entity::find()
            .filter(review::Column::CourseId.eq(course_id.to_string()))
            .order_by_desc(review::Column::CreatedAt)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|(model, author)| Self::map_model(model, author))
            .collect()
    }

    async fn ratings_for_course(&self, course_id: CourseId) -> Result<Vec<Rating>> {
        let ratings: Vec<i16> = review::Entity::find()
            .select_only()
            .column(review::Column::Rating)
            .filter(review::Column::CourseId.eq(course_id.to_string()))
            .into_tuple()
            .all(&self.db)
            .await?;

        ratings.into_iter().map(Self::map_rating).collect()
    }

    async fn ratings_for_courses(
        &self,
        course_ids: &[CourseId],
    ) -> Result<HashMap<CourseId, Vec<Rating>>> {
        if course_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(String, i16)> = review::Entity::find()
            .select_only()
            .column(review::Column::CourseId)
            .column(review::Column::Rating)
            .filter(review::Column::CourseId.is_in(course_ids.iter().map(|id| id.to_string())))
            .into_tuple()
            .all(&self.db)
            .await?;

        let mut ratings: HashMap<CourseId, Vec<Rating>> = HashMap::new();
        for (raw_course_id, value) in rows {
            let course_id = CourseId::from_str(&raw_course_id).map_err(|e| {
                anyhow!("invalid review.course_id '{raw_course_id}' from database: {e}")
            })?;
            ratings
                .entry(course_id)
                .or_default()
                .push(Self::map_rating(value)?);
        }
        Ok(ratings)
    }
}
