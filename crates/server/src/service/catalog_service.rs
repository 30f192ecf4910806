use crate::repository::content_repository::{AnnouncementRecord, ContentRepository, FaqRecord};
use crate::repository::course_repository::{
    BundleRecord, CourseChanges, CourseRecord, CourseRepository, NewBundle, NewCourse,
};
use crate::repository::order_repository::OrderRepository;
use crate::repository::review_repository::{NewReview, ReviewRecord, ReviewRepository};
use crate::service::auth_service::AuthenticatedUser;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::{ensure_author, ensure_owner, parse_id};
use coursehub_api_types::catalog::{
    CreateAnnouncementRequest, CreateBundleRequest, CreateCourseRequest, CreateFaqRequest,
    CreateReviewRequest, UpdateCourseRequest,
};
use coursehub_core::domain::{
    AnnouncementId, BundleId, CourseId, DomainError, FaqId, Price, Rating, RatingSummary,
    ReviewId, Role, required_text,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::info;

const TITLE_MAX: usize = 200;
const DESCRIPTION_MAX: usize = 10_000;
const COMMENT_MAX: usize = 2_000;

fn optional_text(value: String, max: usize, field: &'static str) -> ServiceResult<String> {
    let value = value.trim().to_string();
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::FieldTooLong { field, len, max }.into());
    }
    Ok(value)
}

pub struct CatalogService {
    courses: Arc<dyn CourseRepository>,
    reviews: Arc<dyn ReviewRepository>,
    content: Arc<dyn ContentRepository>,
    orders: Arc<dyn OrderRepository>,
}

impl CatalogService {
    pub fn new(
        courses: Arc<dyn CourseRepository>,
        reviews: Arc<dyn ReviewRepository>,
        content: Arc<dyn ContentRepository>,
        orders: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            courses,
            reviews,
            content,
            orders,
        }
    }

    async fn course(&self, course_id: CourseId) -> ServiceResult<CourseRecord> {
        self.courses
            .find_by_id(course_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("course"))
    }

    async fn owned_course(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
    ) -> ServiceResult<CourseRecord> {
        let course = self.course(course_id).await?;
        ensure_owner(actor, course.educator_id, "course")?;
        Ok(course)
    }

    /// Drafts are only visible to their owner and admins.
    fn visible_to(course: &CourseRecord, viewer: Option<&AuthenticatedUser>) -> bool {
        course.published
            || viewer.is_some_and(|v| v.role == Role::Admin || v.id == course.educator_id)
    }

    async fn summaries(
        &self,
        courses: Vec<CourseRecord>,
    ) -> ServiceResult<Vec<(CourseRecord, RatingSummary)>> {
        let ids: Vec<CourseId> = courses.iter().map(|c| c.id).collect();
        let mut ratings = self.reviews.ratings_for_courses(&ids).await?;

        Ok(courses
            .into_iter()
            .map(|course| {
                let summary =
                    RatingSummary::from_ratings(ratings.remove(&course.id).unwrap_or_default());
                (course, summary)
            })
            .collect())
    }

    #[tracing::instrument(skip(self, request), fields(educator_id = %actor.id))]
    pub async fn create_course(
        &self,
        actor: &AuthenticatedUser,
        request: CreateCourseRequest,
    ) -> ServiceResult<CourseRecord> {
        ensure_author(actor)?;

        let course = self
            .courses
            .create(NewCourse {
                educator_id: actor.id,
                title: required_text("title", request.title, TITLE_MAX)?,
                description: optional_text(request.description, DESCRIPTION_MAX, "description")?,
                price: Price::new(request.price_cents)?,
                published: request.published,
            })
            .await?;

        info!(course_id = %course.id, "course created");
        Ok(course)
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn update_course(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
        request: UpdateCourseRequest,
    ) -> ServiceResult<(CourseRecord, RatingSummary)> {
        self.owned_course(actor, course_id).await?;

        let changes = CourseChanges {
            title: request
                .title
                .map(|t| required_text("title", t, TITLE_MAX))
                .transpose()?,
            description: request
                .description
                .map(|d| optional_text(d, DESCRIPTION_MAX, "description"))
                .transpose()?,
            price: request.price_cents.map(Price::new).transpose()?,
            published: request.published,
        };

        let course = self
            .courses
            .update(course_id, changes)
            .await?
            .ok_or_else(|| ServiceError::not_found("course"))?;
        let summary = RatingSummary::from_ratings(self.reviews.ratings_for_course(course_id).await?);
        Ok((course, summary))
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_course(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
    ) -> ServiceResult<()> {
        self.owned_course(actor, course_id).await?;
        self.courses.delete(course_id).await?;
        info!("course deleted");
        Ok(())
    }

    pub async fn get_course(
        &self,
        viewer: Option<&AuthenticatedUser>,
        course_id: CourseId,
    ) -> ServiceResult<(CourseRecord, RatingSummary)> {
        let course = self.course(course_id).await?;
        if !Self::visible_to(&course, viewer) {
            return Err(ServiceError::not_found("course"));
        }

        let summary = RatingSummary::from_ratings(self.reviews.ratings_for_course(course_id).await?);
        Ok((course, summary))
    }

    pub async fn list_courses(&self) -> ServiceResult<Vec<(CourseRecord, RatingSummary)>> {
        let courses = self.courses.list_published().await?;
        self.summaries(courses).await
    }

    /// Every course of the caller, drafts included.
    pub async fn list_own_courses(
        &self,
        actor: &AuthenticatedUser,
    ) -> ServiceResult<Vec<(CourseRecord, RatingSummary)>> {
        ensure_author(actor)?;
        let courses = self.courses.list_by_educator(actor.id).await?;
        self.summaries(courses).await
    }

    /// Courses the caller has paid for.
    pub async fn list_enrolled_courses(
        &self,
        actor: &AuthenticatedUser,
    ) -> ServiceResult<Vec<(CourseRecord, RatingSummary)>> {
        let ids: Vec<CourseId> = self
            .orders
            .enrolled_course_ids(actor.id)
            .await?
            .into_iter()
            .collect();
        let courses = self.courses.find_many(&ids).await?;
        self.summaries(courses).await
    }

    #[tracing::instrument(skip(self, request), fields(educator_id = %actor.id))]
    pub async fn create_bundle(
        &self,
        actor: &AuthenticatedUser,
        request: CreateBundleRequest,
    ) -> ServiceResult<BundleRecord> {
        ensure_author(actor)?;

        let requested: BTreeSet<CourseId> = request
            .course_ids
            .iter()
            .map(|raw| parse_id::<CourseId>("course id", raw))
            .collect::<ServiceResult<_>>()?;
        if requested.is_empty() {
            return Err(ServiceError::Validation(
                "a bundle needs at least one course".to_string(),
            ));
        }

        let course_ids: Vec<CourseId> = requested.into_iter().collect();
        let courses = self.courses.find_many(&course_ids).await?;
        if courses.len() != course_ids.len() {
            return Err(ServiceError::Validation(
                "bundle references unknown courses".to_string(),
            ));
        }
        for course in &courses {
            ensure_owner(actor, course.educator_id, "course")?;
        }

        let bundle = self
            .courses
            .create_bundle(NewBundle {
                educator_id: actor.id,
                title: required_text("title", request.title, TITLE_MAX)?,
                description: optional_text(request.description, DESCRIPTION_MAX, "description")?,
                price: Price::new(request.price_cents)?,
                course_ids,
            })
            .await?;

        info!(bundle_id = %bundle.id, courses = bundle.course_ids.len(), "bundle created");
        Ok(bundle)
    }

    pub async fn get_bundle(&self, bundle_id: BundleId) -> ServiceResult<BundleRecord> {
        self.courses
            .find_bundle(bundle_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("bundle"))
    }

    pub async fn list_bundles(&self) -> ServiceResult<Vec<BundleRecord>> {
        Ok(self.courses.list_bundles().await?)
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_bundle(
        &self,
        actor: &AuthenticatedUser,
        bundle_id: BundleId,
    ) -> ServiceResult<()> {
        let bundle = self.get_bundle(bundle_id).await?;
        ensure_owner(actor, bundle.educator_id, "bundle")?;
        self.courses.delete_bundle(bundle_id).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(student_id = %actor.id))]
    pub async fn create_review(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
        request: CreateReviewRequest,
    ) -> ServiceResult<ReviewRecord> {
        self.course(course_id).await?;
        if !self.orders.is_enrolled(actor.id, course_id).await? {
            return Err(ServiceError::Forbidden(
                "only students who purchased the course may review it".to_string(),
            ));
        }
        if self
            .reviews
            .find_by_course_and_student(course_id, actor.id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(
                "course already reviewed".to_string(),
            ));
        }

        let review = self
            .reviews
            .create(NewReview {
                course_id,
                student_id: actor.id,
                rating: Rating::new(request.rating)?,
                comment: optional_text(request.comment, COMMENT_MAX, "comment")?,
            })
            .await?;

        info!(review_id = %review.id, rating = review.rating.value(), "review posted");
        Ok(review)
    }

    async fn own_review(
        &self,
        actor: &AuthenticatedUser,
        review_id: ReviewId,
        allow_admin: bool,
    ) -> ServiceResult<ReviewRecord> {
        let review = self
            .reviews
            .find_by_id(review_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("review"))?;

        let is_admin = allow_admin && actor.role == Role::Admin;
        if review.student_id != actor.id && !is_admin {
            return Err(ServiceError::Forbidden(
                "only the author may change this review".to_string(),
            ));
        }
        Ok(review)
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn update_review(
        &self,
        actor: &AuthenticatedUser,
        review_id: ReviewId,
        request: CreateReviewRequest,
    ) -> ServiceResult<ReviewRecord> {
        self.own_review(actor, review_id, false).await?;

        self.reviews
            .update(
                review_id,
                Rating::new(request.rating)?,
                optional_text(request.comment, COMMENT_MAX, "comment")?,
            )
            .await?
            .ok_or_else(|| ServiceError::not_found("review"))
    }

    #[tracing::instrument(skip(self), fields(actor_id = %actor.id))]
    pub async fn delete_review(
        &self,
        actor: &AuthenticatedUser,
        review_id: ReviewId,
    ) -> ServiceResult<()> {
        self.own_review(actor, review_id, true).await?;
        self.reviews.delete(review_id).await?;
        Ok(())
    }

    pub async fn list_reviews(
        &self,
        course_id: CourseId,
    ) -> ServiceResult<(RatingSummary, Vec<ReviewRecord>)> {
        self.course(course_id).await?;
        let reviews = self.reviews.list_by_course(course_id).await?;
        let summary = RatingSummary::from_ratings(reviews.iter().map(|r| r.rating));
        Ok((summary, reviews))
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn create_announcement(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
        request: CreateAnnouncementRequest,
    ) -> ServiceResult<AnnouncementRecord> {
        self.owned_course(actor, course_id).await?;

        let announcement = self
            .content
            .create_announcement(
                course_id,
                required_text("title", request.title, TITLE_MAX)?,
                required_text("body", request.body, DESCRIPTION_MAX)?,
            )
            .await?;
        Ok(announcement)
    }

    pub async fn list_announcements(
        &self,
        course_id: CourseId,
    ) -> ServiceResult<Vec<AnnouncementRecord>> {
        self.course(course_id).await?;
        Ok(self.content.list_announcements(course_id).await?)
    }

    pub async fn delete_announcement(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
        announcement_id: AnnouncementId,
    ) -> ServiceResult<()> {
        self.owned_course(actor, course_id).await?;
        if !self
            .content
            .delete_announcement(course_id, announcement_id)
            .await?
        {
            return Err(ServiceError::not_found("announcement"));
        }
        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(actor_id = %actor.id))]
    pub async fn create_faq(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
        request: CreateFaqRequest,
    ) -> ServiceResult<FaqRecord> {
        self.owned_course(actor, course_id).await?;

        let faq = self
            .content
            .create_faq(
                course_id,
                required_text("question", request.question, TITLE_MAX * 5)?,
                required_text("answer", request.answer, DESCRIPTION_MAX)?,
            )
            .await?;
        Ok(faq)
    }

    pub async fn list_faqs(&self, course_id: CourseId) -> ServiceResult<Vec<FaqRecord>> {
        self.course(course_id).await?;
        Ok(self.content.list_faqs(course_id).await?)
    }

    pub async fn delete_faq(
        &self,
        actor: &AuthenticatedUser,
        course_id: CourseId,
        faq_id: FaqId,
    ) -> ServiceResult<()> {
        self.owned_course(actor, course_id).await?;
        if !self.content.delete_faq(course_id, faq_id).await? {
            return Err(ServiceError::not_found("faq"));
        }
        Ok(())
    }
}
