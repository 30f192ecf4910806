//! 统一的应用状态。

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::clock::Clock;
use crate::config::ServerConfig;
use crate::repository::cart_repository::SeaOrmCartRepository;
use crate::repository::content_repository::SeaOrmContentRepository;
use crate::repository::course_repository::SeaOrmCourseRepository;
use crate::repository::exam_session_repository::SeaOrmExamSessionRepository;
use crate::repository::order_repository::SeaOrmOrderRepository;
use crate::repository::review_repository::SeaOrmReviewRepository;
use crate::repository::streak_repository::SeaOrmStreakRepository;
use crate::repository::test_repository::SeaOrmTestRepository;
use crate::repository::user_repository::SeaOrmUserRepository;
use crate::service::auth_service::{AuthService, TokenIssuer};
use crate::service::catalog_service::CatalogService;
use crate::service::commerce_service::CommerceService;
use crate::service::exam_service::ExamService;
use crate::service::streak_service::StreakService;
use crate::service::test_service::TestService;

/// 统一的应用状态，包含所有路由共享的服务。
pub struct AppState {
    /// 服务配置。
    pub config: ServerConfig,
    /// 注册、登录与令牌校验。
    pub auth: AuthService,
    /// 课程、课程包、评价、公告与 FAQ。
    pub catalog: CatalogService,
    /// 购物车与订单。
    pub commerce: CommerceService,
    /// 测试编写。
    pub tests: TestService,
    /// 考试会话与排行榜。
    pub exams: ExamService,
    /// 连续学习天数与徽章。
    pub streaks: Arc<StreakService>,
}

impl AppState {
    /// 基于数据库连接创建所有仓储与服务。
    pub fn new(db: DatabaseConnection, config: ServerConfig, clock: Arc<dyn Clock>) -> Self {
        let users = Arc::new(SeaOrmUserRepository::new(db.clone()));
        let courses = Arc::new(SeaOrmCourseRepository::new(db.clone()));
        let reviews = Arc::new(SeaOrmReviewRepository::new(db.clone()));
        let content = Arc::new(SeaOrmContentRepository::new(db.clone()));
        let carts = Arc::new(SeaOrmCartRepository::new(db.clone()));
        let orders = Arc::new(SeaOrmOrderRepository::new(db.clone()));
        let tests = Arc::new(SeaOrmTestRepository::new(db.clone()));
        let sessions = Arc::new(SeaOrmExamSessionRepository::new(db.clone()));
        let streak_store = Arc::new(SeaOrmStreakRepository::new(db));

        let tokens = TokenIssuer::new(
            config.jwt_secret.as_bytes(),
            config.access_token_ttl_minutes,
            config.refresh_token_ttl_days,
        );
        let streaks = Arc::new(StreakService::new(streak_store, clock.clone()));

        Self {
            auth: AuthService::new(users, tokens),
            catalog: CatalogService::new(courses.clone(), reviews, content, orders.clone()),
            commerce: CommerceService::new(carts, orders, courses, clock.clone()),
            tests: TestService::new(tests.clone()),
            exams: ExamService::new(tests, sessions, streaks.clone(), clock),
            streaks,
            config,
        }
    }
}
