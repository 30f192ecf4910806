pub mod cart_repository;
pub mod content_repository;
pub mod course_repository;
pub mod exam_session_repository;
pub mod order_repository;
pub mod review_repository;
pub mod streak_repository;
pub mod test_repository;
pub mod user_repository;
