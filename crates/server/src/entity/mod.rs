pub mod announcement;
pub mod badge;
pub mod bundle;
pub mod bundle_course;
pub mod cart_item;
pub mod course;
pub mod enrollment;
pub mod exam_session;
pub mod faq;
pub mod order;
pub mod order_item;
pub mod question;
pub mod review;
pub mod streak;
pub mod user;
pub mod user_badge;
