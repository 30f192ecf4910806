use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn from_uuid(value: Uuid) -> Self {
                Self(value)
            }

            pub fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s).map(Self)
            }
        }

        impl From<Uuid> for $name {
            fn from(value: Uuid) -> Self {
                Self::from_uuid(value)
            }
        }

        impl From<$name> for Uuid {
            fn from(value: $name) -> Self {
                value.into_inner()
            }
        }
    };
}

define_id_type!(UserId);
define_id_type!(CourseId);
define_id_type!(BundleId);
define_id_type!(CartItemId);
define_id_type!(OrderId);
define_id_type!(ReviewId);
define_id_type!(AnnouncementId);
define_id_type!(FaqId);
define_id_type!(TestId);
define_id_type!(QuestionId);
define_id_type!(ExamSessionId);
define_id_type!(BadgeId);

#[cfg(test)]
mod tests {
    use super::{QuestionId, UserId};

    #[test]
    fn user_id_can_roundtrip_from_string() {
        let id = UserId::new();
        let parsed: UserId = id
            .to_string()
            .parse()
            .expect("generated user id should be valid");

        assert_eq!(id, parsed);
    }

    #[test]
    fn malformed_question_id_is_rejected() {
        assert!("q-1".parse::<QuestionId>().is_err());
    }
}
