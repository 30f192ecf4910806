use std::fmt;
use std::str::FromStr;

use super::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Role {
    #[default]
    Student,
    Educator,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Educator => "educator",
            Role::Admin => "admin",
        }
    }

    /// Educators and admins may author courses and tests.
    pub fn can_author(self) -> bool {
        matches!(self, Role::Educator | Role::Admin)
    }

    /// Roles a user may pick for themselves when registering.
    pub fn is_self_assignable(self) -> bool {
        !matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "educator" => Ok(Role::Educator),
            "admin" => Ok(Role::Admin),
            other => Err(DomainError::UnknownRole(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn role_parses_from_lowercase_name() {
        assert_eq!("educator".parse::<Role>(), Ok(Role::Educator));
        assert!("instructor".parse::<Role>().is_err());
    }

    #[test]
    fn admin_is_not_self_assignable() {
        assert!(Role::Student.is_self_assignable());
        assert!(Role::Educator.is_self_assignable());
        assert!(!Role::Admin.is_self_assignable());
    }
}
