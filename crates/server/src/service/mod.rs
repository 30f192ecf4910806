pub mod auth_service;
pub mod catalog_service;
pub mod commerce_service;
pub mod error;
pub mod exam_service;
pub mod streak_service;
pub mod test_service;

use crate::service::auth_service::AuthenticatedUser;
use crate::service::error::{ServiceError, ServiceResult};
use coursehub_core::domain::{Role, UserId};
use std::str::FromStr;

/// Parses an id supplied in a request body.
pub fn parse_id<T: FromStr>(field: &str, raw: &str) -> ServiceResult<T> {
    T::from_str(raw.trim())
        .map_err(|_| ServiceError::Validation(format!("invalid {field}: '{raw}'")))
}

/// Owners and admins may change a resource.
pub(crate) fn ensure_owner(
    actor: &AuthenticatedUser,
    owner_id: UserId,
    what: &str,
) -> ServiceResult<()> {
    if actor.role == Role::Admin || actor.id == owner_id {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(format!(
            "only the owner of this {what} may change it"
        )))
    }
}

pub(crate) fn ensure_author(actor: &AuthenticatedUser) -> ServiceResult<()> {
    if actor.role.can_author() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(
            "only educators and admins may do this".to_string(),
        ))
    }
}

pub(crate) fn ensure_admin(actor: &AuthenticatedUser) -> ServiceResult<()> {
    if actor.role == Role::Admin {
        Ok(())
    } else {
        Err(ServiceError::Forbidden("admin role required".to_string()))
    }
}
