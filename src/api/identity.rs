use std::collections::HashSet;

use actix_web::dev::Payload;
use actix_web::{FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use uuid::Uuid;

use super::errors::ApiError;

pub const USER_HEADER: &str = "X-User-Id";

/// Caller identity, supplied by the gateway in front of this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

impl CurrentUser {
    pub fn id(&self) -> Uuid {
        self.0
    }
}

impl FromRequest for CurrentUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let user = req
            .headers()
            .get(USER_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(CurrentUser)
            .ok_or(ApiError::Unauthenticated);
        ready(user)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Admin,
}

/// Static user-to-role mapping; everyone not listed is a customer.
#[derive(Debug, Clone, Default)]
pub struct RoleDirectory {
    admins: HashSet<Uuid>,
}

impl RoleDirectory {
    pub fn new(admins: impl IntoIterator<Item = Uuid>) -> Self {
        Self {
            admins: admins.into_iter().collect(),
        }
    }

    pub fn role_of(&self, user_id: Uuid) -> Role {
        if self.admins.contains(&user_id) {
            Role::Admin
        } else {
            Role::Customer
        }
    }

    pub fn has_role(&self, user_id: Uuid, role: Role) -> bool {
        self.role_of(user_id) == role
    }

    pub fn is_admin(&self, user_id: Uuid) -> bool {
        self.has_role(user_id, Role::Admin)
    }

    pub fn require_admin(&self, user: CurrentUser) -> Result<(), ApiError> {
        if self.is_admin(user.id()) {
            Ok(())
        } else {
            Err(ApiError::forbidden("admin role required"))
        }
    }

    /// Owners act on their own records; admins act on anyone's.
    pub fn require_owner_or_admin(&self, user: CurrentUser, owner: Uuid) -> Result<(), ApiError> {
        if user.id() == owner || self.is_admin(user.id()) {
            Ok(())
        } else {
            Err(ApiError::forbidden("not the owner of this record"))
        }
    }
}
