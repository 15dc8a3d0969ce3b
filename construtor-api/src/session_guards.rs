//! Session-based authentication and org-scoped authorization.
//!
//! Every request guard here starts from the `session` cookie set by
//! `/api/login`. Access to tenant data follows the role of the caller:
//!
//! | role             | read            | write resources | manage users/org |
//! |------------------|-----------------|-----------------|------------------|
//! | `platform-admin` | every org       | every org       | every org        |
//! | `admin`          | own org         | own org         | own org          |
//! | `editor`         | own org         | own org         | no               |
//! | `viewer`         | own org         | no              | no               |
//!
//! ```rust,ignore
//! #[get("/obras/<id>")]
//! async fn get_obra(db: DbConn, id: i32, auth_user: AuthenticatedUser) -> ... {
//!     // rows of other orgs are reported as missing
//!     if !auth_user.can_read_org(obra.org_id) { return Err(Status::NotFound) }
//! }
//! ```

use chrono::Utc;
use diesel::prelude::*;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::models::{ADMIN, EDITOR, PLATFORM_ADMIN, Role, Session, User};
use crate::orm::DbConn;
use crate::orm::org::get_org_by_id;
use crate::orm::user_role::get_user_roles;
use crate::schema::{sessions, users};

/// A request guard for routes that require a logged-in user.
///
/// Fails with 401 when the cookie is missing, the session is revoked or
/// expired, the user's org was deleted, or the user has no roles.
#[derive(Debug)]
pub struct AuthenticatedUser {
    pub user: User,
    pub roles: Vec<Role>,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AuthenticatedUser {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => return Outcome::Error((Status::InternalServerError, ())),
        };

        let session_id = match request.cookies().get("session") {
            Some(cookie) => cookie.value().to_string(),
            None => return Outcome::Error((Status::Unauthorized, ())),
        };

        let lookup = db
            .run(move |conn| -> Result<Option<(User, Vec<Role>)>, diesel::result::Error> {
                let now = Utc::now().naive_utc();
                let session = sessions::table
                    .filter(sessions::id.eq(&session_id))
                    .filter(sessions::revoked.eq(false))
                    .filter(sessions::expires_at.is_null().or(sessions::expires_at.gt(now)))
                    .select(Session::as_select())
                    .first(conn)
                    .optional()?;

                let session = match session {
                    Some(s) => s,
                    None => return Ok(None),
                };

                let user = users::table
                    .filter(users::id.eq(session.user_id))
                    .select(User::as_select())
                    .first(conn)
                    .optional()?;

                let user = match user {
                    Some(user) => user,
                    None => return Ok(None),
                };

                // sessions of a soft-deleted org stop working with it
                if get_org_by_id(conn, user.org_id)?.is_none() {
                    return Ok(None);
                }

                let roles = get_user_roles(conn, user.id)?;
                Ok(Some((user, roles)))
            })
            .await;

        match lookup {
            Ok(Some((_, roles))) if roles.is_empty() => Outcome::Error((Status::Unauthorized, ())),
            Ok(Some((user, roles))) => Outcome::Success(AuthenticatedUser { user, roles }),
            Ok(None) => Outcome::Error((Status::Unauthorized, ())),
            Err(e) => {
                error!("Database error resolving session: {:?}", e);
                Outcome::Error((Status::Unauthorized, ()))
            }
        }
    }
}

impl AuthenticatedUser {
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r.name == role_name)
    }

    pub fn has_any_role(&self, role_names: &[&str]) -> bool {
        role_names.iter().any(|name| self.has_role(name))
    }

    pub fn role_names(&self) -> Vec<String> {
        self.roles.iter().map(|r| r.name.clone()).collect()
    }

    pub fn org_id(&self) -> i32 {
        self.user.org_id
    }

    pub fn is_platform_admin(&self) -> bool {
        self.has_role(PLATFORM_ADMIN)
    }

    /// Rows of orgs the caller cannot read must be reported as missing.
    pub fn can_read_org(&self, org_id: i32) -> bool {
        self.is_platform_admin() || self.user.org_id == org_id
    }

    /// Create, update and delete of resources (obras, RDOs, ...).
    pub fn can_write_org(&self, org_id: i32) -> bool {
        self.is_platform_admin()
            || (self.user.org_id == org_id && self.has_any_role(&[ADMIN, EDITOR]))
    }

    /// User management, org settings and review decisions.
    pub fn can_manage_org(&self, org_id: i32) -> bool {
        self.is_platform_admin() || (self.user.org_id == org_id && self.has_role(ADMIN))
    }

    /// The org filter for list queries: `None` means every org.
    pub fn org_scope(&self) -> Option<i32> {
        if self.is_platform_admin() {
            None
        } else {
            Some(self.user.org_id)
        }
    }
}

/// Creates a guard that admits users holding any of the listed roles and
/// answers 403 otherwise.
macro_rules! create_role_guard {
    ($(#[$meta:meta])* $name:ident, [$($role:expr),+ $(,)?]) => {
        $(#[$meta])*
        #[derive(Debug)]
        pub struct $name(pub AuthenticatedUser);

        impl std::ops::Deref for $name {
            type Target = AuthenticatedUser;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        #[rocket::async_trait]
        impl<'r> FromRequest<'r> for $name {
            type Error = ();

            async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
                let auth_user = match AuthenticatedUser::from_request(request).await {
                    Outcome::Success(user) => user,
                    Outcome::Error(e) => return Outcome::Error(e),
                    Outcome::Forward(f) => return Outcome::Forward(f),
                };

                if auth_user.has_any_role(&[$($role),+]) {
                    Outcome::Success($name(auth_user))
                } else {
                    Outcome::Error((Status::Forbidden, ()))
                }
            }
        }
    };
}

create_role_guard!(
    /// Operators of the whole platform.
    PlatformAdminUser,
    [PLATFORM_ADMIN]
);

create_role_guard!(
    /// Org admins and platform admins.
    AdminUser,
    [PLATFORM_ADMIN, ADMIN]
);
