//! API endpoints for user management.
//!
//! # Authorization Rules
//! - Any user can read and update their own profile
//! - Org admins manage users of their own org
//! - Platform admins manage users of every org
//! - Only platform admins grant or revoke `platform-admin`
//!
//! Bodies of these endpoints may carry passwords, so they are parsed with
//! plain `Json` and never logged.

use diesel::Connection;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{
    ApiError, ApiResult, api_error, bad_request, conflict, forbidden, not_found, storage_error,
};
use crate::api::{ensure_manageable, invalid, resolve_target_org};
use crate::config::AppConfig;
use crate::models::{NewUser, PLATFORM_ADMIN, Role, Timestamped, UserWithRoles, VIEWER};
use crate::normalize::{changed_text, normalize_email, optional_text};
use crate::orm::login::hash_password;
use crate::orm::logout::revoke_user_sessions;
use crate::orm::org::get_org_by_id;
use crate::orm::role::get_role_by_name;
use crate::orm::user::{
    delete_user_with_cleanup, get_user, get_user_with_roles, get_user_with_timestamps,
    insert_user, list_users_with_roles, update_user,
};
use crate::orm::user_role::{
    RoleRemoval, assign_user_role_by_name, get_user_roles, remove_user_role_by_name,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::{AdminUser, AuthenticatedUser};

#[derive(Deserialize, TS)]
#[ts(export)]
pub struct CreateUserRequest {
    #[serde(alias = "e-mail")]
    pub email: String,
    #[serde(alias = "senha")]
    pub password: String,
    #[serde(alias = "nome")]
    pub name: Option<String>,
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    /// Defaults to `["viewer"]`.
    #[serde(alias = "papeis")]
    pub roles: Option<Vec<String>>,
}

/// All fields optional; absent fields keep their value.
#[derive(Deserialize, TS)]
#[ts(export)]
pub struct UpdateUserRequest {
    #[serde(alias = "e-mail")]
    pub email: Option<String>,
    #[serde(alias = "senha")]
    pub password: Option<String>,
    #[serde(alias = "nome")]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct RoleAssignmentRequest {
    #[serde(alias = "role_name", alias = "papel")]
    pub role: String,
}

/// 400 with the strength hints when `password` scores below the minimum.
fn check_password_strength(password: &str, min_score: u8) -> ApiResult<()> {
    let report = valida::evaluate_password(password);
    if report.is_acceptable(min_score) {
        Ok(())
    } else {
        Err(bad_request(format!(
            "Password too weak: {}",
            report.feedback().join("; ")
        )))
    }
}

fn hash_or_500(password: &str) -> ApiResult<String> {
    hash_password(password).map_err(|e| {
        error!("Hashing password failed: {}", e);
        api_error(Status::InternalServerError, "Internal server error while hashing password")
    })
}

fn ensure_may_grant(auth_user: &AuthenticatedUser, role_name: &str) -> ApiResult<()> {
    if role_name == PLATFORM_ADMIN && !auth_user.is_platform_admin() {
        Err(forbidden("Forbidden: only platform admins manage the platform-admin role"))
    } else {
        Ok(())
    }
}

/// Loads the target user and checks the caller may manage it. Users of
/// other orgs are reported as missing.
fn load_managed_user(
    conn: &mut diesel::SqliteConnection,
    auth_user: &AuthenticatedUser,
    user_id: i32,
) -> ApiResult<crate::models::User> {
    let user = get_user(conn, user_id)
        .map_err(|e| storage_error("Loading user", e))?
        .ok_or_else(|| not_found("User"))?;
    ensure_manageable(auth_user, user.org_id, "User")?;
    Ok(user)
}

/// Create User endpoint.
///
/// - **URL:** `/api/users`
/// - **Method:** `POST`
/// - **Authorization:** org admin (own org) or platform admin
///
/// ```json
/// {
///   "email": "mestre@alfa.com",
///   "password": "Canteiro#2024",
///   "name": "Mestre de Obras",
///   "roles": ["editor"]
/// }
/// ```
///
/// Returns 201 with the user and its roles. A duplicate email answers 409,
/// a weak password or unknown role 400.
#[post("/users", data = "<new_user>")]
pub async fn create_user(
    _rate: RateLimited,
    db: DbConn,
    config: &State<AppConfig>,
    new_user: Json<CreateUserRequest>,
    auth_user: AdminUser,
) -> ApiResult<status::Created<Json<UserWithRoles>>> {
    let CreateUserRequest {
        email,
        password,
        name,
        org_id,
        roles,
    } = new_user.into_inner();

    let email = invalid(normalize_email(&email))?;
    check_password_strength(&password, config.password_min_score)?;
    let roles = roles.unwrap_or_else(|| vec![VIEWER.to_string()]);
    if roles.is_empty() {
        return Err(bad_request("A user needs at least one role"));
    }
    let target_org = resolve_target_org(&auth_user, org_id)?;
    ensure_manageable(&auth_user, target_org, "Org")?;
    for role in &roles {
        ensure_may_grant(&auth_user, role)?;
    }
    let name = optional_text(name);
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        if get_org_by_id(conn, target_org)
            .map_err(|e| storage_error("Loading org", e))?
            .is_none()
        {
            return Err(not_found("Org"));
        }
        for role in &roles {
            if get_role_by_name(conn, role)
                .map_err(|e| storage_error("Loading role", e))?
                .is_none()
            {
                return Err(bad_request(format!("Unknown role '{}'", role)));
            }
        }
        let password_hash = hash_or_500(&password)?;

        let created = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let user = insert_user(
                    conn,
                    NewUser {
                        email,
                        password_hash,
                        org_id: target_org,
                        name,
                    },
                    Some(acting),
                )?;
                for role in &roles {
                    assign_user_role_by_name(conn, user.id, role)?;
                }
                let roles = get_user_roles(conn, user.id)?;
                Ok(UserWithRoles::new(user, roles))
            })
            .map_err(|e| storage_error("Creating user", e))?;

        info!("User {} created in org {} by user {}", created.id, target_org, acting);
        Ok(status::Created::new(format!("/api/users/{}", created.id)).body(Json(created)))
    })
    .await
}

/// List Users endpoint.
///
/// Org admins see their own org; platform admins see everyone.
#[get("/users?<limit>&<offset>")]
pub async fn list_users(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AdminUser,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<UserWithRoles>>> {
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_users_with_roles(conn, scope, page)
            .map(Json)
            .map_err(|e| storage_error("Listing users", e))
    })
    .await
}

/// Get User endpoint. Users can always read themselves.
#[get("/users/<user_id>")]
pub async fn get_user_endpoint(
    _rate: RateLimited,
    db: DbConn,
    user_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<UserWithRoles>>> {
    db.run(move |conn| -> ApiResult<_> {
        if user_id != auth_user.user.id {
            load_managed_user(conn, &auth_user, user_id)?;
        }
        get_user_with_timestamps(conn, user_id)
            .map_err(|e| storage_error("Loading user", e))?
            .map(Json)
            .ok_or_else(|| not_found("User"))
    })
    .await
}

/// Update User endpoint.
///
/// - **URL:** `/api/users/<user_id>`
/// - **Method:** `PUT`
/// - **Authorization:** the user themself, their org admin or a platform
///   admin
///
/// When someone other than the user changes the password, the user's
/// sessions are revoked.
#[put("/users/<user_id>", data = "<changes>")]
pub async fn update_user_endpoint(
    _rate: RateLimited,
    db: DbConn,
    config: &State<AppConfig>,
    user_id: i32,
    changes: Json<UpdateUserRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<UserWithRoles>> {
    let UpdateUserRequest {
        email,
        password,
        name,
    } = changes.into_inner();

    let email = email.map(|e| normalize_email(&e)).transpose().map_err(bad_request)?;
    if let Some(password) = &password {
        check_password_strength(password, config.password_min_score)?;
    }
    let name = invalid(changed_text("name", name))?;
    let acting = auth_user.user.id;
    let is_self = user_id == acting;

    db.run(move |conn| -> ApiResult<_> {
        if !is_self {
            load_managed_user(conn, &auth_user, user_id)?;
        }
        let password_hash = password.as_deref().map(hash_or_500).transpose()?;
        let password_changed = password_hash.is_some();

        update_user(conn, user_id, email, password_hash, name, Some(acting))
            .map_err(|e| storage_error("Updating user", e))?;

        if password_changed && !is_self {
            let revoked = revoke_user_sessions(conn, user_id)
                .map_err(|e| storage_error("Revoking sessions", e))?;
            info!("Password of user {} reset by user {}; {} sessions revoked", user_id, acting, revoked);
        }

        get_user_with_roles(conn, user_id)
            .map_err(|e| storage_error("Loading user", e))?
            .map(Json)
            .ok_or_else(|| not_found("User"))
    })
    .await
}

/// Delete User endpoint.
///
/// Archives the user into `deleted_users`, then removes it with its
/// sessions and role grants. Deleting yourself answers 409.
#[delete("/users/<user_id>")]
pub async fn delete_user(
    _rate: RateLimited,
    db: DbConn,
    user_id: i32,
    auth_user: AdminUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    if user_id == acting {
        return Err(conflict("Cannot delete your own account"));
    }

    db.run(move |conn| -> ApiResult<_> {
        load_managed_user(conn, &auth_user, user_id)?;
        match delete_user_with_cleanup(conn, user_id, Some(acting)) {
            Ok(0) => Err(not_found("User")),
            Ok(_) => {
                info!("User {} deleted by user {}", user_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting user", e)),
        }
    })
    .await
}

#[get("/users/<user_id>/roles")]
pub async fn get_user_roles_endpoint(
    _rate: RateLimited,
    db: DbConn,
    user_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Vec<Role>>> {
    db.run(move |conn| -> ApiResult<_> {
        if user_id != auth_user.user.id {
            load_managed_user(conn, &auth_user, user_id)?;
        }
        get_user_roles(conn, user_id)
            .map(Json)
            .map_err(|e| storage_error("Loading user roles", e))
    })
    .await
}

/// Grants a role. Granting a role the user already holds succeeds without
/// change.
#[post("/users/<user_id>/roles", data = "<request>")]
pub async fn add_user_role(
    _rate: RateLimited,
    db: DbConn,
    user_id: i32,
    request: Json<RoleAssignmentRequest>,
    auth_user: AdminUser,
) -> ApiResult<Json<Vec<Role>>> {
    let role_name = request.into_inner().role.trim().to_string();
    ensure_may_grant(&auth_user, &role_name)?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        load_managed_user(conn, &auth_user, user_id)?;
        assign_user_role_by_name(conn, user_id, &role_name).map_err(|e| match e {
            diesel::result::Error::NotFound => bad_request(format!("Unknown role '{}'", role_name)),
            other => storage_error("Granting role", other),
        })?;
        info!("Role '{}' granted to user {} by user {}", role_name, user_id, acting);
        get_user_roles(conn, user_id)
            .map(Json)
            .map_err(|e| storage_error("Loading user roles", e))
    })
    .await
}

/// Revokes a role. A user keeps at least one role, so removing the last
/// one answers 409.
#[delete("/users/<user_id>/roles/<role_name>")]
pub async fn remove_user_role(
    _rate: RateLimited,
    db: DbConn,
    user_id: i32,
    role_name: &str,
    auth_user: AdminUser,
) -> ApiResult<Json<Vec<Role>>> {
    ensure_may_grant(&auth_user, role_name)?;
    let role_name = role_name.to_string();
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        load_managed_user(conn, &auth_user, user_id)?;
        let outcome = remove_user_role_by_name(conn, user_id, &role_name)
            .map_err(|e| storage_error("Revoking role", e))?;
        match outcome {
            RoleRemoval::Removed => {
                info!("Role '{}' revoked from user {} by user {}", role_name, user_id, acting);
            }
            RoleRemoval::NotAssigned => return Err(role_not_assigned(&role_name)),
            RoleRemoval::LastRole => return Err(conflict("Cannot remove the last role of a user")),
        }
        get_user_roles(conn, user_id)
            .map(Json)
            .map_err(|e| storage_error("Loading user roles", e))
    })
    .await
}

fn role_not_assigned(role_name: &str) -> ApiError {
    api_error(
        Status::NotFound,
        format!("User does not have role '{}'", role_name),
    )
}

pub fn routes() -> Vec<Route> {
    routes![
        create_user,
        list_users,
        get_user_endpoint,
        update_user_endpoint,
        delete_user,
        get_user_roles_endpoint,
        add_user_role,
        remove_user_role
    ]
}
