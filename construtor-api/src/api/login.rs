//! Login and current-user endpoints.

use rocket::http::{CookieJar, Status};
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, api_error, storage_error};
use crate::config::AppConfig;
use crate::models::{Role, User};
use crate::orm::DbConn;
use crate::orm::login::process_login;
use crate::orm::org::get_org_including_deleted;
use crate::orm::user_role::get_user_roles;
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

/// Login request structure containing user credentials.
#[derive(Clone, Deserialize, TS)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(alias = "e-mail")]
    pub email: String,
    #[serde(alias = "senha")]
    pub password: String,
}

/// Who is logged in. Returned by both `/login` and `/me`.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LoginSuccessResponse {
    pub user_id: i32,
    pub email: String,
    pub name: Option<String>,
    pub org_id: i32,
    pub org_name: String,
    pub roles: Vec<String>,
}

fn build_user_response(
    conn: &mut diesel::SqliteConnection,
    user: User,
    roles: Option<Vec<Role>>,
) -> Result<LoginSuccessResponse, diesel::result::Error> {
    let roles = match roles {
        Some(roles) => roles,
        None => get_user_roles(conn, user.id)?,
    };
    let org_name = get_org_including_deleted(conn, user.org_id)?
        .map(|org| org.name)
        .unwrap_or_default();

    Ok(LoginSuccessResponse {
        user_id: user.id,
        email: user.email,
        name: user.name,
        org_id: user.org_id,
        org_name,
        roles: roles.into_iter().map(|role| role.name).collect(),
    })
}

/// Login endpoint.
///
/// - **URL:** `/api/login`
/// - **Method:** `POST`
/// - **Authentication:** None required
///
/// Verifies the credentials and sets the HTTP-only `session` cookie.
///
/// ```json
/// { "email": "admin@alfa.com", "password": "..." }
/// ```
///
/// Wrong email and wrong password both answer 401 with
/// `{ "error": "Invalid credentials" }`.
#[post("/login", data = "<login>")]
pub async fn login(
    _rate: RateLimited,
    db: DbConn,
    config: &State<AppConfig>,
    cookies: &CookieJar<'_>,
    login: Json<LoginRequest>,
) -> ApiResult<Json<LoginSuccessResponse>> {
    let user = match process_login(&db, cookies, &login, config.session_ttl_hours).await {
        Ok(user) => user,
        Err(status) if status == Status::BadRequest => {
            return Err(api_error(Status::BadRequest, "Email and password are required"));
        }
        Err(status) if status == Status::Unauthorized => {
            info!("Failed login attempt for '{}'", login.email.trim());
            return Err(api_error(Status::Unauthorized, "Invalid credentials"));
        }
        Err(status) => return Err(api_error(status, "Login failed")),
    };

    info!("User {} logged in", user.id);
    db.run(move |conn| build_user_response(conn, user, None))
        .await
        .map(Json)
        .map_err(|e| storage_error("Loading user profile", e))
}

/// Current user endpoint.
///
/// - **URL:** `/api/me`
/// - **Method:** `GET`
/// - **Authentication:** Required
#[get("/me")]
pub async fn me(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<LoginSuccessResponse>> {
    let AuthenticatedUser { user, roles } = auth_user;
    db.run(move |conn| build_user_response(conn, user, Some(roles)))
        .await
        .map(Json)
        .map_err(|e| storage_error("Loading user profile", e))
}

pub fn routes() -> Vec<Route> {
    routes![login, me]
}
