use rocket::Route;
use rocket::serde::json::Json;

use crate::api::error::{ApiResult, storage_error};
use crate::models::Role;
use crate::orm::DbConn;
use crate::orm::role::list_roles;
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

/// List Roles endpoint.
///
/// - **URL:** `/api/roles`
/// - **Method:** `GET`
/// - **Authentication:** Required
#[get("/roles")]
pub async fn list_roles_endpoint(
    _rate: RateLimited,
    db: DbConn,
    _auth_user: AuthenticatedUser,
) -> ApiResult<Json<Vec<Role>>> {
    db.run(|conn| {
        list_roles(conn)
            .map(Json)
            .map_err(|e| storage_error("Listing roles", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![list_roles_endpoint]
}
