//! Audit history of a single record.

use rocket::Route;
use rocket::serde::json::Json;

use crate::api::error::{ApiResult, bad_request, not_found, storage_error};
use crate::models::EntityActivity;
use crate::orm::DbConn;
use crate::orm::entity_activity::{TRACKED_TABLES, get_activity_history};
use crate::rate_limit::RateLimited;
use crate::session_guards::AdminUser;

/// Entity Activity endpoint.
///
/// - **URL:** `/api/activity/<table>/<entity_id>`
/// - **Method:** `GET`
/// - **Authorization:** org admin (own org entries only) or platform admin
///
/// Returns the entries oldest first:
///
/// ```json
/// [
///   { "id": 41, "table_name": "rdos", "entity_id": 7, "org_id": 2,
///     "operation_type": "create", "timestamp": "2025-03-14T11:02:09", "user_id": 5 }
/// ]
/// ```
///
/// An unknown table answers 400; a record with no visible history 404.
#[get("/activity/<table>/<entity_id>")]
pub async fn get_entity_activity(
    _rate: RateLimited,
    db: DbConn,
    table: &str,
    entity_id: i32,
    auth_user: AdminUser,
) -> ApiResult<Json<Vec<EntityActivity>>> {
    if !TRACKED_TABLES.contains(&table) {
        return Err(bad_request(format!("Unknown table '{}'", table)));
    }
    let table = table.to_string();
    let scope = auth_user.org_scope();

    db.run(move |conn| -> ApiResult<_> {
        let history = get_activity_history(conn, &table, entity_id, scope)
            .map_err(|e| storage_error("Loading activity", e))?;
        if history.is_empty() {
            return Err(not_found("Activity"));
        }
        Ok(Json(history))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![get_entity_activity]
}
