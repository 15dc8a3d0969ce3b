use rocket::Route;
use rocket::http::{Cookie, CookieJar};
use rocket::serde::json::{Json, Value, json};

use crate::orm::DbConn;
use crate::orm::logout::revoke_session;
use crate::rate_limit::RateLimited;

/// Logout endpoint.
///
/// - **URL:** `/api/logout`
/// - **Method:** `POST`
/// - **Authentication:** None required
///
/// Revokes the session named by the cookie, if any, and removes the cookie.
/// Always answers 200 so clients can call it unconditionally.
#[post("/logout")]
pub async fn logout(_rate: RateLimited, db: DbConn, cookies: &CookieJar<'_>) -> Json<Value> {
    let cookie_value = cookies.get("session").map(|c| c.value().to_string());

    if let Some(session_id) = cookie_value {
        if let Err(e) = revoke_session(&db, &session_id).await {
            error!("Failed to revoke session: {:?}", e);
        }
        cookies.remove(Cookie::from("session"));
    }

    Json(json!({ "status": "logged out" }))
}

pub fn routes() -> Vec<Route> {
    routes![logout]
}
