use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::Serialize;

use crate::schema::rate_limits;

/// Request counter for one (identifier, endpoint) pair in its current window.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize)]
#[diesel(table_name = rate_limits)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RateLimitEntry {
    pub id: i32,
    pub identifier: String,
    pub endpoint: String,
    pub window_start: NaiveDateTime,
    pub request_count: i32,
}

#[derive(Insertable)]
#[diesel(table_name = rate_limits)]
pub struct NewRateLimitEntry {
    pub identifier: String,
    pub endpoint: String,
    pub window_start: NaiveDateTime,
    pub request_count: i32,
}
