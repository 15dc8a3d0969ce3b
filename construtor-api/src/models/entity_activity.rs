use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::entity_activity;

#[derive(
    Queryable, Selectable, Identifiable, QueryableByName, Debug, Serialize, Deserialize, TS,
)]
#[diesel(table_name = entity_activity)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct EntityActivity {
    pub id: i32,
    pub table_name: String,
    pub entity_id: i32,
    pub org_id: Option<i32>,
    pub operation_type: String, // 'create', 'update', 'delete', 'restore'
    #[ts(type = "string")]
    pub timestamp: NaiveDateTime,
    pub user_id: Option<i32>,
}

#[derive(Insertable, Debug, Deserialize)]
#[diesel(table_name = entity_activity)]
pub struct NewEntityActivity {
    pub table_name: String,
    pub entity_id: i32,
    pub org_id: Option<i32>,
    pub operation_type: String,
    pub timestamp: Option<NaiveDateTime>, // Optional to use database default
    pub user_id: Option<i32>,
}

/// Any entity together with timestamps computed from its activity log.
///
/// Serializes as the entity's own fields plus `created_at` and `updated_at`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Timestamped<T> {
    #[serde(flatten)]
    pub entity: T,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}
