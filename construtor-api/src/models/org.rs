use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::orgs;

/// A tenant organization. Every resource row belongs to exactly one org.
#[derive(
    Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(table_name = orgs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Org {
    pub id: i32,
    pub name: String,
    pub cnpj: Option<String>, // 14 digits, no punctuation
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug, Deserialize)]
#[diesel(table_name = orgs)]
pub struct NewOrg {
    pub name: String,
    pub cnpj: Option<String>,
}
