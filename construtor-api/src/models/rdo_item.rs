use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::rdo_itens;

/// A line of work recorded on a daily report.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = rdo_itens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct RdoItem {
    pub id: i32,
    pub org_id: i32,
    pub rdo_id: i32,
    pub description: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub equipe_id: Option<i32>,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = rdo_itens)]
pub struct NewRdoItem {
    pub org_id: i32,
    pub rdo_id: i32,
    pub description: String,
    pub quantity: f64,
    pub unit: Option<String>,
    pub equipe_id: Option<i32>,
}

#[derive(Debug, Default)]
pub struct RdoItemChanges {
    pub description: Option<String>,
    pub quantity: Option<f64>,
    pub unit: Option<String>,
    pub equipe_id: Option<i32>,
}
