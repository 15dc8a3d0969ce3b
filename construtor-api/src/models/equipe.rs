use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::equipes;

/// A work crew, optionally allocated to an obra.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = equipes)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Equipe {
    pub id: i32,
    pub org_id: i32,
    pub obra_id: Option<i32>,
    pub name: String,
    pub leader_name: Option<String>,
    pub specialty: Option<String>,
    pub member_count: i32,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = equipes)]
pub struct NewEquipe {
    pub org_id: i32,
    pub obra_id: Option<i32>,
    pub name: String,
    pub leader_name: Option<String>,
    pub specialty: Option<String>,
    pub member_count: i32,
}

#[derive(Debug, Default)]
pub struct EquipeChanges {
    pub obra_id: Option<i32>,
    pub name: Option<String>,
    pub leader_name: Option<String>,
    pub specialty: Option<String>,
    pub member_count: Option<i32>,
}
