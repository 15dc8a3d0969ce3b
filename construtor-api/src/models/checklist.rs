use chrono::NaiveDateTime;
use diesel::{Associations, Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::{checklist_itens, checklists};

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = checklists)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Checklist {
    pub id: i32,
    pub org_id: i32,
    pub obra_id: i32,
    pub title: String,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = checklists)]
pub struct NewChecklist {
    pub org_id: i32,
    pub obra_id: i32,
    pub title: String,
}

#[derive(
    Queryable, Selectable, Identifiable, Associations, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(belongs_to(Checklist, foreign_key = checklist_id))]
#[diesel(table_name = checklist_itens)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct ChecklistItem {
    pub id: i32,
    pub checklist_id: i32,
    pub description: String,
    pub done: bool,
    #[ts(type = "string | null")]
    pub done_at: Option<NaiveDateTime>,
    pub done_by: Option<i32>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = checklist_itens)]
pub struct NewChecklistItem {
    pub checklist_id: i32,
    pub description: String,
}

/// A checklist with its items, as returned by the detail endpoint.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ChecklistWithItems {
    #[serde(flatten)]
    #[ts(flatten)]
    pub checklist: Checklist,
    pub items: Vec<ChecklistItem>,
}
