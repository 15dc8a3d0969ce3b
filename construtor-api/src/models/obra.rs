use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::obras;

text_enum! {
    /// Lifecycle of a construction project.
    ObraStatus {
        Planejada => "planejada",
        EmAndamento => "em_andamento",
        Pausada => "pausada",
        Concluida => "concluida",
        Cancelada => "cancelada",
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = obras)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Obra {
    pub id: i32,
    pub org_id: i32,
    pub name: String,
    pub address: Option<String>,
    pub client_name: Option<String>,
    pub client_document: Option<String>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = obras)]
pub struct NewObra {
    pub org_id: i32,
    pub name: String,
    pub address: Option<String>,
    pub client_name: Option<String>,
    pub client_document: Option<String>,
    pub status: String,
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
}

/// Fields to change on an obra; `None` keeps the stored value.
#[derive(Debug, Default)]
pub struct ObraChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub client_name: Option<String>,
    pub client_document: Option<String>,
    pub status: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub budget_cents: Option<i64>,
}

/// Aggregate figures for one obra, counting live rows only.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ObraSummary {
    pub obra_id: i32,
    pub equipe_count: i64,
    pub equipamento_count: i64,
    pub rdo_count: i64,
    pub approved_rdo_count: i64,
    pub open_checklist_items: i64,
    pub expense_total_cents: i64,
}
