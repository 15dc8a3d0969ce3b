use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::expenses;

text_enum! {
    ExpenseCategory {
        Material => "material",
        MaoDeObra => "mao_de_obra",
        Equipamento => "equipamento",
        Servico => "servico",
        Outros => "outros",
    }
}

/// Money spent on an obra. Amounts are integer cents.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = expenses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Expense {
    pub id: i32,
    pub org_id: i32,
    pub obra_id: i32,
    pub description: String,
    pub category: String,
    pub amount_cents: i64,
    pub spent_on: NaiveDate,
    pub supplier_name: Option<String>,
    pub supplier_document: Option<String>,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = expenses)]
pub struct NewExpense {
    pub org_id: i32,
    pub obra_id: i32,
    pub description: String,
    pub category: String,
    pub amount_cents: i64,
    pub spent_on: NaiveDate,
    pub supplier_name: Option<String>,
    pub supplier_document: Option<String>,
}

#[derive(Debug, Default)]
pub struct ExpenseChanges {
    pub description: Option<String>,
    pub category: Option<String>,
    pub amount_cents: Option<i64>,
    pub spent_on: Option<NaiveDate>,
    pub supplier_name: Option<String>,
    pub supplier_document: Option<String>,
}
