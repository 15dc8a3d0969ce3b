use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::equipamentos;

text_enum! {
    Ownership {
        Proprio => "proprio",
        Alugado => "alugado",
    }
}

text_enum! {
    EquipamentoStatus {
        Disponivel => "disponivel",
        EmUso => "em_uso",
        Manutencao => "manutencao",
    }
}

#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = equipamentos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Equipamento {
    pub id: i32,
    pub org_id: i32,
    pub obra_id: Option<i32>,
    pub name: String,
    pub category: Option<String>,
    pub ownership: String,
    pub status: String,
    pub daily_rate_cents: Option<i64>,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = equipamentos)]
pub struct NewEquipamento {
    pub org_id: i32,
    pub obra_id: Option<i32>,
    pub name: String,
    pub category: Option<String>,
    pub ownership: String,
    pub status: String,
    pub daily_rate_cents: Option<i64>,
}

#[derive(Debug, Default)]
pub struct EquipamentoChanges {
    pub obra_id: Option<i32>,
    pub name: Option<String>,
    pub category: Option<String>,
    pub ownership: Option<String>,
    pub status: Option<String>,
    pub daily_rate_cents: Option<i64>,
}
