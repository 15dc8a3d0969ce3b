use chrono::{NaiveDate, NaiveDateTime};
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::rdos;

text_enum! {
    /// Review workflow of a daily report.
    RdoStatus {
        Rascunho => "rascunho",
        Enviado => "enviado",
        Aprovado => "aprovado",
        Rejeitado => "rejeitado",
    }
}

impl RdoStatus {
    /// Allowed moves: draft to submitted, submitted to approved or
    /// rejected, rejected back to draft.
    pub fn can_transition_to(self, next: RdoStatus) -> bool {
        matches!(
            (self, next),
            (RdoStatus::Rascunho, RdoStatus::Enviado)
                | (RdoStatus::Enviado, RdoStatus::Aprovado)
                | (RdoStatus::Enviado, RdoStatus::Rejeitado)
                | (RdoStatus::Rejeitado, RdoStatus::Rascunho)
        )
    }

    /// Approving or rejecting is a review decision.
    pub fn requires_reviewer(next: RdoStatus) -> bool {
        matches!(next, RdoStatus::Aprovado | RdoStatus::Rejeitado)
    }

    /// Reports under review or approved cannot have their content changed.
    pub fn is_locked(self) -> bool {
        matches!(self, RdoStatus::Enviado | RdoStatus::Aprovado)
    }
}

/// Relatório Diário de Obra: one daily report per obra and day.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = rdos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Rdo {
    pub id: i32,
    pub org_id: i32,
    pub obra_id: i32,
    pub report_date: NaiveDate,
    pub weather: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: Option<i32>,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

impl Rdo {
    /// Parsed status; rows always hold a value accepted by the table CHECK.
    pub fn parsed_status(&self) -> Option<RdoStatus> {
        self.status.parse().ok()
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = rdos)]
pub struct NewRdo {
    pub org_id: i32,
    pub obra_id: i32,
    pub report_date: NaiveDate,
    pub weather: Option<String>,
    pub notes: Option<String>,
    pub status: String,
    pub created_by: Option<i32>,
}

#[derive(Debug, Default)]
pub struct RdoChanges {
    pub report_date: Option<NaiveDate>,
    pub weather: Option<String>,
    pub notes: Option<String>,
}
