use chrono::NaiveDateTime;
use diesel::{Identifiable, Insertable, Queryable, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::schema::attachments;

text_enum! {
    /// Kinds of records a file can be attached to.
    AttachmentEntityType {
        Obra => "obra",
        Rdo => "rdo",
        Expense => "expense",
        Checklist => "checklist",
        Equipamento => "equipamento",
    }
}

/// Metadata of a stored file. The bytes live in external storage at
/// `storage_path`.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone, Serialize, Deserialize, TS)]
#[diesel(table_name = attachments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct Attachment {
    pub id: i32,
    pub org_id: i32,
    pub entity_type: String,
    pub entity_id: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub uploaded_by: Option<i32>,
    #[serde(skip)]
    #[ts(skip)]
    pub deleted_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = attachments)]
pub struct NewAttachment {
    pub org_id: i32,
    pub entity_type: String,
    pub entity_id: i32,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub storage_path: String,
    pub uploaded_by: Option<i32>,
}

#[derive(Debug, Default)]
pub struct AttachmentChanges {
    pub file_name: Option<String>,
    pub storage_path: Option<String>,
}
