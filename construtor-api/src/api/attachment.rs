//! API endpoints for attachment metadata.
//!
//! The server records where a file lives and what it is; the bytes are
//! uploaded to object storage by the client. An attachment belongs to the
//! org of the record it points at.

use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use rocket::{Route, State};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, api_error, bad_request, not_found, storage_error};
use crate::api::{ensure_readable, ensure_same_org, ensure_writable, invalid};
use crate::config::{AppConfig, AttachmentConfig};
use crate::logged_json::LoggedJson;
use crate::models::{Attachment, AttachmentChanges, AttachmentEntityType, NewAttachment, Timestamped};
use crate::normalize::{changed_text, optional_text, parse_optional, required_text};
use crate::orm::attachment::{
    entity_org, get_attachment, get_attachment_with_timestamps, insert_attachment,
    list_attachments, soft_delete_attachment, update_attachment,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateAttachmentRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "tipo_entidade", alias = "entityType")]
    pub entity_type: AttachmentEntityType,
    #[serde(alias = "entidade_id", alias = "entityId")]
    pub entity_id: i32,
    #[serde(alias = "nome_arquivo", alias = "fileName")]
    pub file_name: String,
    #[serde(alias = "tipo_conteudo", alias = "contentType")]
    pub content_type: String,
    #[serde(alias = "tamanho_bytes", alias = "sizeBytes")]
    pub size_bytes: i64,
    /// Generated under `orgs/<org>/<entity_type>/<entity_id>/` when absent.
    #[serde(alias = "caminho", alias = "storagePath")]
    pub storage_path: Option<String>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateAttachmentRequest {
    #[serde(alias = "nome_arquivo", alias = "fileName")]
    pub file_name: Option<String>,
    #[serde(alias = "caminho", alias = "storagePath")]
    pub storage_path: Option<String>,
}

/// Media type without parameters, lowercased.
fn bare_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// 400 for a disallowed type or negative size, 413 above the size limit.
fn check_upload(config: &AttachmentConfig, content_type: &str, size_bytes: i64) -> ApiResult<()> {
    if !config.allows(content_type) {
        return Err(bad_request(format!(
            "Content type '{}' is not allowed",
            content_type
        )));
    }
    if size_bytes < 0 {
        return Err(bad_request("size_bytes cannot be negative"));
    }
    if size_bytes > config.max_size_bytes {
        return Err(api_error(
            Status::PayloadTooLarge,
            format!(
                "File of {} bytes exceeds the limit of {} bytes",
                size_bytes, config.max_size_bytes
            ),
        ));
    }
    Ok(())
}

fn default_storage_path(
    org_id: i32,
    kind: AttachmentEntityType,
    entity_id: i32,
    file_name: &str,
) -> String {
    let safe_name: String = file_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!(
        "orgs/{}/{}/{}/{}-{}",
        org_id,
        kind,
        entity_id,
        uuid::Uuid::new_v4(),
        safe_name
    )
}

/// Create Attachment endpoint.
///
/// - **URL:** `/api/attachments`
/// - **Method:** `POST`
///
/// ```json
/// {
///   "entity_type": "rdo",
///   "entity_id": 7,
///   "file_name": "laje.jpg",
///   "content_type": "image/jpeg",
///   "size_bytes": 482113
/// }
/// ```
///
/// The target record must be live and visible (404 otherwise).
#[post("/attachments", data = "<new_attachment>")]
pub async fn create_attachment(
    _rate: RateLimited,
    db: DbConn,
    config: &State<AppConfig>,
    new_attachment: LoggedJson<CreateAttachmentRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<Attachment>>> {
    let request = new_attachment.into_inner();
    let file_name = invalid(required_text("file_name", &request.file_name))?;
    let content_type = bare_content_type(&request.content_type);
    check_upload(&config.attachments, &content_type, request.size_bytes)?;
    let storage_path = optional_text(request.storage_path);
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let kind = request.entity_type;
        let org_id = entity_org(conn, kind, request.entity_id)
            .map_err(|e| storage_error("Loading attachment target", e))?
            .ok_or_else(|| not_found(&capitalized(kind.as_str())))?;
        ensure_readable(&auth_user, org_id, &capitalized(kind.as_str()))?;
        ensure_same_org(request.org_id, org_id, kind.as_str())?;
        ensure_writable(&auth_user, org_id, "Attachment")?;

        let storage_path = storage_path
            .unwrap_or_else(|| default_storage_path(org_id, kind, request.entity_id, &file_name));
        let attachment = insert_attachment(
            conn,
            NewAttachment {
                org_id,
                entity_type: kind.as_str().to_string(),
                entity_id: request.entity_id,
                file_name,
                content_type,
                size_bytes: request.size_bytes,
                storage_path,
                uploaded_by: Some(acting),
            },
            Some(acting),
        )
        .map_err(|e| storage_error("Creating attachment", e))?;

        info!(
            "Attachment {} on {} {} uploaded by user {}",
            attachment.id, kind, request.entity_id, acting
        );
        Ok(status::Created::new(format!("/api/attachments/{}", attachment.id)).body(Json(attachment)))
    })
    .await
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// List Attachments endpoint.
///
/// - **URL:** `/api/attachments?entity_type=rdo&entity_id=7`
#[get("/attachments?<entity_type>&<entity_id>&<limit>&<offset>")]
pub async fn list_attachments_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    entity_type: Option<&str>,
    entity_id: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Attachment>>> {
    let entity_type = invalid(parse_optional::<AttachmentEntityType>(entity_type))?;
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_attachments(conn, scope, entity_type, entity_id, page)
            .map(Json)
            .map_err(|e| storage_error("Listing attachments", e))
    })
    .await
}

#[get("/attachments/<attachment_id>")]
pub async fn get_attachment_endpoint(
    _rate: RateLimited,
    db: DbConn,
    attachment_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Attachment>>> {
    db.run(move |conn| -> ApiResult<_> {
        let attachment = get_attachment_with_timestamps(conn, attachment_id)
            .map_err(|e| storage_error("Loading attachment", e))?
            .ok_or_else(|| not_found("Attachment"))?;
        ensure_readable(&auth_user, attachment.entity.org_id, "Attachment")?;
        Ok(Json(attachment))
    })
    .await
}

/// Update Attachment endpoint. Only the file name and storage path can
/// change; the type, size and target are fixed at upload.
#[put("/attachments/<attachment_id>", data = "<changes>")]
pub async fn update_attachment_endpoint(
    _rate: RateLimited,
    db: DbConn,
    attachment_id: i32,
    changes: LoggedJson<UpdateAttachmentRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Attachment>> {
    let request = changes.into_inner();
    let changes = AttachmentChanges {
        file_name: invalid(changed_text("file_name", request.file_name))?,
        storage_path: invalid(changed_text("storage_path", request.storage_path))?,
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let attachment = get_attachment(conn, attachment_id)
            .map_err(|e| storage_error("Loading attachment", e))?
            .ok_or_else(|| not_found("Attachment"))?;
        ensure_writable(&auth_user, attachment.org_id, "Attachment")?;

        update_attachment(conn, attachment_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating attachment", e))
    })
    .await
}

#[delete("/attachments/<attachment_id>")]
pub async fn delete_attachment(
    _rate: RateLimited,
    db: DbConn,
    attachment_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let attachment = get_attachment(conn, attachment_id)
            .map_err(|e| storage_error("Loading attachment", e))?
            .ok_or_else(|| not_found("Attachment"))?;
        ensure_writable(&auth_user, attachment.org_id, "Attachment")?;

        match soft_delete_attachment(conn, attachment_id, Some(acting)) {
            Ok(0) => Err(not_found("Attachment")),
            Ok(_) => {
                info!("Attachment {} deleted by user {}", attachment_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting attachment", e)),
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_attachment,
        list_attachments_endpoint,
        get_attachment_endpoint,
        update_attachment_endpoint,
        delete_attachment
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_parameters_are_dropped() {
        assert_eq!(bare_content_type("Image/JPEG; charset=binary"), "image/jpeg");
        assert_eq!(bare_content_type(" application/pdf "), "application/pdf");
    }

    #[test]
    fn test_upload_limits() {
        let config = AttachmentConfig::default();
        assert!(check_upload(&config, "image/png", 1024).is_ok());
        assert_eq!(
            check_upload(&config, "application/x-msdownload", 10).unwrap_err().0,
            Status::BadRequest
        );
        assert_eq!(check_upload(&config, "image/png", -1).unwrap_err().0, Status::BadRequest);
        assert_eq!(
            check_upload(&config, "image/png", config.max_size_bytes + 1).unwrap_err().0,
            Status::PayloadTooLarge
        );
    }

    #[test]
    fn test_default_storage_path_layout() {
        let path = default_storage_path(2, AttachmentEntityType::Rdo, 7, "fotos/laje.jpg");
        assert!(path.starts_with("orgs/2/rdo/7/"));
        assert!(path.ends_with("-fotos_laje.jpg"));
    }
}
