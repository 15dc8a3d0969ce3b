//! API endpoints for obra checklists and their items.

use diesel::Connection;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, not_found, storage_error};
use crate::api::{ensure_readable, ensure_same_org, ensure_writable, invalid, visible_obra};
use crate::logged_json::LoggedJson;
use crate::models::{Checklist, ChecklistItem, ChecklistWithItems, NewChecklist, Timestamped};
use crate::normalize::{changed_text, required_text};
use crate::orm::checklist::{
    add_checklist_item, delete_checklist_item, get_checklist, get_checklist_item,
    get_checklist_with_items, insert_checklist, list_checklist_items, list_checklists,
    soft_delete_checklist, update_checklist, update_checklist_item,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateChecklistRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "obraId")]
    pub obra_id: i32,
    #[serde(alias = "titulo")]
    pub title: String,
    /// Descriptions of the initial items, in order.
    #[serde(alias = "itens")]
    pub items: Option<Vec<String>>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateChecklistRequest {
    #[serde(alias = "titulo")]
    pub title: Option<String>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateChecklistItemRequest {
    #[serde(alias = "descricao")]
    pub description: String,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateChecklistItemRequest {
    #[serde(alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "concluido")]
    pub done: Option<bool>,
}

fn visible_checklist(
    conn: &mut diesel::SqliteConnection,
    auth_user: &AuthenticatedUser,
    checklist_id: i32,
) -> ApiResult<Checklist> {
    let checklist = get_checklist(conn, checklist_id)
        .map_err(|e| storage_error("Loading checklist", e))?
        .ok_or_else(|| not_found("Checklist"))?;
    ensure_readable(auth_user, checklist.org_id, "Checklist")?;
    Ok(checklist)
}

/// Create Checklist endpoint.
///
/// ```json
/// { "obra_id": 3, "title": "Vistoria da fundação", "items": ["Gabarito", "Armação"] }
/// ```
///
/// The checklist and its initial items are created in one transaction.
#[post("/checklists", data = "<new_checklist>")]
pub async fn create_checklist(
    _rate: RateLimited,
    db: DbConn,
    new_checklist: LoggedJson<CreateChecklistRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<ChecklistWithItems>>> {
    let request = new_checklist.into_inner();
    let title = invalid(required_text("title", &request.title))?;
    let descriptions = request
        .items
        .unwrap_or_default()
        .iter()
        .map(|d| required_text("items", d))
        .collect::<Result<Vec<_>, _>>();
    let descriptions = invalid(descriptions)?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let obra = visible_obra(conn, &auth_user, request.obra_id)?;
        ensure_same_org(request.org_id, obra.org_id, "Obra")?;
        ensure_writable(&auth_user, obra.org_id, "Checklist")?;

        let created = conn
            .transaction::<_, diesel::result::Error, _>(|conn| {
                let checklist = insert_checklist(
                    conn,
                    NewChecklist {
                        org_id: obra.org_id,
                        obra_id: obra.id,
                        title,
                    },
                    Some(acting),
                )?;
                let mut items = Vec::with_capacity(descriptions.len());
                for description in descriptions {
                    items.push(add_checklist_item(conn, checklist.id, description, Some(acting))?);
                }
                Ok(ChecklistWithItems { checklist, items })
            })
            .map_err(|e| storage_error("Creating checklist", e))?;

        info!(
            "Checklist {} with {} items created by user {}",
            created.checklist.id,
            created.items.len(),
            acting
        );
        Ok(status::Created::new(format!("/api/checklists/{}", created.checklist.id))
            .body(Json(created)))
    })
    .await
}

#[get("/checklists?<obra_id>&<limit>&<offset>")]
pub async fn list_checklists_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    obra_id: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Checklist>>> {
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_checklists(conn, scope, obra_id, page)
            .map(Json)
            .map_err(|e| storage_error("Listing checklists", e))
    })
    .await
}

/// Get Checklist endpoint, including its items.
#[get("/checklists/<checklist_id>")]
pub async fn get_checklist_endpoint(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<ChecklistWithItems>>> {
    db.run(move |conn| -> ApiResult<_> {
        let checklist = get_checklist_with_items(conn, checklist_id)
            .map_err(|e| storage_error("Loading checklist", e))?
            .ok_or_else(|| not_found("Checklist"))?;
        ensure_readable(&auth_user, checklist.entity.checklist.org_id, "Checklist")?;
        Ok(Json(checklist))
    })
    .await
}

#[put("/checklists/<checklist_id>", data = "<changes>")]
pub async fn update_checklist_endpoint(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    changes: LoggedJson<UpdateChecklistRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Checklist>> {
    let title = invalid(changed_text("title", changes.into_inner().title))?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let checklist = visible_checklist(conn, &auth_user, checklist_id)?;
        ensure_writable(&auth_user, checklist.org_id, "Checklist")?;
        update_checklist(conn, checklist_id, title, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating checklist", e))
    })
    .await
}

#[delete("/checklists/<checklist_id>")]
pub async fn delete_checklist(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let checklist = visible_checklist(conn, &auth_user, checklist_id)?;
        ensure_writable(&auth_user, checklist.org_id, "Checklist")?;

        match soft_delete_checklist(conn, checklist_id, Some(acting)) {
            Ok(0) => Err(not_found("Checklist")),
            Ok(_) => {
                info!("Checklist {} deleted by user {}", checklist_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting checklist", e)),
        }
    })
    .await
}

#[get("/checklists/<checklist_id>/items")]
pub async fn list_items(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Vec<ChecklistItem>>> {
    db.run(move |conn| -> ApiResult<_> {
        visible_checklist(conn, &auth_user, checklist_id)?;
        list_checklist_items(conn, checklist_id)
            .map(Json)
            .map_err(|e| storage_error("Listing checklist items", e))
    })
    .await
}

#[post("/checklists/<checklist_id>/items", data = "<new_item>")]
pub async fn add_item(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    new_item: LoggedJson<CreateChecklistItemRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<ChecklistItem>>> {
    let description = invalid(required_text("description", &new_item.description))?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let checklist = visible_checklist(conn, &auth_user, checklist_id)?;
        ensure_writable(&auth_user, checklist.org_id, "Checklist")?;

        let item = add_checklist_item(conn, checklist_id, description, Some(acting))
            .map_err(|e| storage_error("Adding checklist item", e))?;
        Ok(
            status::Created::new(format!("/api/checklists/{}/items/{}", checklist_id, item.id))
                .body(Json(item)),
        )
    })
    .await
}

/// Update Checklist Item endpoint.
///
/// ```json
/// { "done": true }
/// ```
///
/// Marking an item done records `done_at` and `done_by`; reopening it
/// clears them.
#[put("/checklists/<checklist_id>/items/<item_id>", data = "<changes>")]
pub async fn update_item(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    item_id: i32,
    changes: LoggedJson<UpdateChecklistItemRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<ChecklistItem>> {
    let request = changes.into_inner();
    let description = invalid(changed_text("description", request.description))?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let checklist = visible_checklist(conn, &auth_user, checklist_id)?;
        ensure_writable(&auth_user, checklist.org_id, "Checklist")?;
        get_checklist_item(conn, checklist_id, item_id)
            .map_err(|e| storage_error("Loading checklist item", e))?
            .ok_or_else(|| not_found("Checklist item"))?;

        update_checklist_item(conn, item_id, description, request.done, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating checklist item", e))
    })
    .await
}

#[delete("/checklists/<checklist_id>/items/<item_id>")]
pub async fn delete_item(
    _rate: RateLimited,
    db: DbConn,
    checklist_id: i32,
    item_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let checklist = visible_checklist(conn, &auth_user, checklist_id)?;
        ensure_writable(&auth_user, checklist.org_id, "Checklist")?;
        get_checklist_item(conn, checklist_id, item_id)
            .map_err(|e| storage_error("Loading checklist item", e))?
            .ok_or_else(|| not_found("Checklist item"))?;

        delete_checklist_item(conn, item_id, Some(acting))
            .map(|_| Status::NoContent)
            .map_err(|e| storage_error("Deleting checklist item", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_checklist,
        list_checklists_endpoint,
        get_checklist_endpoint,
        update_checklist_endpoint,
        delete_checklist,
        list_items,
        add_item,
        update_item,
        delete_item
    ]
}
