//! API endpoints for the work lines of an RDO, under `/api/rdo-itens`.
//!
//! Items follow the lock of their report: while the RDO is `enviado` or
//! `aprovado` every write answers 409.

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, bad_request, not_found, storage_error};
use crate::api::rdo::{ensure_editable, visible_rdo};
use crate::api::{ensure_readable, ensure_same_org, ensure_writable, invalid};
use crate::logged_json::LoggedJson;
use crate::models::{NewRdoItem, RdoItem, RdoItemChanges, Timestamped};
use crate::normalize::{changed_text, optional_text, required_text};
use crate::orm::equipe::get_equipe;
use crate::orm::rdo_item::{
    get_rdo_item, get_rdo_item_with_timestamps, insert_rdo_item, list_rdo_items,
    soft_delete_rdo_item, update_rdo_item,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateRdoItemRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "rdoId")]
    pub rdo_id: i32,
    #[serde(alias = "descricao")]
    pub description: String,
    #[serde(alias = "quantidade")]
    pub quantity: Option<f64>,
    #[serde(alias = "unidade")]
    pub unit: Option<String>,
    #[serde(alias = "equipeId")]
    pub equipe_id: Option<i32>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateRdoItemRequest {
    #[serde(alias = "descricao")]
    pub description: Option<String>,
    #[serde(alias = "quantidade")]
    pub quantity: Option<f64>,
    #[serde(alias = "unidade")]
    pub unit: Option<String>,
    #[serde(alias = "equipeId")]
    pub equipe_id: Option<i32>,
}

fn check_quantity(quantity: Option<f64>) -> ApiResult<()> {
    match quantity {
        Some(q) if !q.is_finite() || q < 0.0 => {
            Err(bad_request("quantity must be a non-negative number"))
        }
        _ => Ok(()),
    }
}

/// The crew credited on an item must be a live equipe of the item's org.
fn check_equipe(
    conn: &mut diesel::SqliteConnection,
    auth_user: &AuthenticatedUser,
    equipe_id: i32,
    org_id: i32,
) -> ApiResult<()> {
    let equipe = get_equipe(conn, equipe_id)
        .map_err(|e| storage_error("Loading equipe", e))?
        .ok_or_else(|| not_found("Equipe"))?;
    ensure_readable(auth_user, equipe.org_id, "Equipe")?;
    ensure_same_org(Some(org_id), equipe.org_id, "Equipe")
}

/// Loads a live item and its report, checking the caller may change it.
fn writable_item(
    conn: &mut diesel::SqliteConnection,
    auth_user: &AuthenticatedUser,
    item_id: i32,
) -> ApiResult<RdoItem> {
    let item = get_rdo_item(conn, item_id)
        .map_err(|e| storage_error("Loading RDO item", e))?
        .ok_or_else(|| not_found("RDO item"))?;
    ensure_writable(auth_user, item.org_id, "RDO item")?;
    let rdo = visible_rdo(conn, auth_user, item.rdo_id)?;
    ensure_editable(&rdo)?;
    Ok(item)
}

/// Create RDO Item endpoint.
///
/// ```json
/// { "rdo_id": 7, "description": "Concretagem da laje", "quantity": 12.5, "unit": "m3" }
/// ```
#[post("/rdo-itens", data = "<new_item>")]
pub async fn create_rdo_item(
    _rate: RateLimited,
    db: DbConn,
    new_item: LoggedJson<CreateRdoItemRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<RdoItem>>> {
    let request = new_item.into_inner();
    let description = invalid(required_text("description", &request.description))?;
    check_quantity(request.quantity)?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let rdo = visible_rdo(conn, &auth_user, request.rdo_id)?;
        ensure_same_org(request.org_id, rdo.org_id, "RDO")?;
        ensure_writable(&auth_user, rdo.org_id, "RDO item")?;
        ensure_editable(&rdo)?;
        if let Some(equipe_id) = request.equipe_id {
            check_equipe(conn, &auth_user, equipe_id, rdo.org_id)?;
        }

        let item = insert_rdo_item(
            conn,
            NewRdoItem {
                org_id: rdo.org_id,
                rdo_id: rdo.id,
                description,
                quantity: request.quantity.unwrap_or(0.0),
                unit: optional_text(request.unit),
                equipe_id: request.equipe_id,
            },
            Some(acting),
        )
        .map_err(|e| storage_error("Creating RDO item", e))?;

        info!("RDO item {} added to RDO {} by user {}", item.id, rdo.id, acting);
        Ok(status::Created::new(format!("/api/rdo-itens/{}", item.id)).body(Json(item)))
    })
    .await
}

/// List RDO Items endpoint.
///
/// - **URL:** `/api/rdo-itens?rdo_id=7`
#[get("/rdo-itens?<rdo_id>&<limit>&<offset>")]
pub async fn list_rdo_items_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    rdo_id: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<RdoItem>>> {
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_rdo_items(conn, scope, rdo_id, page)
            .map(Json)
            .map_err(|e| storage_error("Listing RDO items", e))
    })
    .await
}

#[get("/rdo-itens/<item_id>")]
pub async fn get_rdo_item_endpoint(
    _rate: RateLimited,
    db: DbConn,
    item_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<RdoItem>>> {
    db.run(move |conn| -> ApiResult<_> {
        let item = get_rdo_item_with_timestamps(conn, item_id)
            .map_err(|e| storage_error("Loading RDO item", e))?
            .ok_or_else(|| not_found("RDO item"))?;
        ensure_readable(&auth_user, item.entity.org_id, "RDO item")?;
        Ok(Json(item))
    })
    .await
}

#[put("/rdo-itens/<item_id>", data = "<changes>")]
pub async fn update_rdo_item_endpoint(
    _rate: RateLimited,
    db: DbConn,
    item_id: i32,
    changes: LoggedJson<UpdateRdoItemRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<RdoItem>> {
    let request = changes.into_inner();
    check_quantity(request.quantity)?;
    let changes = RdoItemChanges {
        description: invalid(changed_text("description", request.description))?,
        quantity: request.quantity,
        unit: optional_text(request.unit),
        equipe_id: request.equipe_id,
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let item = writable_item(conn, &auth_user, item_id)?;
        if let Some(equipe_id) = changes.equipe_id {
            check_equipe(conn, &auth_user, equipe_id, item.org_id)?;
        }

        update_rdo_item(conn, item_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating RDO item", e))
    })
    .await
}

#[delete("/rdo-itens/<item_id>")]
pub async fn delete_rdo_item(
    _rate: RateLimited,
    db: DbConn,
    item_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        writable_item(conn, &auth_user, item_id)?;

        match soft_delete_rdo_item(conn, item_id, Some(acting)) {
            Ok(0) => Err(not_found("RDO item")),
            Ok(_) => {
                info!("RDO item {} deleted by user {}", item_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting RDO item", e)),
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_rdo_item,
        list_rdo_items_endpoint,
        get_rdo_item_endpoint,
        update_rdo_item_endpoint,
        delete_rdo_item
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_bounds() {
        assert!(check_quantity(None).is_ok());
        assert!(check_quantity(Some(0.0)).is_ok());
        assert!(check_quantity(Some(12.5)).is_ok());
        assert_eq!(check_quantity(Some(-1.0)).unwrap_err().0, Status::BadRequest);
        assert_eq!(check_quantity(Some(f64::NAN)).unwrap_err().0, Status::BadRequest);
    }
}
