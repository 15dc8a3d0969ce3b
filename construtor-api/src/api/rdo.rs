//! API endpoints for RDOs (Relatório Diário de Obra) and their review
//! workflow.
//!
//! A report starts as `rascunho` and moves only through
//! `POST /api/rdos/<id>/status`:
//!
//! ```text
//! rascunho -> enviado -> aprovado
//!                     -> rejeitado -> rascunho
//! ```
//!
//! Approving and rejecting are admin decisions. Reports that are `enviado`
//! or `aprovado` cannot be edited and neither can their items.

use chrono::NaiveDate;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, api_error, conflict, forbidden, not_found, storage_error};
use crate::api::{ensure_readable, ensure_same_org, ensure_writable, invalid, visible_obra};
use crate::logged_json::LoggedJson;
use crate::models::{NewRdo, Rdo, RdoChanges, RdoStatus, Timestamped};
use crate::normalize::{optional_text, parse_optional};
use crate::orm::rdo::{
    get_rdo, get_rdo_with_timestamps, insert_rdo, list_rdos, soft_delete_rdo, update_rdo,
    update_rdo_status,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateRdoRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "obraId")]
    pub obra_id: i32,
    #[serde(alias = "data", alias = "reportDate")]
    pub report_date: NaiveDate,
    #[serde(alias = "clima")]
    pub weather: Option<String>,
    #[serde(alias = "observacoes")]
    pub notes: Option<String>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateRdoRequest {
    #[serde(alias = "data", alias = "reportDate")]
    pub report_date: Option<NaiveDate>,
    #[serde(alias = "clima")]
    pub weather: Option<String>,
    #[serde(alias = "observacoes")]
    pub notes: Option<String>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct RdoStatusRequest {
    pub status: RdoStatus,
}

/// Workflow state of a loaded report. Rows always hold a status accepted by
/// the table CHECK, so a parse failure is a storage problem.
pub(crate) fn current_status(rdo: &Rdo) -> ApiResult<RdoStatus> {
    rdo.parsed_status().ok_or_else(|| {
        error!("RDO {} has unknown status '{}'", rdo.id, rdo.status);
        api_error(Status::InternalServerError, "Internal server error while reading RDO status")
    })
}

/// 409 when the report is under review or approved.
pub(crate) fn ensure_editable(rdo: &Rdo) -> ApiResult<()> {
    let status = current_status(rdo)?;
    if status.is_locked() {
        Err(conflict(format!("RDO is {} and cannot be changed", status)))
    } else {
        Ok(())
    }
}

/// Loads a live RDO the caller can see.
pub(crate) fn visible_rdo(
    conn: &mut diesel::SqliteConnection,
    auth_user: &AuthenticatedUser,
    rdo_id: i32,
) -> ApiResult<Rdo> {
    let rdo = get_rdo(conn, rdo_id)
        .map_err(|e| storage_error("Loading RDO", e))?
        .ok_or_else(|| not_found("RDO"))?;
    ensure_readable(auth_user, rdo.org_id, "RDO")?;
    Ok(rdo)
}

/// Create RDO endpoint.
///
/// - **URL:** `/api/rdos`
/// - **Method:** `POST`
///
/// ```json
/// { "obra_id": 3, "report_date": "2025-03-14", "weather": "nublado" }
/// ```
///
/// New reports are always `rascunho`. A second live report for the same
/// obra and day answers 409.
#[post("/rdos", data = "<new_rdo>")]
pub async fn create_rdo(
    _rate: RateLimited,
    db: DbConn,
    new_rdo: LoggedJson<CreateRdoRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<Rdo>>> {
    let request = new_rdo.into_inner();
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let obra = visible_obra(conn, &auth_user, request.obra_id)?;
        ensure_same_org(request.org_id, obra.org_id, "Obra")?;
        ensure_writable(&auth_user, obra.org_id, "RDO")?;

        let rdo = insert_rdo(
            conn,
            NewRdo {
                org_id: obra.org_id,
                obra_id: obra.id,
                report_date: request.report_date,
                weather: optional_text(request.weather),
                notes: optional_text(request.notes),
                status: RdoStatus::Rascunho.as_str().to_string(),
                created_by: Some(acting),
            },
            Some(acting),
        )
        .map_err(|e| storage_error("Creating RDO", e))?;

        info!("RDO {} for obra {} created by user {}", rdo.id, obra.id, acting);
        Ok(status::Created::new(format!("/api/rdos/{}", rdo.id)).body(Json(rdo)))
    })
    .await
}

/// List RDOs endpoint, newest report first.
///
/// - **URL:** `/api/rdos?obra_id=3&status=enviado`
#[get("/rdos?<obra_id>&<status>&<limit>&<offset>")]
pub async fn list_rdos_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    obra_id: Option<i32>,
    status: Option<&str>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Rdo>>> {
    let status = invalid(parse_optional::<RdoStatus>(status))?;
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_rdos(conn, scope, obra_id, status.as_ref().map(RdoStatus::as_str), page)
            .map(Json)
            .map_err(|e| storage_error("Listing RDOs", e))
    })
    .await
}

#[get("/rdos/<rdo_id>")]
pub async fn get_rdo_endpoint(
    _rate: RateLimited,
    db: DbConn,
    rdo_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Rdo>>> {
    db.run(move |conn| -> ApiResult<_> {
        let rdo = get_rdo_with_timestamps(conn, rdo_id)
            .map_err(|e| storage_error("Loading RDO", e))?
            .ok_or_else(|| not_found("RDO"))?;
        ensure_readable(&auth_user, rdo.entity.org_id, "RDO")?;
        Ok(Json(rdo))
    })
    .await
}

/// Update RDO endpoint. Only `rascunho` and `rejeitado` reports can be
/// edited; the status is not changed here.
#[put("/rdos/<rdo_id>", data = "<changes>")]
pub async fn update_rdo_endpoint(
    _rate: RateLimited,
    db: DbConn,
    rdo_id: i32,
    changes: LoggedJson<UpdateRdoRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Rdo>> {
    let request = changes.into_inner();
    let changes = RdoChanges {
        report_date: request.report_date,
        weather: optional_text(request.weather),
        notes: optional_text(request.notes),
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let rdo = visible_rdo(conn, &auth_user, rdo_id)?;
        ensure_writable(&auth_user, rdo.org_id, "RDO")?;
        ensure_editable(&rdo)?;

        update_rdo(conn, rdo_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating RDO", e))
    })
    .await
}

/// Change RDO Status endpoint.
///
/// - **URL:** `/api/rdos/<rdo_id>/status`
/// - **Method:** `POST`
///
/// ```json
/// { "status": "enviado" }
/// ```
///
/// Moves not allowed by the workflow answer 409. Approving or rejecting
/// without admin rights answers 403.
#[post("/rdos/<rdo_id>/status", data = "<request>")]
pub async fn change_rdo_status(
    _rate: RateLimited,
    db: DbConn,
    rdo_id: i32,
    request: LoggedJson<RdoStatusRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Rdo>> {
    let next = request.into_inner().status;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let rdo = visible_rdo(conn, &auth_user, rdo_id)?;
        ensure_writable(&auth_user, rdo.org_id, "RDO")?;

        let current = current_status(&rdo)?;
        if !current.can_transition_to(next) {
            return Err(conflict(format!(
                "Cannot move RDO from {} to {}",
                current, next
            )));
        }
        if RdoStatus::requires_reviewer(next) && !auth_user.can_manage_org(rdo.org_id) {
            return Err(forbidden(format!(
                "Forbidden: only administrators can mark an RDO as {}",
                next
            )));
        }

        let updated = update_rdo_status(conn, rdo_id, next, Some(acting))
            .map_err(|e| storage_error("Updating RDO status", e))?;
        info!("RDO {} moved from {} to {} by user {}", rdo_id, current, next, acting);
        Ok(Json(updated))
    })
    .await
}

/// Delete RDO endpoint. The report's items are deleted with it.
///
/// Reports under review or approved answer 409 like any other change; an
/// admin rejects one first to make it deletable.
#[delete("/rdos/<rdo_id>")]
pub async fn delete_rdo(
    _rate: RateLimited,
    db: DbConn,
    rdo_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let rdo = visible_rdo(conn, &auth_user, rdo_id)?;
        ensure_writable(&auth_user, rdo.org_id, "RDO")?;
        ensure_editable(&rdo)?;

        match soft_delete_rdo(conn, rdo_id, Some(acting)) {
            Ok(0) => Err(not_found("RDO")),
            Ok(_) => {
                info!("RDO {} deleted by user {}", rdo_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting RDO", e)),
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_rdo,
        list_rdos_endpoint,
        get_rdo_endpoint,
        update_rdo_endpoint,
        change_rdo_status,
        delete_rdo
    ]
}
