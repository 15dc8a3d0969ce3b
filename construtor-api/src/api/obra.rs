//! API endpoints for obras (construction projects).
//!
//! Editors and admins write obras of their own org; viewers read them.

use chrono::NaiveDate;
use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, bad_request, not_found, storage_error};
use crate::api::{
    ensure_readable, ensure_writable, invalid, live_org, resolve_target_org, visible_obra,
};
use crate::logged_json::LoggedJson;
use crate::models::{NewObra, Obra, ObraChanges, ObraStatus, ObraSummary, Timestamped};
use crate::normalize::{changed_text, optional_document, optional_text, parse_optional, required_text};
use crate::orm::obra::{
    get_obra_with_timestamps, insert_obra, list_obras, obra_summary, soft_delete_obra,
    update_obra,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateObraRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "endereco")]
    pub address: Option<String>,
    #[serde(alias = "cliente", alias = "clientName")]
    pub client_name: Option<String>,
    /// CPF or CNPJ, with or without punctuation.
    #[serde(alias = "cliente_documento", alias = "clientDocument")]
    pub client_document: Option<String>,
    /// Defaults to `planejada`.
    pub status: Option<ObraStatus>,
    #[serde(alias = "data_inicio", alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "data_previsao_fim", alias = "expectedEndDate")]
    pub expected_end_date: Option<NaiveDate>,
    #[serde(alias = "orcamento_centavos", alias = "budgetCents")]
    pub budget_cents: Option<i64>,
}

/// All fields optional; absent fields keep their value.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateObraRequest {
    #[serde(alias = "nome")]
    pub name: Option<String>,
    #[serde(alias = "endereco")]
    pub address: Option<String>,
    #[serde(alias = "cliente", alias = "clientName")]
    pub client_name: Option<String>,
    #[serde(alias = "cliente_documento", alias = "clientDocument")]
    pub client_document: Option<String>,
    pub status: Option<ObraStatus>,
    #[serde(alias = "data_inicio", alias = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(alias = "data_previsao_fim", alias = "expectedEndDate")]
    pub expected_end_date: Option<NaiveDate>,
    #[serde(alias = "orcamento_centavos", alias = "budgetCents")]
    pub budget_cents: Option<i64>,
}

fn check_dates(start: Option<NaiveDate>, expected_end: Option<NaiveDate>) -> ApiResult<()> {
    match (start, expected_end) {
        (Some(start), Some(end)) if end < start => Err(bad_request(
            "expected_end_date cannot be earlier than start_date",
        )),
        _ => Ok(()),
    }
}

fn check_budget(budget_cents: Option<i64>) -> ApiResult<()> {
    match budget_cents {
        Some(cents) if cents < 0 => Err(bad_request("budget_cents cannot be negative")),
        _ => Ok(()),
    }
}

/// Create Obra endpoint.
///
/// - **URL:** `/api/obras`
/// - **Method:** `POST`
/// - **Authorization:** editor or admin of the org
///
/// ```json
/// {
///   "name": "Residencial Ipê",
///   "client_document": "529.982.247-25",
///   "start_date": "2024-03-01",
///   "expected_end_date": "2025-06-30",
///   "budget_cents": 120000000
/// }
/// ```
#[post("/obras", data = "<new_obra>")]
pub async fn create_obra(
    _rate: RateLimited,
    db: DbConn,
    new_obra: LoggedJson<CreateObraRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<Obra>>> {
    let request = new_obra.into_inner();
    let org_id = resolve_target_org(&auth_user, request.org_id)?;
    ensure_writable(&auth_user, org_id, "Obra")?;

    let name = invalid(required_text("name", &request.name))?;
    let client_document = invalid(optional_document("client_document", request.client_document))?;
    check_dates(request.start_date, request.expected_end_date)?;
    check_budget(request.budget_cents)?;

    let obra = NewObra {
        org_id,
        name,
        address: optional_text(request.address),
        client_name: optional_text(request.client_name),
        client_document,
        status: request.status.unwrap_or(ObraStatus::Planejada).as_str().to_string(),
        start_date: request.start_date,
        expected_end_date: request.expected_end_date,
        budget_cents: request.budget_cents,
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        live_org(conn, obra.org_id)?;
        let obra = insert_obra(conn, obra, Some(acting)).map_err(|e| storage_error("Creating obra", e))?;
        info!("Obra {} created in org {} by user {}", obra.id, obra.org_id, acting);
        Ok(status::Created::new(format!("/api/obras/{}", obra.id)).body(Json(obra)))
    })
    .await
}

/// List Obras endpoint.
///
/// - **URL:** `/api/obras?status=em_andamento&limit=100&offset=0`
/// - **Method:** `GET`
#[get("/obras?<status>&<limit>&<offset>")]
pub async fn list_obras_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    status: Option<&str>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Obra>>> {
    let status = invalid(parse_optional::<ObraStatus>(status))?;
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();

    db.run(move |conn| {
        list_obras(conn, scope, status.as_ref().map(ObraStatus::as_str), page)
            .map(Json)
            .map_err(|e| storage_error("Listing obras", e))
    })
    .await
}

#[get("/obras/<obra_id>")]
pub async fn get_obra_endpoint(
    _rate: RateLimited,
    db: DbConn,
    obra_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Obra>>> {
    db.run(move |conn| -> ApiResult<_> {
        let obra = get_obra_with_timestamps(conn, obra_id)
            .map_err(|e| storage_error("Loading obra", e))?
            .ok_or_else(|| not_found("Obra"))?;
        ensure_readable(&auth_user, obra.entity.org_id, "Obra")?;
        Ok(Json(obra))
    })
    .await
}

/// Update Obra endpoint.
///
/// The date order is checked against the merged values, so sending only
/// `expected_end_date` is compared with the stored `start_date`.
#[put("/obras/<obra_id>", data = "<changes>")]
pub async fn update_obra_endpoint(
    _rate: RateLimited,
    db: DbConn,
    obra_id: i32,
    changes: LoggedJson<UpdateObraRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Obra>> {
    let request = changes.into_inner();
    let changes = ObraChanges {
        name: invalid(changed_text("name", request.name))?,
        address: optional_text(request.address),
        client_name: optional_text(request.client_name),
        client_document: invalid(optional_document("client_document", request.client_document))?,
        status: request.status.map(|s| s.as_str().to_string()),
        start_date: request.start_date,
        expected_end_date: request.expected_end_date,
        budget_cents: request.budget_cents,
    };
    check_budget(changes.budget_cents)?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let current = visible_obra(conn, &auth_user, obra_id)?;
        ensure_writable(&auth_user, current.org_id, "Obra")?;
        check_dates(
            changes.start_date.or(current.start_date),
            changes.expected_end_date.or(current.expected_end_date),
        )?;

        update_obra(conn, obra_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating obra", e))
    })
    .await
}

/// Delete Obra endpoint. Soft-deletes; the obra can be restored with the
/// admin CLI.
#[delete("/obras/<obra_id>")]
pub async fn delete_obra(
    _rate: RateLimited,
    db: DbConn,
    obra_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let obra = visible_obra(conn, &auth_user, obra_id)?;
        ensure_writable(&auth_user, obra.org_id, "Obra")?;

        match soft_delete_obra(conn, obra_id, Some(acting)) {
            Ok(0) => Err(not_found("Obra")),
            Ok(_) => {
                info!("Obra {} deleted by user {}", obra_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting obra", e)),
        }
    })
    .await
}

/// Counts of live equipes, equipamentos, RDOs, open checklist items and
/// the expense total of an obra.
#[get("/obras/<obra_id>/summary")]
pub async fn get_obra_summary(
    _rate: RateLimited,
    db: DbConn,
    obra_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<ObraSummary>> {
    db.run(move |conn| -> ApiResult<_> {
        visible_obra(conn, &auth_user, obra_id)?;
        obra_summary(conn, obra_id)
            .map(Json)
            .map_err(|e| storage_error("Summarizing obra", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_obra,
        list_obras_endpoint,
        get_obra_endpoint,
        update_obra_endpoint,
        delete_obra,
        get_obra_summary
    ]
}
