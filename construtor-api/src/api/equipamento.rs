//! API endpoints for equipamentos (owned or rented equipment).

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, bad_request, not_found, storage_error};
use crate::api::{
    ensure_readable, ensure_same_org, ensure_writable, invalid, live_org, resolve_target_org,
    visible_obra,
};
use crate::logged_json::LoggedJson;
use crate::models::{
    Equipamento, EquipamentoChanges, EquipamentoStatus, NewEquipamento, Ownership, Timestamped,
};
use crate::normalize::{changed_text, optional_text, parse_optional, required_text};
use crate::orm::equipamento::{
    get_equipamento, get_equipamento_with_timestamps, insert_equipamento, list_equipamentos,
    soft_delete_equipamento, update_equipamento,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateEquipamentoRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    #[serde(alias = "obraId")]
    pub obra_id: Option<i32>,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    /// Defaults to `proprio`.
    #[serde(alias = "propriedade")]
    pub ownership: Option<Ownership>,
    /// Defaults to `disponivel`.
    pub status: Option<EquipamentoStatus>,
    #[serde(alias = "valor_diaria_centavos", alias = "dailyRateCents")]
    pub daily_rate_cents: Option<i64>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateEquipamentoRequest {
    #[serde(alias = "obraId")]
    pub obra_id: Option<i32>,
    #[serde(alias = "nome")]
    pub name: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
    #[serde(alias = "propriedade")]
    pub ownership: Option<Ownership>,
    pub status: Option<EquipamentoStatus>,
    #[serde(alias = "valor_diaria_centavos", alias = "dailyRateCents")]
    pub daily_rate_cents: Option<i64>,
}

fn check_daily_rate(rate: Option<i64>) -> ApiResult<()> {
    match rate {
        Some(cents) if cents < 0 => Err(bad_request("daily_rate_cents cannot be negative")),
        _ => Ok(()),
    }
}

#[post("/equipamentos", data = "<new_equipamento>")]
pub async fn create_equipamento(
    _rate: RateLimited,
    db: DbConn,
    new_equipamento: LoggedJson<CreateEquipamentoRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<Equipamento>>> {
    let request = new_equipamento.into_inner();
    let name = invalid(required_text("name", &request.name))?;
    check_daily_rate(request.daily_rate_cents)?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let org_id = match request.obra_id {
            Some(obra_id) => {
                let obra = visible_obra(conn, &auth_user, obra_id)?;
                ensure_same_org(request.org_id, obra.org_id, "Obra")?;
                obra.org_id
            }
            None => live_org(conn, resolve_target_org(&auth_user, request.org_id)?)?,
        };
        ensure_writable(&auth_user, org_id, "Equipamento")?;

        let equipamento = insert_equipamento(
            conn,
            NewEquipamento {
                org_id,
                obra_id: request.obra_id,
                name,
                category: optional_text(request.category),
                ownership: request.ownership.unwrap_or(Ownership::Proprio).as_str().to_string(),
                status: request
                    .status
                    .unwrap_or(EquipamentoStatus::Disponivel)
                    .as_str()
                    .to_string(),
                daily_rate_cents: request.daily_rate_cents,
            },
            Some(acting),
        )
        .map_err(|e| storage_error("Creating equipamento", e))?;

        info!(
            "Equipamento {} created in org {} by user {}",
            equipamento.id, org_id, acting
        );
        Ok(status::Created::new(format!("/api/equipamentos/{}", equipamento.id)).body(Json(equipamento)))
    })
    .await
}

/// List Equipamentos endpoint.
///
/// - **URL:** `/api/equipamentos?obra_id=3&status=em_uso`
#[get("/equipamentos?<obra_id>&<status>&<limit>&<offset>")]
pub async fn list_equipamentos_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    obra_id: Option<i32>,
    status: Option<&str>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Equipamento>>> {
    let status = invalid(parse_optional::<EquipamentoStatus>(status))?;
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_equipamentos(conn, scope, obra_id, status.as_ref().map(EquipamentoStatus::as_str), page)
            .map(Json)
            .map_err(|e| storage_error("Listing equipamentos", e))
    })
    .await
}

#[get("/equipamentos/<equipamento_id>")]
pub async fn get_equipamento_endpoint(
    _rate: RateLimited,
    db: DbConn,
    equipamento_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Equipamento>>> {
    db.run(move |conn| -> ApiResult<_> {
        let equipamento = get_equipamento_with_timestamps(conn, equipamento_id)
            .map_err(|e| storage_error("Loading equipamento", e))?
            .ok_or_else(|| not_found("Equipamento"))?;
        ensure_readable(&auth_user, equipamento.entity.org_id, "Equipamento")?;
        Ok(Json(equipamento))
    })
    .await
}

#[put("/equipamentos/<equipamento_id>", data = "<changes>")]
pub async fn update_equipamento_endpoint(
    _rate: RateLimited,
    db: DbConn,
    equipamento_id: i32,
    changes: LoggedJson<UpdateEquipamentoRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Equipamento>> {
    let request = changes.into_inner();
    check_daily_rate(request.daily_rate_cents)?;
    let changes = EquipamentoChanges {
        obra_id: request.obra_id,
        name: invalid(changed_text("name", request.name))?,
        category: optional_text(request.category),
        ownership: request.ownership.map(|o| o.as_str().to_string()),
        status: request.status.map(|s| s.as_str().to_string()),
        daily_rate_cents: request.daily_rate_cents,
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let current = get_equipamento(conn, equipamento_id)
            .map_err(|e| storage_error("Loading equipamento", e))?
            .ok_or_else(|| not_found("Equipamento"))?;
        ensure_writable(&auth_user, current.org_id, "Equipamento")?;
        if let Some(obra_id) = changes.obra_id {
            let obra = visible_obra(conn, &auth_user, obra_id)?;
            ensure_same_org(Some(current.org_id), obra.org_id, "Obra")?;
        }

        update_equipamento(conn, equipamento_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating equipamento", e))
    })
    .await
}

#[delete("/equipamentos/<equipamento_id>")]
pub async fn delete_equipamento(
    _rate: RateLimited,
    db: DbConn,
    equipamento_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let equipamento = get_equipamento(conn, equipamento_id)
            .map_err(|e| storage_error("Loading equipamento", e))?
            .ok_or_else(|| not_found("Equipamento"))?;
        ensure_writable(&auth_user, equipamento.org_id, "Equipamento")?;

        match soft_delete_equipamento(conn, equipamento_id, Some(acting)) {
            Ok(0) => Err(not_found("Equipamento")),
            Ok(_) => {
                info!("Equipamento {} deleted by user {}", equipamento_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting equipamento", e)),
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_equipamento,
        list_equipamentos_endpoint,
        get_equipamento_endpoint,
        update_equipamento_endpoint,
        delete_equipamento
    ]
}
