//! API endpoints for equipes (work crews).

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
use crate::models::{Equipe, EquipeChanges, NewEquipe, Timestamped};
use crate::normalize::{changed_text, optional_text, required_text};
use crate::orm::equipe::{
    get_equipe, get_equipe_with_timestamps, insert_equipe, list_equipes, soft_delete_equipe,
    update_equipe,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::AuthenticatedUser;

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateEquipeRequest {
    #[serde(alias = "orgId")]
    pub org_id: Option<i32>,
    /// Obra the crew is allocated to; the crew takes the obra's org.
    #[serde(alias = "obraId")]
    pub obra_id: Option<i32>,
    #[serde(alias = "nome")]
    pub name: String,
    #[serde(alias = "lider", alias = "leaderName")]
    pub leader_name: Option<String>,
    #[serde(alias = "especialidade")]
    pub specialty: Option<String>,
    #[serde(alias = "quantidade_membros", alias = "memberCount")]
    pub member_count: Option<i32>,
}

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateEquipeRequest {
    #[serde(alias = "obraId")]
    pub obra_id: Option<i32>,
    #[serde(alias = "nome")]
    pub name: Option<String>,
    #[serde(alias = "lider", alias = "leaderName")]
    pub leader_name: Option<String>,
    #[serde(alias = "especialidade")]
    pub specialty: Option<String>,
    #[serde(alias = "quantidade_membros", alias = "memberCount")]
    pub member_count: Option<i32>,
}

fn check_member_count(count: Option<i32>) -> ApiResult<()> {
    match count {
        Some(n) if n < 0 => Err(bad_request("member_count cannot be negative")),
        _ => Ok(()),
    }
}

#[post("/equipes", data = "<new_equipe>")]
pub async fn create_equipe(
    _rate: RateLimited,
    db: DbConn,
    new_equipe: LoggedJson<CreateEquipeRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<status::Created<Json<Equipe>>> {
    let request = new_equipe.into_inner();
    let name = invalid(required_text("name", &request.name))?;
    check_member_count(request.member_count)?;
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
        ensure_writable(&auth_user, org_id, "Equipe")?;

        let equipe = insert_equipe(
            conn,
            NewEquipe {
                org_id,
                obra_id: request.obra_id,
                name,
                leader_name: optional_text(request.leader_name),
                specialty: optional_text(request.specialty),
                member_count: request.member_count.unwrap_or(0),
            },
            Some(acting),
        )
        .map_err(|e| storage_error("Creating equipe", e))?;

        info!("Equipe {} created in org {} by user {}", equipe.id, org_id, acting);
        Ok(status::Created::new(format!("/api/equipes/{}", equipe.id)).body(Json(equipe)))
    })
    .await
}

/// List Equipes endpoint.
///
/// - **URL:** `/api/equipes?obra_id=3`
#[get("/equipes?<obra_id>&<limit>&<offset>")]
pub async fn list_equipes_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    obra_id: Option<i32>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Equipe>>> {
    let page = Page::new(limit, offset);
    let scope = auth_user.org_scope();
    db.run(move |conn| {
        list_equipes(conn, scope, obra_id, page)
            .map(Json)
            .map_err(|e| storage_error("Listing equipes", e))
    })
    .await
}

#[get("/equipes/<equipe_id>")]
pub async fn get_equipe_endpoint(
    _rate: RateLimited,
    db: DbConn,
    equipe_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Equipe>>> {
    db.run(move |conn| -> ApiResult<_> {
        let equipe = get_equipe_with_timestamps(conn, equipe_id)
            .map_err(|e| storage_error("Loading equipe", e))?
            .ok_or_else(|| not_found("Equipe"))?;
        ensure_readable(&auth_user, equipe.entity.org_id, "Equipe")?;
        Ok(Json(equipe))
    })
    .await
}

/// Update Equipe endpoint. Moving the crew to another obra requires the
/// obra to belong to the crew's org.
#[put("/equipes/<equipe_id>", data = "<changes>")]
pub async fn update_equipe_endpoint(
    _rate: RateLimited,
    db: DbConn,
    equipe_id: i32,
    changes: LoggedJson<UpdateEquipeRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Equipe>> {
    let request = changes.into_inner();
    check_member_count(request.member_count)?;
    let changes = EquipeChanges {
        obra_id: request.obra_id,
        name: invalid(changed_text("name", request.name))?,
        leader_name: optional_text(request.leader_name),
        specialty: optional_text(request.specialty),
        member_count: request.member_count,
    };
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let current = get_equipe(conn, equipe_id)
            .map_err(|e| storage_error("Loading equipe", e))?
            .ok_or_else(|| not_found("Equipe"))?;
        ensure_writable(&auth_user, current.org_id, "Equipe")?;
        if let Some(obra_id) = changes.obra_id {
            let obra = visible_obra(conn, &auth_user, obra_id)?;
            ensure_same_org(Some(current.org_id), obra.org_id, "Obra")?;
        }

        update_equipe(conn, equipe_id, changes, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating equipe", e))
    })
    .await
}

#[delete("/equipes/<equipe_id>")]
pub async fn delete_equipe(
    _rate: RateLimited,
    db: DbConn,
    equipe_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Status> {
    let acting = auth_user.user.id;
    db.run(move |conn| -> ApiResult<_> {
        let equipe = get_equipe(conn, equipe_id)
            .map_err(|e| storage_error("Loading equipe", e))?
            .ok_or_else(|| not_found("Equipe"))?;
        ensure_writable(&auth_user, equipe.org_id, "Equipe")?;

        match soft_delete_equipe(conn, equipe_id, Some(acting)) {
            Ok(0) => Err(not_found("Equipe")),
            Ok(_) => {
                info!("Equipe {} deleted by user {}", equipe_id, acting);
                Ok(Status::NoContent)
            }
            Err(e) => Err(storage_error("Deleting equipe", e)),
        }
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_equipe,
        list_equipes_endpoint,
        get_equipe_endpoint,
        update_equipe_endpoint,
        delete_equipe
    ]
}
