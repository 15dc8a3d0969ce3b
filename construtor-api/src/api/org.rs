//! API endpoints for organization (tenant) management.
//!
//! # Authorization Rules
//! - Only platform admins create, list every org, or delete orgs
//! - Org admins can read and rename their own org
//! - Everyone else can read their own org

use rocket::Route;
use rocket::http::Status;
use rocket::response::status;
use rocket::serde::json::Json;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::api::error::{ApiResult, conflict, not_found, storage_error};
use crate::api::{ensure_manageable, ensure_readable, invalid};
use crate::logged_json::LoggedJson;
use crate::models::{EntityActivity, Org, Timestamped};
use crate::normalize::{changed_text, optional_cnpj, required_text};
use crate::orm::entity_activity::get_org_activity;
use crate::orm::org::{
    get_org_by_id, get_org_with_timestamps, insert_org, list_orgs, soft_delete_org, update_org,
};
use crate::orm::{DbConn, Page};
use crate::rate_limit::RateLimited;
use crate::session_guards::{AdminUser, AuthenticatedUser, PlatformAdminUser};

#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct CreateOrgRequest {
    #[serde(alias = "nome")]
    pub name: String,
    pub cnpj: Option<String>,
}

/// All fields optional; absent fields keep their value.
#[derive(Deserialize, Serialize, TS)]
#[ts(export)]
pub struct UpdateOrgRequest {
    #[serde(alias = "nome")]
    pub name: Option<String>,
    pub cnpj: Option<String>,
}

/// Create Org endpoint.
///
/// - **URL:** `/api/orgs`
/// - **Method:** `POST`
/// - **Authorization:** platform admin
///
/// ```json
/// { "name": "Construtora Gama", "cnpj": "11.222.333/0001-81" }
/// ```
///
/// The CNPJ is validated and stored as digits. A live org with the same
/// name (ignoring case) or CNPJ answers 409.
#[post("/orgs", data = "<new_org>")]
pub async fn create_org(
    _rate: RateLimited,
    db: DbConn,
    new_org: LoggedJson<CreateOrgRequest>,
    auth_user: PlatformAdminUser,
) -> ApiResult<status::Created<Json<Org>>> {
    let CreateOrgRequest { name, cnpj } = new_org.into_inner();
    let name = invalid(required_text("name", &name))?;
    let cnpj = invalid(optional_cnpj(cnpj))?;
    let acting = auth_user.user.id;

    db.run(move |conn| -> ApiResult<_> {
        let org = insert_org(conn, name, cnpj, Some(acting))
            .map_err(|e| storage_error("Creating org", e))?;
        info!("Org {} created by user {}", org.id, acting);
        Ok(status::Created::new(format!("/api/orgs/{}", org.id)).body(Json(org)))
    })
    .await
}

/// List Orgs endpoint.
///
/// Platform admins get every live org; other users get a one-element list
/// with their own org.
#[get("/orgs?<limit>&<offset>")]
pub async fn list_orgs_endpoint(
    _rate: RateLimited,
    db: DbConn,
    auth_user: AuthenticatedUser,
    limit: Option<i64>,
    offset: Option<i64>,
) -> ApiResult<Json<Vec<Org>>> {
    let page = Page::new(limit, offset);
    db.run(move |conn| {
        let orgs = if auth_user.is_platform_admin() {
            list_orgs(conn, page)
        } else {
            get_org_by_id(conn, auth_user.org_id()).map(|org| org.into_iter().collect())
        };
        orgs.map(Json).map_err(|e| storage_error("Listing orgs", e))
    })
    .await
}

#[get("/orgs/<org_id>")]
pub async fn get_org(
    _rate: RateLimited,
    db: DbConn,
    org_id: i32,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Timestamped<Org>>> {
    ensure_readable(&auth_user, org_id, "Org")?;
    db.run(move |conn| -> ApiResult<_> {
        get_org_with_timestamps(conn, org_id)
            .map_err(|e| storage_error("Loading org", e))?
            .map(Json)
            .ok_or_else(|| not_found("Org"))
    })
    .await
}

/// Update Org endpoint.
///
/// - **URL:** `/api/orgs/<org_id>`
/// - **Method:** `PUT`
/// - **Authorization:** admin of the org, or platform admin
#[put("/orgs/<org_id>", data = "<changes>")]
pub async fn update_org_endpoint(
    _rate: RateLimited,
    db: DbConn,
    org_id: i32,
    changes: LoggedJson<UpdateOrgRequest>,
    auth_user: AuthenticatedUser,
) -> ApiResult<Json<Org>> {
    ensure_manageable(&auth_user, org_id, "Org")?;
    let UpdateOrgRequest { name, cnpj } = changes.into_inner();
    let name = invalid(changed_text("name", name))?;
    let cnpj = invalid(optional_cnpj(cnpj))?;
    let acting = auth_user.user.id;

    db.run(move |conn| {
        update_org(conn, org_id, name, cnpj, Some(acting))
            .map(Json)
            .map_err(|e| storage_error("Updating org", e))
    })
    .await
}

/// Delete Org endpoint.
///
/// Soft-deletes the org. Platform admins cannot delete their own org.
#[delete("/orgs/<org_id>")]
pub async fn delete_org(
    _rate: RateLimited,
    db: DbConn,
    org_id: i32,
    auth_user: PlatformAdminUser,
) -> ApiResult<Status> {
    if org_id == auth_user.org_id() {
        return Err(conflict("Cannot delete your own organization"));
    }
    let acting = auth_user.user.id;

    db.run(move |conn| match soft_delete_org(conn, org_id, Some(acting)) {
        Ok(0) => Err(not_found("Org")),
        Ok(_) => {
            info!("Org {} deleted by user {}", org_id, acting);
            Ok(Status::NoContent)
        }
        Err(e) => Err(storage_error("Deleting org", e)),
    })
    .await
}

/// Recent activity across the whole org, newest first.
///
/// - **URL:** `/api/orgs/<org_id>/activity?limit=50`
/// - **Authorization:** admin of the org, or platform admin
#[get("/orgs/<org_id>/activity?<limit>")]
pub async fn org_activity(
    _rate: RateLimited,
    db: DbConn,
    org_id: i32,
    limit: Option<i64>,
    auth_user: AdminUser,
) -> ApiResult<Json<Vec<EntityActivity>>> {
    ensure_manageable(&auth_user, org_id, "Org")?;
    let page = Page::new(limit, None);
    db.run(move |conn| {
        get_org_activity(conn, org_id, page.limit)
            .map(Json)
            .map_err(|e| storage_error("Loading org activity", e))
    })
    .await
}

pub fn routes() -> Vec<Route> {
    routes![
        create_org,
        list_orgs_endpoint,
        get_org,
        update_org_endpoint,
        delete_org,
        org_activity
    ]
}
