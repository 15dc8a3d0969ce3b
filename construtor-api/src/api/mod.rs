//! HTTP endpoints, all mounted under `/api`.
//!
//! Tenant rows are visible only inside their org (platform admins see every
//! org). A row the caller cannot read answers 404, never 403, so other
//! tenants' ids cannot be discovered. 403 is reserved for callers who can see a
//! row but whose role does not allow the change.

pub mod activity;
pub mod attachment;
pub mod checklist;
pub mod equipamento;
pub mod equipe;
pub mod error;
pub mod expense;
pub mod login;
pub mod logout;
pub mod obra;
pub mod org;
pub mod rdo;
pub mod rdo_item;
pub mod role;
pub mod status;
pub mod user;
pub mod validation;

use diesel::SqliteConnection;
use rocket::Route;

use crate::models::Obra;
use crate::orm::obra::get_obra;
use crate::orm::org::get_org_by_id;
use crate::session_guards::AuthenticatedUser;
use error::{ApiResult, bad_request, forbidden, not_found, storage_error};

pub fn routes() -> Vec<Route> {
    let mut routes = Vec::new();
    routes.extend(activity::routes());
    routes.extend(attachment::routes());
    routes.extend(checklist::routes());
    routes.extend(equipamento::routes());
    routes.extend(equipe::routes());
    routes.extend(expense::routes());
    routes.extend(login::routes());
    routes.extend(logout::routes());
    routes.extend(obra::routes());
    routes.extend(org::routes());
    routes.extend(rdo::routes());
    routes.extend(rdo_item::routes());
    routes.extend(role::routes());
    routes.extend(status::routes());
    routes.extend(user::routes());
    routes.extend(validation::routes());
    routes
}

/// 404 unless the caller may read rows of `org_id`.
pub fn ensure_readable(auth_user: &AuthenticatedUser, org_id: i32, what: &str) -> ApiResult<()> {
    if auth_user.can_read_org(org_id) {
        Ok(())
    } else {
        Err(not_found(what))
    }
}

/// 404 for invisible rows, 403 for visible rows the caller may not change.
pub fn ensure_writable(auth_user: &AuthenticatedUser, org_id: i32, what: &str) -> ApiResult<()> {
    ensure_readable(auth_user, org_id, what)?;
    if auth_user.can_write_org(org_id) {
        Ok(())
    } else {
        Err(forbidden(format!(
            "Forbidden: insufficient permissions to modify {}",
            what.to_lowercase()
        )))
    }
}

/// Like [`ensure_writable`] for admin-only actions.
pub fn ensure_manageable(auth_user: &AuthenticatedUser, org_id: i32, what: &str) -> ApiResult<()> {
    ensure_readable(auth_user, org_id, what)?;
    if auth_user.can_manage_org(org_id) {
        Ok(())
    } else {
        Err(forbidden(format!(
            "Forbidden: only administrators can change {}",
            what.to_lowercase()
        )))
    }
}

/// Picks the org for a new top-level record: the caller's own org unless a
/// platform admin names another one.
pub fn resolve_target_org(auth_user: &AuthenticatedUser, requested: Option<i32>) -> ApiResult<i32> {
    match requested {
        None => Ok(auth_user.org_id()),
        Some(org_id) if org_id == auth_user.org_id() || auth_user.is_platform_admin() => Ok(org_id),
        Some(_) => Err(forbidden(
            "Forbidden: cannot create records for another organization",
        )),
    }
}

/// Passes through the id of a live org; a deleted or unknown org answers 404.
pub fn live_org(conn: &mut SqliteConnection, org_id: i32) -> ApiResult<i32> {
    match get_org_by_id(conn, org_id).map_err(|e| storage_error("Loading org", e))? {
        Some(org) => Ok(org.id),
        None => Err(not_found("Org")),
    }
}

/// Rejects a requested org that disagrees with the org of the parent record.
pub fn ensure_same_org(requested: Option<i32>, parent_org_id: i32, parent: &str) -> ApiResult<()> {
    match requested {
        Some(org_id) if org_id != parent_org_id => Err(bad_request(format!(
            "org_id {} does not match the organization of the {}",
            org_id,
            parent.to_lowercase()
        ))),
        _ => Ok(()),
    }
}

/// Loads a live obra the caller can see. Missing, deleted and foreign
/// obras all answer 404.
pub fn visible_obra(
    conn: &mut SqliteConnection,
    auth_user: &AuthenticatedUser,
    obra_id: i32,
) -> ApiResult<Obra> {
    let obra = get_obra(conn, obra_id)
        .map_err(|e| storage_error("Loading obra", e))?
        .ok_or_else(|| not_found("Obra"))?;
    ensure_readable(auth_user, obra.org_id, "Obra")?;
    Ok(obra)
}

/// Turns a normalization failure message into a 400.
pub fn invalid<T>(result: Result<T, String>) -> ApiResult<T> {
    result.map_err(bad_request)
}
