//! Daily reports (RDOs) and their review workflow.

use chrono::Utc;
use diesel::prelude::*;

use crate::models::{NewRdo, Rdo, RdoChanges, RdoStatus, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

pub fn insert_rdo(
    conn: &mut SqliteConnection,
    new_rdo: NewRdo,
    acting_user_id: Option<i32>,
) -> Result<Rdo, diesel::result::Error> {
    use crate::schema::rdos::dsl::*;

    diesel::insert_into(rdos).values(&new_rdo).execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let rdo = rdos.filter(id.eq(last_id)).select(Rdo::as_select()).first(conn)?;

    stamp_user(conn, "rdos", rdo.id, "create", acting_user_id);
    Ok(rdo)
}

pub fn get_rdo(conn: &mut SqliteConnection, rdo_id: i32) -> Result<Option<Rdo>, diesel::result::Error> {
    use crate::schema::rdos::dsl::*;
    rdos.filter(id.eq(rdo_id))
        .filter(deleted_at.is_null())
        .select(Rdo::as_select())
        .first(conn)
        .optional()
}

pub fn get_rdo_with_timestamps(
    conn: &mut SqliteConnection,
    rdo_id: i32,
) -> Result<Option<Timestamped<Rdo>>, diesel::result::Error> {
    match get_rdo(conn, rdo_id)? {
        Some(rdo) => with_timestamps(conn, "rdos", rdo_id, rdo).map(Some),
        None => Ok(None),
    }
}

/// Lists live RDOs, newest report date first.
pub fn list_rdos(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    obra_filter: Option<i32>,
    status_filter: Option<&str>,
    page: Page,
) -> Result<Vec<Rdo>, diesel::result::Error> {
    use crate::schema::rdos::dsl::*;

    let mut query = rdos.filter(deleted_at.is_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    if let Some(wanted) = obra_filter {
        query = query.filter(obra_id.eq(wanted));
    }
    if let Some(wanted) = status_filter {
        query = query.filter(status.eq(wanted.to_string()));
    }

    query
        .order((report_date.desc(), id.desc()))
        .limit(page.limit)
        .offset(page.offset)
        .select(Rdo::as_select())
        .load(conn)
}

/// Updates the content fields of a live RDO. The status is changed only
/// through [`update_rdo_status`].
pub fn update_rdo(
    conn: &mut SqliteConnection,
    rdo_id: i32,
    changes: RdoChanges,
    acting_user_id: Option<i32>,
) -> Result<Rdo, diesel::result::Error> {
    use crate::schema::rdos::dsl::*;

    let current = get_rdo(conn, rdo_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(rdos.filter(id.eq(rdo_id)))
        .set((
            report_date.eq(changes.report_date.unwrap_or(current.report_date)),
            weather.eq(changes.weather.or(current.weather)),
            notes.eq(changes.notes.or(current.notes)),
        ))
        .execute(conn)?;

    let rdo = rdos.filter(id.eq(rdo_id)).select(Rdo::as_select()).first(conn)?;
    stamp_user(conn, "rdos", rdo_id, "update", acting_user_id);
    Ok(rdo)
}

/// Writes a new workflow status. Callers check the transition first with
/// [`RdoStatus::can_transition_to`].
pub fn update_rdo_status(
    conn: &mut SqliteConnection,
    rdo_id: i32,
    next: RdoStatus,
    acting_user_id: Option<i32>,
) -> Result<Rdo, diesel::result::Error> {
    use crate::schema::rdos::dsl::*;

    let changed = diesel::update(rdos.filter(id.eq(rdo_id)).filter(deleted_at.is_null()))
        .set(status.eq(next.as_str()))
        .execute(conn)?;
    if changed == 0 {
        return Err(diesel::result::Error::NotFound);
    }

    let rdo = rdos.filter(id.eq(rdo_id)).select(Rdo::as_select()).first(conn)?;
    stamp_user(conn, "rdos", rdo_id, "update", acting_user_id);
    Ok(rdo)
}

/// Soft-deletes an RDO together with its live items.
pub fn soft_delete_rdo(
    conn: &mut SqliteConnection,
    rdo_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::{rdo_itens, rdos};

    let now = Utc::now().naive_utc();
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let item_ids = rdo_itens::table
            .filter(rdo_itens::rdo_id.eq(rdo_id))
            .filter(rdo_itens::deleted_at.is_null())
            .select(rdo_itens::id)
            .load::<i32>(conn)?;

        let result = diesel::update(
            rdos::table
                .filter(rdos::id.eq(rdo_id))
                .filter(rdos::deleted_at.is_null()),
        )
        .set(rdos::deleted_at.eq(Some(now)))
        .execute(conn)?;

        if result == 0 {
            return Ok(0);
        }

        diesel::update(rdo_itens::table.filter(rdo_itens::id.eq_any(item_ids.clone())))
            .set(rdo_itens::deleted_at.eq(Some(now)))
            .execute(conn)?;

        stamp_user(conn, "rdos", rdo_id, "delete", acting_user_id);
        for item_id in item_ids {
            stamp_user(conn, "rdo_itens", item_id, "delete", acting_user_id);
        }
        Ok(result)
    })
}
