use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::models::{NewObra, Obra, ObraChanges, ObraSummary, RdoStatus, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

/// Creates an obra and stamps the acting user on its `create` activity.
pub fn insert_obra(
    conn: &mut SqliteConnection,
    new_obra: NewObra,
    acting_user_id: Option<i32>,
) -> Result<Obra, diesel::result::Error> {
    use crate::schema::obras::dsl::*;

    diesel::insert_into(obras).values(&new_obra).execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let obra = obras.filter(id.eq(last_id)).select(Obra::as_select()).first(conn)?;

    stamp_user(conn, "obras", obra.id, "create", acting_user_id);
    Ok(obra)
}

/// Gets a live obra.
pub fn get_obra(
    conn: &mut SqliteConnection,
    obra_id: i32,
) -> Result<Option<Obra>, diesel::result::Error> {
    use crate::schema::obras::dsl::*;
    obras
        .filter(id.eq(obra_id))
        .filter(deleted_at.is_null())
        .select(Obra::as_select())
        .first(conn)
        .optional()
}

pub fn get_obra_with_timestamps(
    conn: &mut SqliteConnection,
    obra_id: i32,
) -> Result<Option<Timestamped<Obra>>, diesel::result::Error> {
    match get_obra(conn, obra_id)? {
        Some(obra) => with_timestamps(conn, "obras", obra_id, obra).map(Some),
        None => Ok(None),
    }
}

/// Lists live obras ordered by id. `org_scope` of `None` lists every org.
pub fn list_obras(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    status_filter: Option<&str>,
    page: Page,
) -> Result<Vec<Obra>, diesel::result::Error> {
    use crate::schema::obras::dsl::*;

    let mut query = obras.filter(deleted_at.is_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    if let Some(wanted) = status_filter {
        query = query.filter(status.eq(wanted.to_string()));
    }

    query
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(Obra::as_select())
        .load(conn)
}

/// Lists soft-deleted obras, most recently deleted first.
pub fn list_deleted_obras(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
) -> Result<Vec<Obra>, diesel::result::Error> {
    use crate::schema::obras::dsl::*;

    let mut query = obras.filter(deleted_at.is_not_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    query
        .order(deleted_at.desc())
        .select(Obra::as_select())
        .load(conn)
}

/// Applies `changes` to a live obra. Fails with `NotFound` when the obra is
/// missing or deleted.
pub fn update_obra(
    conn: &mut SqliteConnection,
    obra_id: i32,
    changes: ObraChanges,
    acting_user_id: Option<i32>,
) -> Result<Obra, diesel::result::Error> {
    use crate::schema::obras::dsl::*;

    let current = get_obra(conn, obra_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(obras.filter(id.eq(obra_id)))
        .set((
            name.eq(changes.name.unwrap_or(current.name)),
            address.eq(changes.address.or(current.address)),
            client_name.eq(changes.client_name.or(current.client_name)),
            client_document.eq(changes.client_document.or(current.client_document)),
            status.eq(changes.status.unwrap_or(current.status)),
            start_date.eq(changes.start_date.or(current.start_date)),
            expected_end_date.eq(changes.expected_end_date.or(current.expected_end_date)),
            budget_cents.eq(changes.budget_cents.or(current.budget_cents)),
        ))
        .execute(conn)?;

    let obra = obras.filter(id.eq(obra_id)).select(Obra::as_select()).first(conn)?;
    stamp_user(conn, "obras", obra_id, "update", acting_user_id);
    Ok(obra)
}

pub fn soft_delete_obra(
    conn: &mut SqliteConnection,
    obra_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::obras::dsl::*;

    let result = diesel::update(obras.filter(id.eq(obra_id)).filter(deleted_at.is_null()))
        .set(deleted_at.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "obras", obra_id, "delete", acting_user_id);
    }
    Ok(result)
}

pub fn restore_obra(
    conn: &mut SqliteConnection,
    obra_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::obras::dsl::*;

    let result = diesel::update(obras.filter(id.eq(obra_id)).filter(deleted_at.is_not_null()))
        .set(deleted_at.eq(None::<NaiveDateTime>))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "obras", obra_id, "restore", acting_user_id);
    }
    Ok(result)
}

/// Counts the live records hanging off an obra and totals its expenses.
pub fn obra_summary(
    conn: &mut SqliteConnection,
    target_obra_id: i32,
) -> Result<ObraSummary, diesel::result::Error> {
    use crate::schema::{checklist_itens, checklists, equipamentos, equipes, expenses, rdos};

    let equipe_count = equipes::table
        .filter(equipes::obra_id.eq(target_obra_id))
        .filter(equipes::deleted_at.is_null())
        .count()
        .get_result::<i64>(conn)?;

    let equipamento_count = equipamentos::table
        .filter(equipamentos::obra_id.eq(target_obra_id))
        .filter(equipamentos::deleted_at.is_null())
        .count()
        .get_result::<i64>(conn)?;

    let rdo_count = rdos::table
        .filter(rdos::obra_id.eq(target_obra_id))
        .filter(rdos::deleted_at.is_null())
        .count()
        .get_result::<i64>(conn)?;

    let approved_rdo_count = rdos::table
        .filter(rdos::obra_id.eq(target_obra_id))
        .filter(rdos::deleted_at.is_null())
        .filter(rdos::status.eq(RdoStatus::Aprovado.as_str()))
        .count()
        .get_result::<i64>(conn)?;

    let open_checklist_items = checklist_itens::table
        .inner_join(checklists::table)
        .filter(checklists::obra_id.eq(target_obra_id))
        .filter(checklists::deleted_at.is_null())
        .filter(checklist_itens::done.eq(false))
        .count()
        .get_result::<i64>(conn)?;

    let amounts = expenses::table
        .filter(expenses::obra_id.eq(target_obra_id))
        .filter(expenses::deleted_at.is_null())
        .select(expenses::amount_cents)
        .load::<i64>(conn)?;

    Ok(ObraSummary {
        obra_id: target_obra_id,
        equipe_count,
        equipamento_count,
        rdo_count,
        approved_rdo_count,
        open_checklist_items,
        expense_total_cents: amounts.iter().sum(),
    })
}
