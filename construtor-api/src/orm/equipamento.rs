use chrono::Utc;
use diesel::prelude::*;

use crate::models::{Equipamento, EquipamentoChanges, NewEquipamento, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

pub fn insert_equipamento(
    conn: &mut SqliteConnection,
    new_equipamento: NewEquipamento,
    acting_user_id: Option<i32>,
) -> Result<Equipamento, diesel::result::Error> {
    use crate::schema::equipamentos::dsl::*;

    diesel::insert_into(equipamentos)
        .values(&new_equipamento)
        .execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let equipamento = equipamentos
        .filter(id.eq(last_id))
        .select(Equipamento::as_select())
        .first(conn)?;

    stamp_user(conn, "equipamentos", equipamento.id, "create", acting_user_id);
    Ok(equipamento)
}

pub fn get_equipamento(
    conn: &mut SqliteConnection,
    equipamento_id: i32,
) -> Result<Option<Equipamento>, diesel::result::Error> {
    use crate::schema::equipamentos::dsl::*;
    equipamentos
        .filter(id.eq(equipamento_id))
        .filter(deleted_at.is_null())
        .select(Equipamento::as_select())
        .first(conn)
        .optional()
}

pub fn get_equipamento_with_timestamps(
    conn: &mut SqliteConnection,
    equipamento_id: i32,
) -> Result<Option<Timestamped<Equipamento>>, diesel::result::Error> {
    match get_equipamento(conn, equipamento_id)? {
        Some(equipamento) => {
            with_timestamps(conn, "equipamentos", equipamento_id, equipamento).map(Some)
        }
        None => Ok(None),
    }
}

/// Lists live equipamentos ordered by id, filtered by obra and/or status.
pub fn list_equipamentos(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    obra_filter: Option<i32>,
    status_filter: Option<&str>,
    page: Page,
) -> Result<Vec<Equipamento>, diesel::result::Error> {
    use crate::schema::equipamentos::dsl::*;

    let mut query = equipamentos.filter(deleted_at.is_null()).into_boxed();
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
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(Equipamento::as_select())
        .load(conn)
}

pub fn update_equipamento(
    conn: &mut SqliteConnection,
    equipamento_id: i32,
    changes: EquipamentoChanges,
    acting_user_id: Option<i32>,
) -> Result<Equipamento, diesel::result::Error> {
    use crate::schema::equipamentos::dsl::*;

    let current =
        get_equipamento(conn, equipamento_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(equipamentos.filter(id.eq(equipamento_id)))
        .set((
            obra_id.eq(changes.obra_id.or(current.obra_id)),
            name.eq(changes.name.unwrap_or(current.name)),
            category.eq(changes.category.or(current.category)),
            ownership.eq(changes.ownership.unwrap_or(current.ownership)),
            status.eq(changes.status.unwrap_or(current.status)),
            daily_rate_cents.eq(changes.daily_rate_cents.or(current.daily_rate_cents)),
        ))
        .execute(conn)?;

    let equipamento = equipamentos
        .filter(id.eq(equipamento_id))
        .select(Equipamento::as_select())
        .first(conn)?;
    stamp_user(conn, "equipamentos", equipamento_id, "update", acting_user_id);
    Ok(equipamento)
}

pub fn soft_delete_equipamento(
    conn: &mut SqliteConnection,
    equipamento_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::equipamentos::dsl::*;

    let result = diesel::update(
        equipamentos
            .filter(id.eq(equipamento_id))
            .filter(deleted_at.is_null()),
    )
    .set(deleted_at.eq(Some(Utc::now().naive_utc())))
    .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "equipamentos", equipamento_id, "delete", acting_user_id);
    }
    Ok(result)
}
