use chrono::Utc;
use diesel::prelude::*;

use crate::models::{Equipe, EquipeChanges, NewEquipe, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

pub fn insert_equipe(
    conn: &mut SqliteConnection,
    new_equipe: NewEquipe,
    acting_user_id: Option<i32>,
) -> Result<Equipe, diesel::result::Error> {
    use crate::schema::equipes::dsl::*;

    diesel::insert_into(equipes).values(&new_equipe).execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let equipe = equipes.filter(id.eq(last_id)).select(Equipe::as_select()).first(conn)?;

    stamp_user(conn, "equipes", equipe.id, "create", acting_user_id);
    Ok(equipe)
}

/// Gets a live equipe.
pub fn get_equipe(
    conn: &mut SqliteConnection,
    equipe_id: i32,
) -> Result<Option<Equipe>, diesel::result::Error> {
    use crate::schema::equipes::dsl::*;
    equipes
        .filter(id.eq(equipe_id))
        .filter(deleted_at.is_null())
        .select(Equipe::as_select())
        .first(conn)
        .optional()
}

pub fn get_equipe_with_timestamps(
    conn: &mut SqliteConnection,
    equipe_id: i32,
) -> Result<Option<Timestamped<Equipe>>, diesel::result::Error> {
    match get_equipe(conn, equipe_id)? {
        Some(equipe) => with_timestamps(conn, "equipes", equipe_id, equipe).map(Some),
        None => Ok(None),
    }
}

/// Lists live equipes ordered by id, optionally only those allocated to one
/// obra.
pub fn list_equipes(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    obra_filter: Option<i32>,
    page: Page,
) -> Result<Vec<Equipe>, diesel::result::Error> {
    use crate::schema::equipes::dsl::*;

    let mut query = equipes.filter(deleted_at.is_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    if let Some(wanted) = obra_filter {
        query = query.filter(obra_id.eq(wanted));
    }

    query
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(Equipe::as_select())
        .load(conn)
}

pub fn update_equipe(
    conn: &mut SqliteConnection,
    equipe_id: i32,
    changes: EquipeChanges,
    acting_user_id: Option<i32>,
) -> Result<Equipe, diesel::result::Error> {
    use crate::schema::equipes::dsl::*;

    let current = get_equipe(conn, equipe_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(equipes.filter(id.eq(equipe_id)))
        .set((
            obra_id.eq(changes.obra_id.or(current.obra_id)),
            name.eq(changes.name.unwrap_or(current.name)),
            leader_name.eq(changes.leader_name.or(current.leader_name)),
            specialty.eq(changes.specialty.or(current.specialty)),
            member_count.eq(changes.member_count.unwrap_or(current.member_count)),
        ))
        .execute(conn)?;

    let equipe = equipes.filter(id.eq(equipe_id)).select(Equipe::as_select()).first(conn)?;
    stamp_user(conn, "equipes", equipe_id, "update", acting_user_id);
    Ok(equipe)
}

pub fn soft_delete_equipe(
    conn: &mut SqliteConnection,
    equipe_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::equipes::dsl::*;

    let result = diesel::update(equipes.filter(id.eq(equipe_id)).filter(deleted_at.is_null()))
        .set(deleted_at.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "equipes", equipe_id, "delete", acting_user_id);
    }
    Ok(result)
}
