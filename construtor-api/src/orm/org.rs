use chrono::Utc;
use diesel::prelude::*;

use crate::models::{NewOrg, Org, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

/// Creates an org (timestamps handled automatically by database triggers).
pub fn insert_org(
    conn: &mut SqliteConnection,
    org_name: String,
    org_cnpj: Option<String>,
    acting_user_id: Option<i32>,
) -> Result<Org, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;

    let new_org = NewOrg {
        name: org_name,
        cnpj: org_cnpj,
    };
    diesel::insert_into(orgs).values(&new_org).execute(conn)?;

    let last_id = crate::orm::last_insert_id(conn)?;
    let org = orgs.filter(id.eq(last_id)).select(Org::as_select()).first(conn)?;

    stamp_user(conn, "orgs", org.id, "create", acting_user_id);
    Ok(org)
}

/// Gets a live org by id.
pub fn get_org_by_id(
    conn: &mut SqliteConnection,
    org_id: i32,
) -> Result<Option<Org>, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;
    orgs.filter(id.eq(org_id))
        .filter(deleted_at.is_null())
        .select(Org::as_select())
        .first(conn)
        .optional()
}

/// Gets an org by id whether or not it was deleted (admin tooling).
pub fn get_org_including_deleted(
    conn: &mut SqliteConnection,
    org_id: i32,
) -> Result<Option<Org>, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;
    orgs.filter(id.eq(org_id)).select(Org::as_select()).first(conn).optional()
}

/// Gets a live org by name, ignoring case.
pub fn get_org_by_name(
    conn: &mut SqliteConnection,
    org_name: &str,
) -> Result<Option<Org>, diesel::result::Error> {
    diesel::sql_query(
        "SELECT id, name, cnpj, deleted_at FROM orgs \
         WHERE LOWER(name) = LOWER(?) AND deleted_at IS NULL",
    )
    .bind::<diesel::sql_types::Text, _>(org_name)
    .get_result::<Org>(conn)
    .optional()
}

/// Lists live orgs ordered by id.
pub fn list_orgs(conn: &mut SqliteConnection, page: Page) -> Result<Vec<Org>, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;
    orgs.filter(deleted_at.is_null())
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(Org::as_select())
        .load(conn)
}

/// Lists every org including deleted ones, ordered by id.
pub fn list_all_orgs_including_deleted(
    conn: &mut SqliteConnection,
) -> Result<Vec<Org>, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;
    orgs.order(id.asc()).select(Org::as_select()).load(conn)
}

/// Updates name and/or CNPJ of a live org.
pub fn update_org(
    conn: &mut SqliteConnection,
    org_id: i32,
    new_name: Option<String>,
    new_cnpj: Option<String>,
    acting_user_id: Option<i32>,
) -> Result<Org, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;

    let current = get_org_by_id(conn, org_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(orgs.filter(id.eq(org_id)))
        .set((
            name.eq(new_name.unwrap_or(current.name)),
            cnpj.eq(new_cnpj.or(current.cnpj)),
        ))
        .execute(conn)?;

    let org = orgs.filter(id.eq(org_id)).select(Org::as_select()).first(conn)?;
    stamp_user(conn, "orgs", org_id, "update", acting_user_id);
    Ok(org)
}

/// Marks a live org deleted. Returns the number of rows changed.
pub fn soft_delete_org(
    conn: &mut SqliteConnection,
    org_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;

    let result = diesel::update(orgs.filter(id.eq(org_id)).filter(deleted_at.is_null()))
        .set(deleted_at.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "orgs", org_id, "delete", acting_user_id);
    }
    Ok(result)
}

/// Clears `deleted_at` on a deleted org.
pub fn restore_org(
    conn: &mut SqliteConnection,
    org_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::orgs::dsl::*;

    let result = diesel::update(orgs.filter(id.eq(org_id)).filter(deleted_at.is_not_null()))
        .set(deleted_at.eq(None::<chrono::NaiveDateTime>))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "orgs", org_id, "restore", acting_user_id);
    }
    Ok(result)
}

/// Get an org with computed timestamps from activity log
pub fn get_org_with_timestamps(
    conn: &mut SqliteConnection,
    org_id: i32,
) -> Result<Option<Timestamped<Org>>, diesel::result::Error> {
    match get_org_by_id(conn, org_id)? {
        Some(org) => with_timestamps(conn, "orgs", org_id, org).map(Some),
        None => Ok(None),
    }
}
