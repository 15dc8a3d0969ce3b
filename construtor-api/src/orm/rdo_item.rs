use chrono::Utc;
use diesel::prelude::*;

use crate::models::{NewRdoItem, RdoItem, RdoItemChanges, Timestamped};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

pub fn insert_rdo_item(
    conn: &mut SqliteConnection,
    new_item: NewRdoItem,
    acting_user_id: Option<i32>,
) -> Result<RdoItem, diesel::result::Error> {
    use crate::schema::rdo_itens::dsl::*;

    diesel::insert_into(rdo_itens).values(&new_item).execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let item = rdo_itens.filter(id.eq(last_id)).select(RdoItem::as_select()).first(conn)?;

    stamp_user(conn, "rdo_itens", item.id, "create", acting_user_id);
    Ok(item)
}

pub fn get_rdo_item(
    conn: &mut SqliteConnection,
    item_id: i32,
) -> Result<Option<RdoItem>, diesel::result::Error> {
    use crate::schema::rdo_itens::dsl::*;
    rdo_itens
        .filter(id.eq(item_id))
        .filter(deleted_at.is_null())
        .select(RdoItem::as_select())
        .first(conn)
        .optional()
}

pub fn get_rdo_item_with_timestamps(
    conn: &mut SqliteConnection,
    item_id: i32,
) -> Result<Option<Timestamped<RdoItem>>, diesel::result::Error> {
    match get_rdo_item(conn, item_id)? {
        Some(item) => with_timestamps(conn, "rdo_itens", item_id, item).map(Some),
        None => Ok(None),
    }
}

pub fn list_rdo_items(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    rdo_filter: Option<i32>,
    page: Page,
) -> Result<Vec<RdoItem>, diesel::result::Error> {
    use crate::schema::rdo_itens::dsl::*;

    let mut query = rdo_itens.filter(deleted_at.is_null()).into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }
    if let Some(wanted) = rdo_filter {
        query = query.filter(rdo_id.eq(wanted));
    }

    query
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(RdoItem::as_select())
        .load(conn)
}

pub fn update_rdo_item(
    conn: &mut SqliteConnection,
    item_id: i32,
    changes: RdoItemChanges,
    acting_user_id: Option<i32>,
) -> Result<RdoItem, diesel::result::Error> {
    use crate::schema::rdo_itens::dsl::*;

    let current = get_rdo_item(conn, item_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(rdo_itens.filter(id.eq(item_id)))
        .set((
            description.eq(changes.description.unwrap_or(current.description)),
            quantity.eq(changes.quantity.unwrap_or(current.quantity)),
            unit.eq(changes.unit.or(current.unit)),
            equipe_id.eq(changes.equipe_id.or(current.equipe_id)),
        ))
        .execute(conn)?;

    let item = rdo_itens.filter(id.eq(item_id)).select(RdoItem::as_select()).first(conn)?;
    stamp_user(conn, "rdo_itens", item_id, "update", acting_user_id);
    Ok(item)
}

pub fn soft_delete_rdo_item(
    conn: &mut SqliteConnection,
    item_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::rdo_itens::dsl::*;

    let result = diesel::update(rdo_itens.filter(id.eq(item_id)).filter(deleted_at.is_null()))
        .set(deleted_at.eq(Some(Utc::now().naive_utc())))
        .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "rdo_itens", item_id, "delete", acting_user_id);
    }
    Ok(result)
}
