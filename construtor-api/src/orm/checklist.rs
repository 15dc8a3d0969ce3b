//! Checklists and their items.
//!
//! Checklists are soft-deleted like the other tenant records. Items have no
//! life of their own and are removed outright.

use chrono::Utc;
use diesel::prelude::*;

use crate::models::{
    Checklist, ChecklistItem, ChecklistWithItems, NewChecklist, NewChecklistItem, Timestamped,
};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};

pub fn insert_checklist(
    conn: &mut SqliteConnection,
    new_checklist: NewChecklist,
    acting_user_id: Option<i32>,
) -> Result<Checklist, diesel::result::Error> {
    use crate::schema::checklists::dsl::*;

    diesel::insert_into(checklists).values(&new_checklist).execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let checklist = checklists
        .filter(id.eq(last_id))
        .select(Checklist::as_select())
        .first(conn)?;

    stamp_user(conn, "checklists", checklist.id, "create", acting_user_id);
    Ok(checklist)
}

pub fn get_checklist(
    conn: &mut SqliteConnection,
    checklist_id: i32,
) -> Result<Option<Checklist>, diesel::result::Error> {
    use crate::schema::checklists::dsl::*;
    checklists
        .filter(id.eq(checklist_id))
        .filter(deleted_at.is_null())
        .select(Checklist::as_select())
        .first(conn)
        .optional()
}

/// Items of a checklist in insertion order.
pub fn list_checklist_items(
    conn: &mut SqliteConnection,
    target_checklist_id: i32,
) -> Result<Vec<ChecklistItem>, diesel::result::Error> {
    use crate::schema::checklist_itens::dsl::*;
    checklist_itens
        .filter(checklist_id.eq(target_checklist_id))
        .order(id.asc())
        .select(ChecklistItem::as_select())
        .load(conn)
}

/// A live checklist with its items and timestamps.
pub fn get_checklist_with_items(
    conn: &mut SqliteConnection,
    checklist_id: i32,
) -> Result<Option<Timestamped<ChecklistWithItems>>, diesel::result::Error> {
    let checklist = match get_checklist(conn, checklist_id)? {
        Some(checklist) => checklist,
        None => return Ok(None),
    };
    let items = list_checklist_items(conn, checklist_id)?;
    with_timestamps(
        conn,
        "checklists",
        checklist_id,
        ChecklistWithItems { checklist, items },
    )
    .map(Some)
}

pub fn list_checklists(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    obra_filter: Option<i32>,
    page: Page,
) -> Result<Vec<Checklist>, diesel::result::Error> {
    use crate::schema::checklists::dsl::*;

    let mut query = checklists.filter(deleted_at.is_null()).into_boxed();
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
        .select(Checklist::as_select())
        .load(conn)
}

pub fn update_checklist(
    conn: &mut SqliteConnection,
    checklist_id: i32,
    new_title: Option<String>,
    acting_user_id: Option<i32>,
) -> Result<Checklist, diesel::result::Error> {
    use crate::schema::checklists::dsl::*;

    let current = get_checklist(conn, checklist_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(checklists.filter(id.eq(checklist_id)))
        .set(title.eq(new_title.unwrap_or(current.title)))
        .execute(conn)?;

    let checklist = checklists
        .filter(id.eq(checklist_id))
        .select(Checklist::as_select())
        .first(conn)?;
    stamp_user(conn, "checklists", checklist_id, "update", acting_user_id);
    Ok(checklist)
}

pub fn soft_delete_checklist(
    conn: &mut SqliteConnection,
    checklist_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::checklists::dsl::*;

    let result = diesel::update(
        checklists
            .filter(id.eq(checklist_id))
            .filter(deleted_at.is_null()),
    )
    .set(deleted_at.eq(Some(Utc::now().naive_utc())))
    .execute(conn)?;

    if result > 0 {
        stamp_user(conn, "checklists", checklist_id, "delete", acting_user_id);
    }
    Ok(result)
}

pub fn add_checklist_item(
    conn: &mut SqliteConnection,
    target_checklist_id: i32,
    item_description: String,
    acting_user_id: Option<i32>,
) -> Result<ChecklistItem, diesel::result::Error> {
    use crate::schema::checklist_itens::dsl::*;

    diesel::insert_into(checklist_itens)
        .values(&NewChecklistItem {
            checklist_id: target_checklist_id,
            description: item_description,
        })
        .execute(conn)?;
    let last_id = crate::orm::last_insert_id(conn)?;
    let item = checklist_itens
        .filter(id.eq(last_id))
        .select(ChecklistItem::as_select())
        .first(conn)?;

    stamp_user(conn, "checklist_itens", item.id, "create", acting_user_id);
    Ok(item)
}

/// Gets an item only when it belongs to the given checklist.
pub fn get_checklist_item(
    conn: &mut SqliteConnection,
    target_checklist_id: i32,
    item_id: i32,
) -> Result<Option<ChecklistItem>, diesel::result::Error> {
    use crate::schema::checklist_itens::dsl::*;
    checklist_itens
        .filter(id.eq(item_id))
        .filter(checklist_id.eq(target_checklist_id))
        .select(ChecklistItem::as_select())
        .first(conn)
        .optional()
}

/// Changes an item's text and/or done flag.
///
/// Marking an item done records when and by whom; marking it open again
/// clears both. Re-sending the current flag leaves the stamps untouched.
pub fn update_checklist_item(
    conn: &mut SqliteConnection,
    item_id: i32,
    new_description: Option<String>,
    new_done: Option<bool>,
    acting_user_id: Option<i32>,
) -> Result<ChecklistItem, diesel::result::Error> {
    use crate::schema::checklist_itens::dsl::*;

    let current = checklist_itens
        .filter(id.eq(item_id))
        .select(ChecklistItem::as_select())
        .first(conn)?;

    let (next_done, next_done_at, next_done_by) = match new_done {
        Some(true) if !current.done => (true, Some(Utc::now().naive_utc()), acting_user_id),
        Some(false) if current.done => (false, None, None),
        _ => (current.done, current.done_at, current.done_by),
    };

    diesel::update(checklist_itens.filter(id.eq(item_id)))
        .set((
            description.eq(new_description.unwrap_or(current.description)),
            done.eq(next_done),
            done_at.eq(next_done_at),
            done_by.eq(next_done_by),
        ))
        .execute(conn)?;

    let item = checklist_itens
        .filter(id.eq(item_id))
        .select(ChecklistItem::as_select())
        .first(conn)?;
    stamp_user(conn, "checklist_itens", item_id, "update", acting_user_id);
    Ok(item)
}

/// Removes an item. Returns the number of rows deleted.
pub fn delete_checklist_item(
    conn: &mut SqliteConnection,
    item_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::checklist_itens::dsl::*;

    let result = diesel::delete(checklist_itens.filter(id.eq(item_id))).execute(conn)?;
    if result > 0 {
        stamp_user(conn, "checklist_itens", item_id, "delete", acting_user_id);
    }
    Ok(result)
}
