//! Audit trail queries.
//!
//! Rows of `entity_activity` are written by triggers on every tracked table.
//! Triggers cannot see the acting user, so ORM functions stamp it on the
//! freshly written row with [`update_latest_activity_user`].

use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::models::{EntityActivity, NewEntityActivity, Timestamped};

/// Tables whose activity can be queried through the API.
pub const TRACKED_TABLES: &[&str] = &[
    "orgs",
    "users",
    "obras",
    "equipes",
    "equipamentos",
    "rdos",
    "rdo_itens",
    "attachments",
    "checklists",
    "checklist_itens",
    "expenses",
];

/// Log an activity for an entity by hand (used for operations no trigger
/// sees).
pub fn log_activity(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
    org_id_val: Option<i32>,
    operation_type_val: &str,
    user_id_val: Option<i32>,
) -> Result<EntityActivity, diesel::result::Error> {
    use crate::schema::entity_activity::dsl::*;

    let new_activity = NewEntityActivity {
        table_name: table_name_val.to_string(),
        entity_id: entity_id_val,
        org_id: org_id_val,
        operation_type: operation_type_val.to_string(),
        timestamp: None,
        user_id: user_id_val,
    };

    diesel::insert_into(entity_activity)
        .values(&new_activity)
        .execute(conn)?;

    let last_id = crate::orm::last_insert_id(conn)?;
    entity_activity
        .filter(id.eq(last_id))
        .select(EntityActivity::as_select())
        .first(conn)
}

/// Sets `user_id` on the newest activity row matching the entity and
/// operation.
pub fn update_latest_activity_user(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
    operation_type_val: &str,
    user_id_val: i32,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::entity_activity::dsl::*;

    let latest_id = entity_activity
        .filter(table_name.eq(table_name_val))
        .filter(entity_id.eq(entity_id_val))
        .filter(operation_type.eq(operation_type_val))
        .order(id.desc())
        .select(id)
        .first::<i32>(conn)
        .optional()?;

    match latest_id {
        Some(activity_id) => diesel::update(entity_activity.filter(id.eq(activity_id)))
            .set(user_id.eq(Some(user_id_val)))
            .execute(conn),
        None => Ok(0),
    }
}

/// Stamps the acting user when there is one; failures are logged, not
/// raised, since the data change itself already succeeded.
pub fn stamp_user(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
    operation_type_val: &str,
    acting_user_id: Option<i32>,
) {
    if let Some(user_id_val) = acting_user_id
        && let Err(e) = update_latest_activity_user(
            conn,
            table_name_val,
            entity_id_val,
            operation_type_val,
            user_id_val,
        )
    {
        warn!(
            "Could not record acting user {} on {} {} ({}): {:?}",
            user_id_val, table_name_val, entity_id_val, operation_type_val, e
        );
    }
}

/// Get the creation timestamp for an entity (first 'create' operation)
pub fn get_created_at(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
) -> Result<NaiveDateTime, diesel::result::Error> {
    use crate::schema::entity_activity::dsl::*;

    entity_activity
        .filter(table_name.eq(table_name_val))
        .filter(entity_id.eq(entity_id_val))
        .filter(operation_type.eq("create"))
        .order(id.asc())
        .select(timestamp)
        .first::<NaiveDateTime>(conn)
}

/// Get the last update timestamp for an entity (most recent operation)
pub fn get_updated_at(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
) -> Result<NaiveDateTime, diesel::result::Error> {
    use crate::schema::entity_activity::dsl::*;

    entity_activity
        .filter(table_name.eq(table_name_val))
        .filter(entity_id.eq(entity_id_val))
        .order(id.desc())
        .select(timestamp)
        .first::<NaiveDateTime>(conn)
}

/// Wraps an entity with timestamps from its activity log.
pub fn with_timestamps<T>(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
    entity: T,
) -> Result<Timestamped<T>, diesel::result::Error> {
    let created_at = get_created_at(conn, table_name_val, entity_id_val)?;
    let updated_at = get_updated_at(conn, table_name_val, entity_id_val)?;
    Ok(Timestamped {
        entity,
        created_at,
        updated_at,
    })
}

/// Get full activity history for an entity, oldest first. `org_scope`
/// restricts the result to one org's entries.
pub fn get_activity_history(
    conn: &mut SqliteConnection,
    table_name_val: &str,
    entity_id_val: i32,
    org_scope: Option<i32>,
) -> Result<Vec<EntityActivity>, diesel::result::Error> {
    use crate::schema::entity_activity::dsl::*;

    let mut query = entity_activity
        .filter(table_name.eq(table_name_val))
        .filter(entity_id.eq(entity_id_val))
        .into_boxed();

    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }

    query
        .order(id.asc())
        .select(EntityActivity::as_select())
        .load(conn)
}

/// Most recent activity of one org across all tables.
pub fn get_org_activity(
    conn: &mut SqliteConnection,
    org_id_val: i32,
    limit: i64,
) -> Result<Vec<EntityActivity>, diesel::result::Error> {
    use crate::schema::entity_activity::dsl::*;

    entity_activity
        .filter(org_id.eq(org_id_val))
        .order(id.desc())
        .limit(limit)
        .select(EntityActivity::as_select())
        .load(conn)
}
