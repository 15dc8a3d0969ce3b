use diesel::prelude::*;

use crate::models::{NewDeletedUser, NewUser, Timestamped, User, UserWithRoles};
use crate::orm::Page;
use crate::orm::entity_activity::{stamp_user, with_timestamps};
use crate::orm::user_role::get_user_roles;

/// Inserts a new user (timestamps handled automatically by database triggers)
pub fn insert_user(
    conn: &mut SqliteConnection,
    new_user: NewUser,
    acting_user_id: Option<i32>,
) -> Result<User, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    diesel::insert_into(users).values(&new_user).execute(conn)?;

    let last_id = crate::orm::last_insert_id(conn)?;
    let user = users.filter(id.eq(last_id)).select(User::as_select()).first(conn)?;

    stamp_user(conn, "users", user.id, "create", acting_user_id);
    Ok(user)
}

/// Gets a single user by ID.
pub fn get_user(conn: &mut SqliteConnection, user_id: i32) -> Result<Option<User>, diesel::result::Error> {
    use crate::schema::users::dsl::*;
    users.filter(id.eq(user_id)).select(User::as_select()).first(conn).optional()
}

/// Gets a single user by email (case-insensitive).
pub fn get_user_by_email(
    conn: &mut SqliteConnection,
    user_email: &str,
) -> Result<Option<User>, diesel::result::Error> {
    diesel::sql_query(
        "SELECT id, email, password_hash, org_id, name FROM users WHERE LOWER(email) = LOWER(?)",
    )
    .bind::<diesel::sql_types::Text, _>(user_email.trim())
    .get_result::<User>(conn)
    .optional()
}

/// Gets a single user by ID with their roles.
pub fn get_user_with_roles(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<UserWithRoles>, diesel::result::Error> {
    match get_user(conn, user_id)? {
        Some(user) => {
            let roles = get_user_roles(conn, user.id)?;
            Ok(Some(UserWithRoles::new(user, roles)))
        }
        None => Ok(None),
    }
}

/// Get a user with roles and computed timestamps from activity log
pub fn get_user_with_timestamps(
    conn: &mut SqliteConnection,
    user_id: i32,
) -> Result<Option<Timestamped<UserWithRoles>>, diesel::result::Error> {
    match get_user_with_roles(conn, user_id)? {
        Some(user) => with_timestamps(conn, "users", user_id, user).map(Some),
        None => Ok(None),
    }
}

/// Lists users with their roles, ordered by id. `org_scope` of `None`
/// lists every org.
pub fn list_users_with_roles(
    conn: &mut SqliteConnection,
    org_scope: Option<i32>,
    page: Page,
) -> Result<Vec<UserWithRoles>, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let mut query = users.into_boxed();
    if let Some(scope) = org_scope {
        query = query.filter(org_id.eq(scope));
    }

    let found = query
        .order(id.asc())
        .limit(page.limit)
        .offset(page.offset)
        .select(User::as_select())
        .load(conn)?;

    let mut result = Vec::with_capacity(found.len());
    for user in found {
        let roles = get_user_roles(conn, user.id)?;
        result.push(UserWithRoles::new(user, roles));
    }
    Ok(result)
}

/// Updates a user's fields. Only provided fields change.
pub fn update_user(
    conn: &mut SqliteConnection,
    user_id: i32,
    new_email: Option<String>,
    new_password_hash: Option<String>,
    new_name: Option<String>,
    acting_user_id: Option<i32>,
) -> Result<User, diesel::result::Error> {
    use crate::schema::users::dsl::*;

    let current = get_user(conn, user_id)?.ok_or(diesel::result::Error::NotFound)?;

    diesel::update(users.filter(id.eq(user_id)))
        .set((
            email.eq(new_email.unwrap_or(current.email)),
            password_hash.eq(new_password_hash.unwrap_or(current.password_hash)),
            name.eq(new_name.or(current.name)),
        ))
        .execute(conn)?;

    let user = users.filter(id.eq(user_id)).select(User::as_select()).first(conn)?;
    stamp_user(conn, "users", user_id, "update", acting_user_id);
    Ok(user)
}

/// Deletes a user after archiving it into `deleted_users`, removing its
/// sessions and role grants in the same transaction.
///
/// Returns the number of users deleted (0 when the id is unknown).
pub fn delete_user_with_cleanup(
    conn: &mut SqliteConnection,
    user_id: i32,
    acting_user_id: Option<i32>,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::{deleted_users, sessions, user_roles, users};

    let deleted = conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let user = match get_user(conn, user_id)? {
            Some(u) => u,
            None => return Ok(0),
        };

        diesel::insert_into(deleted_users::table)
            .values(&NewDeletedUser {
                id: user.id,
                email: user.email,
                password_hash: user.password_hash,
                org_id: user.org_id,
                name: user.name,
                deleted_by: acting_user_id,
            })
            .execute(conn)?;

        diesel::delete(sessions::table.filter(sessions::user_id.eq(user_id))).execute(conn)?;
        diesel::delete(user_roles::table.filter(user_roles::user_id.eq(user_id))).execute(conn)?;
        diesel::delete(users::table.filter(users::id.eq(user_id))).execute(conn)
    })?;

    if deleted > 0 {
        stamp_user(conn, "users", user_id, "delete", acting_user_id);
    }
    Ok(deleted)
}
