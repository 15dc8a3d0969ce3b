use diesel::prelude::*;

use crate::models::{NewUserRole, Role};
use crate::schema::{roles, user_roles};

/// Outcome of taking a role away from a user.
#[derive(Debug, PartialEq, Eq)]
pub enum RoleRemoval {
    Removed,
    NotAssigned,
    /// Refused: every user keeps at least one role.
    LastRole,
}

/// Roles held by a user, ordered by role id.
pub fn get_user_roles(
    conn: &mut SqliteConnection,
    target_user_id: i32,
) -> Result<Vec<Role>, diesel::result::Error> {
    user_roles::table
        .inner_join(roles::table)
        .filter(user_roles::user_id.eq(target_user_id))
        .order(roles::id.asc())
        .select(Role::as_select())
        .load(conn)
}

/// Grants a role by name. Granting a role the user already holds is a no-op;
/// an unknown role name yields `NotFound`.
pub fn assign_user_role_by_name(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    role_name: &str,
) -> Result<(), diesel::result::Error> {
    let role = crate::orm::role::get_role_by_name(conn, role_name)?
        .ok_or(diesel::result::Error::NotFound)?;

    diesel::insert_or_ignore_into(user_roles::table)
        .values(&NewUserRole {
            user_id: target_user_id,
            role_id: role.id,
        })
        .execute(conn)?;
    Ok(())
}

/// Takes a role away, refusing to leave the user without roles.
pub fn remove_user_role_by_name(
    conn: &mut SqliteConnection,
    target_user_id: i32,
    role_name: &str,
) -> Result<RoleRemoval, diesel::result::Error> {
    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let held = get_user_roles(conn, target_user_id)?;
        let role = match held.iter().find(|r| r.name == role_name) {
            Some(role) => role,
            None => return Ok(RoleRemoval::NotAssigned),
        };
        if held.len() == 1 {
            return Ok(RoleRemoval::LastRole);
        }

        diesel::delete(
            user_roles::table
                .filter(user_roles::user_id.eq(target_user_id))
                .filter(user_roles::role_id.eq(role.id)),
        )
        .execute(conn)?;
        Ok(RoleRemoval::Removed)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::{insert_test_user, setup_test_db};

    #[test]
    fn test_assign_and_remove_roles() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "mestre@obra.com.br", &["viewer"]);

        assign_user_role_by_name(&mut conn, user.id, "editor").unwrap();
        assign_user_role_by_name(&mut conn, user.id, "editor").unwrap();
        let names: Vec<String> =
            get_user_roles(&mut conn, user.id).unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["editor", "viewer"]);

        assert_eq!(
            remove_user_role_by_name(&mut conn, user.id, "viewer").unwrap(),
            RoleRemoval::Removed
        );
        assert_eq!(
            remove_user_role_by_name(&mut conn, user.id, "viewer").unwrap(),
            RoleRemoval::NotAssigned
        );
        assert_eq!(
            remove_user_role_by_name(&mut conn, user.id, "editor").unwrap(),
            RoleRemoval::LastRole
        );
    }

    #[test]
    fn test_unknown_role() {
        let mut conn = setup_test_db();
        let user = insert_test_user(&mut conn, "apontador@obra.com.br", &["viewer"]);
        assert!(matches!(
            assign_user_role_by_name(&mut conn, user.id, "superuser"),
            Err(diesel::result::Error::NotFound)
        ));
    }
}
