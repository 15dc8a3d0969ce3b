use diesel::{Identifiable, Insertable, Queryable, QueryableByName, Selectable};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::models::Role;
use crate::schema::users;

#[derive(
    Queryable, Selectable, Identifiable, QueryableByName, Debug, Clone, Serialize, Deserialize, TS,
)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[ts(export)]
pub struct User {
    pub id: i32,
    pub email: String, // Will be unique
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub org_id: i32,
    pub name: Option<String>,
}

#[derive(Insertable, Deserialize)]
#[diesel(table_name = users)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub org_id: i32,
    pub name: Option<String>,
}

#[derive(Deserialize, Debug, Serialize, TS)]
#[ts(export)]
pub struct UserWithRoles {
    pub id: i32,
    pub email: String,
    pub org_id: i32,
    pub name: Option<String>,
    pub roles: Vec<Role>,
}

impl UserWithRoles {
    pub fn new(user: User, roles: Vec<Role>) -> Self {
        UserWithRoles {
            id: user.id,
            email: user.email,
            org_id: user.org_id,
            name: user.name,
            roles,
        }
    }
}
