//! Test support: in-memory databases, a `DbConn` stand-in and a fully
//! seeded Rocket instance.
//!
//! Seeded data available to every `test_rocket()` client (password `admin`
//! for everyone):
//!
//! | email                    | org              | role             |
//! |--------------------------|------------------|------------------|
//! | `superadmin@example.com` | Meta Construtor  | `platform-admin` |
//! | `admin@alfa.com`         | Construtora Alfa | `admin`          |
//! | `editor@alfa.com`        | Construtora Alfa | `editor`         |
//! | `viewer@alfa.com`        | Construtora Alfa | `viewer`         |
//! | `admin@beta.com`         | Construtora Beta | `admin`          |
//! | `editor@beta.com`        | Construtora Beta | `editor`         |

use std::sync::{Mutex, OnceLock, PoisonError};

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use rocket::figment::{
    Provider,
    util::map,
    value::{Map, Value},
};
use rocket::{Build, Rocket, fairing::AdHoc};
use uuid::Uuid;

use super::db::{DbConn, run_pending_migrations, set_foreign_keys};
use crate::models::{NewObra, NewUser, ObraStatus, Org, User};
use crate::orm::login::hash_password;
use crate::orm::org::{get_org_by_name, insert_org};
use crate::orm::user::{get_user_by_email, insert_user};
use crate::orm::user_role::assign_user_role_by_name;

/// Password of every seeded user.
pub const TEST_PASSWORD: &str = "admin";

/// Argon2 is deliberately slow; seeded users share one hash.
fn test_password_hash() -> &'static str {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_password(TEST_PASSWORD).expect("hash test password"))
}

/// Trades durability for speed. Only for throwaway databases.
fn set_sqlite_test_pragmas(conn: &mut SqliteConnection) -> QueryResult<()> {
    conn.batch_execute(
        r#"
        PRAGMA synchronous = OFF;
        PRAGMA journal_mode = OFF;
        "#,
    )
}

fn set_sqlite_test_pragmas_fairing() -> AdHoc {
    AdHoc::on_ignite("Set SQLite Test Pragmas", |rocket| async {
        if let Some(conn) = DbConn::get_one(&rocket).await
            && let Err(e) = conn.run(set_sqlite_test_pragmas).await
        {
            warn!("[test-data-init] Could not set test pragmas: {:?}", e);
        }
        rocket
    })
}

/// Seeds the tenant orgs and users listed in the module docs.
fn test_data_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Test Data Initialization", |rocket| async {
        let conn = match DbConn::get_one(&rocket).await {
            Some(conn) => conn,
            None => return Err(rocket),
        };

        match conn.run(create_test_data).await {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[test-data-init] Failed to create test data: {:?}", e);
                Err(rocket)
            }
        }
    })
}

fn create_test_data(conn: &mut SqliteConnection) -> Result<(), diesel::result::Error> {
    let alfa = find_or_create_org(conn, "Construtora Alfa", Some("11222333000181"))?;
    let beta = find_or_create_org(conn, "Construtora Beta", None)?;

    create_test_user(conn, "admin@alfa.com", alfa.id, "admin")?;
    create_test_user(conn, "editor@alfa.com", alfa.id, "editor")?;
    create_test_user(conn, "viewer@alfa.com", alfa.id, "viewer")?;
    create_test_user(conn, "admin@beta.com", beta.id, "admin")?;
    create_test_user(conn, "editor@beta.com", beta.id, "editor")?;
    Ok(())
}

fn find_or_create_org(
    conn: &mut SqliteConnection,
    org_name: &str,
    org_cnpj: Option<&str>,
) -> Result<Org, diesel::result::Error> {
    match get_org_by_name(conn, org_name)? {
        Some(org) => Ok(org),
        None => insert_org(conn, org_name.to_string(), org_cnpj.map(str::to_string), None),
    }
}

fn create_test_user(
    conn: &mut SqliteConnection,
    user_email: &str,
    user_org_id: i32,
    role_name: &str,
) -> Result<User, diesel::result::Error> {
    if let Some(existing) = get_user_by_email(conn, user_email)? {
        return Ok(existing);
    }

    let user = insert_user(
        conn,
        NewUser {
            email: user_email.to_string(),
            password_hash: test_password_hash().to_string(),
            org_id: user_org_id,
            name: None,
        },
        None,
    )?;
    assign_user_role_by_name(conn, user.id, role_name)?;
    Ok(user)
}

/// Builds a Rocket instance over a fresh shared-cache in-memory database,
/// seeded with the module's test data. Rate limiting is set high enough
/// that ordinary tests never hit it.
pub fn test_rocket() -> Rocket<Build> {
    test_rocket_with(("rate_limit.enabled", true))
}

/// Like [`test_rocket`], with extra configuration merged on top, e.g.
/// `("rate_limit.max_requests", 2)`.
pub fn test_rocket_with<P: Provider>(overrides: P) -> Rocket<Build> {
    let unique_db_name = format!("file:test_db_{}?mode=memory&cache=shared", Uuid::new_v4());

    let db_config: Map<_, Value> = map! {
        "url" => unique_db_name.into(),
        "pool_size" => 5.into(),
        "timeout" => 5.into(),
    };

    let figment = rocket::Config::figment()
        .merge(("databases", map!["sqlite_db" => db_config]))
        .merge(("rate_limit.max_requests", 1_000_000))
        .merge(overrides);

    crate::build_rocket(figment)
        .attach(set_sqlite_test_pragmas_fairing())
        .attach(test_data_init_fairing())
}

/// A fresh in-memory database with migrations applied and foreign keys on.
///
/// Each call returns an independent database.
pub fn setup_test_db() -> SqliteConnection {
    let mut conn =
        SqliteConnection::establish(":memory:").expect("Failed to create in-memory SQLite database");
    set_foreign_keys(&mut conn).expect("Failed to enable foreign keys");
    run_pending_migrations(&mut conn).expect("Failed to run migrations");
    conn
}

/// Stand-in for [`DbConn`] in async unit tests: offers the same `run`
/// interface over a single owned connection.
pub struct FakeDbConn(Mutex<SqliteConnection>);

impl FakeDbConn {
    pub async fn run<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        let mut conn = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }
}

/// Wraps a connection, typically from [`setup_test_db`], for async tests.
pub fn setup_test_dbconn(conn: SqliteConnection) -> FakeDbConn {
    FakeDbConn(Mutex::new(conn))
}

/// A planned obra with only the required fields set.
pub fn sample_obra(obra_org_id: i32, obra_name: &str) -> NewObra {
    NewObra {
        org_id: obra_org_id,
        name: obra_name.to_string(),
        address: None,
        client_name: None,
        client_document: None,
        status: ObraStatus::Planejada.to_string(),
        start_date: None,
        expected_end_date: None,
        budget_cents: None,
    }
}

/// Inserts a user holding `roles`, in an org named after the email's
/// domain (created on first use). Users sharing a domain share an org.
pub fn insert_test_user(conn: &mut SqliteConnection, user_email: &str, roles: &[&str]) -> User {
    let domain = user_email.rsplit('@').next().unwrap_or("example.com");
    let org = find_or_create_org(conn, domain, None).expect("create test org");

    let user = insert_user(
        conn,
        NewUser {
            email: user_email.to_string(),
            password_hash: test_password_hash().to_string(),
            org_id: org.id,
            name: None,
        },
        None,
    )
    .expect("insert test user");

    for role_name in roles {
        assign_user_role_by_name(conn, user.id, role_name).expect("assign test role");
    }
    user
}
