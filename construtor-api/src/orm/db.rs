use diesel::QueryableByName;
use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use rocket::fairing::AdHoc;
use rocket_sync_db_pools::{database, diesel};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

#[database("sqlite_db")]
pub struct DbConn(diesel::SqliteConnection);

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = BigInt)]
    last_insert_rowid: i64,
}

/// Returns the rowid of the last row inserted on this connection.
pub fn last_insert_id(conn: &mut SqliteConnection) -> QueryResult<i32> {
    diesel::sql_query("SELECT last_insert_rowid() as last_insert_rowid")
        .get_result::<LastInsertRowId>(conn)
        .map(|row| row.last_insert_rowid as i32)
}

/// Enables foreign key enforcement, which SQLite leaves off by default.
pub fn set_foreign_keys(conn: &mut diesel::SqliteConnection) -> QueryResult<()> {
    conn.batch_execute("PRAGMA foreign_keys = ON")
}

/// Enables foreign keys on a pooled connection at ignition.
pub fn set_foreign_keys_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Set Foreign Keys", |rocket| async {
        let conn = match DbConn::get_one(&rocket).await {
            Some(conn) => conn,
            None => {
                error!("No database connection available to enable foreign keys");
                return Err(rocket);
            }
        };
        match conn.run(set_foreign_keys).await {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("Failed to enable foreign keys: {:?}", e);
                Err(rocket)
            }
        }
    })
}

/// Runs all pending embedded migrations.
pub fn run_pending_migrations(
    conn: &mut diesel::SqliteConnection,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    conn.run_pending_migrations(MIGRATIONS).map(|applied| {
        for version in applied {
            info!("Applied migration {}", version);
        }
    })
}

/// Runs migrations when Rocket ignites; ignition fails if any migration
/// fails.
pub fn run_migrations_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Diesel Migrations", |rocket| async {
        let conn = match DbConn::get_one(&rocket).await {
            Some(conn) => conn,
            None => {
                error!("No database connection available for migrations");
                return Err(rocket);
            }
        };
        match conn.run(|c| run_pending_migrations(c).map_err(|e| e.to_string())).await {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("Failed to run migrations: {}", e);
                Err(rocket)
            }
        }
    })
}
