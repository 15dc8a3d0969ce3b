use diesel::prelude::*;
use dotenvy::dotenv;
use rocket::Rocket;
use rocket::fairing::AdHoc;

use crate::models::{NewRole, NewUser, Org, PLATFORM_ADMIN, Role, User};
use crate::orm::DbConn;
use crate::orm::login::hash_password;
use crate::orm::org::{get_org_by_name, insert_org};
use crate::orm::role::{get_role_by_name, insert_role};
use crate::orm::user::{get_user_by_email, insert_user};
use crate::orm::user_role::assign_user_role_by_name;

/// Name of the org that owns the platform operators.
pub const PLATFORM_ORG_NAME: &str = "Meta Construtor";

/// Makes sure the platform org and a platform admin exist.
///
/// The admin login comes from `CONSTRUTOR_DEFAULT_EMAIL` and
/// `CONSTRUTOR_DEFAULT_PASSWORD`, falling back to
/// `superadmin@example.com` / `admin`.
pub fn admin_init_fairing() -> AdHoc {
    AdHoc::try_on_ignite("Admin User Initialization", |rocket| async {
        dotenv().ok();

        let conn = match get_db_connection(&rocket).await {
            Some(conn) => conn,
            None => return Err(rocket),
        };

        let admin_email = get_admin_email();
        let admin_password = get_admin_password();
        let result = conn
            .run(move |c| {
                let org = find_or_create_platform_org(c)?;
                create_admin_user_if_needed(c, &admin_email, &admin_password, &org)
            })
            .await;

        match result {
            Ok(()) => Ok(rocket),
            Err(e) => {
                error!("[admin-init] FATAL: Admin user creation failed: {}", e);
                Err(rocket)
            }
        }
    })
}

async fn get_db_connection(rocket: &Rocket<rocket::Build>) -> Option<DbConn> {
    match DbConn::get_one(rocket).await {
        Some(conn) => Some(conn),
        None => {
            error!("[admin-init] ERROR: Could not get DB connection.");
            None
        }
    }
}

fn get_admin_email() -> String {
    std::env::var("CONSTRUTOR_DEFAULT_EMAIL")
        .unwrap_or_else(|_| "superadmin@example.com".to_string())
}

fn get_admin_password() -> String {
    std::env::var("CONSTRUTOR_DEFAULT_PASSWORD").unwrap_or_else(|_| "admin".to_string())
}

fn find_or_create_platform_org(c: &mut SqliteConnection) -> Result<Org, String> {
    match get_org_by_name(c, PLATFORM_ORG_NAME) {
        Ok(Some(found)) => {
            info!("[admin-init] Matched org: '{}'", found.name);
            Ok(found)
        }
        Ok(None) => {
            info!("[admin-init] No platform org found. Creating '{}'.", PLATFORM_ORG_NAME);
            insert_org(c, PLATFORM_ORG_NAME.to_string(), None, None)
                .map_err(|e| format!("creating org: {:?}", e))
        }
        Err(e) => Err(format!("querying org: {:?}", e)),
    }
}

fn create_admin_user_if_needed(
    c: &mut SqliteConnection,
    admin_email: &str,
    admin_password: &str,
    org: &Org,
) -> Result<(), String> {
    let existing = get_user_by_email(c, admin_email).map_err(|e| format!("{:?}", e))?;
    if existing.is_some() {
        info!("[admin-init] Admin user '{}' already exists", admin_email);
        return Ok(());
    }

    let user = create_admin_user(c, admin_email, admin_password, org)?;
    find_or_create_platform_role(c).map_err(|e| format!("creating role: {:?}", e))?;
    assign_user_role_by_name(c, user.id, PLATFORM_ADMIN)
        .map_err(|e| format!("assigning role: {:?}", e))?;
    info!("[admin-init] Assigned role '{}' to user '{}'", PLATFORM_ADMIN, admin_email);
    Ok(())
}

fn create_admin_user(
    c: &mut SqliteConnection,
    admin_email: &str,
    admin_password: &str,
    org: &Org,
) -> Result<User, String> {
    let passhash = hash_password(admin_password).map_err(|e| format!("hashing password: {}", e))?;

    let admin_user = NewUser {
        email: admin_email.to_string(),
        password_hash: passhash,
        org_id: org.id,
        name: Some("Administrador".to_string()),
    };

    match insert_user(c, admin_user, None) {
        Ok(user) => {
            info!("[admin-init] Created admin user: '{}'", admin_email);
            Ok(user)
        }
        Err(e) => Err(format!("creating admin user: {:?}", e)),
    }
}

/// The migrations seed the role; an operator may still have removed it.
fn find_or_create_platform_role(c: &mut SqliteConnection) -> Result<Role, diesel::result::Error> {
    match get_role_by_name(c, PLATFORM_ADMIN)? {
        Some(role) => Ok(role),
        None => {
            info!("[admin-init] Creating role: '{}'", PLATFORM_ADMIN);
            insert_role(
                c,
                NewRole {
                    name: PLATFORM_ADMIN.to_string(),
                    description: Some("Operates every org on the platform".to_string()),
                },
            )
        }
    }
}
