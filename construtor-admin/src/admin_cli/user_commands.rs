use clap::Subcommand;
use diesel::sqlite::SqliteConnection;

use construtor_api::models::{NewUser, VIEWER};
use construtor_api::orm::Page;
use construtor_api::orm::login::hash_password;
use construtor_api::orm::logout::revoke_user_sessions;
use construtor_api::orm::role::get_role_by_name;
use construtor_api::orm::user::{
    delete_user_with_cleanup, get_user, get_user_by_email, insert_user, list_users_with_roles,
    update_user,
};
use construtor_api::orm::user_role::{
    RoleRemoval, assign_user_role_by_name, get_user_roles, remove_user_role_by_name,
};

use super::utils::{
    CliResult, SearchFilter, check_password, confirm, prompt_for_password, resolve_org_id,
};

#[derive(Subcommand)]
pub enum UserAction {
    #[command(about = "Add a new user")]
    Add {
        #[arg(short, long, help = "Email address")]
        email: String,
        #[arg(short, long, help = "Password (will be prompted securely if not provided)")]
        password: Option<String>,
        #[arg(short, long, help = "Org ID or name")]
        org: String,
        #[arg(short, long, help = "Display name")]
        name: Option<String>,
        #[arg(short, long = "role", help = "Role to grant (repeatable, defaults to viewer)")]
        roles: Vec<String>,
        #[arg(long, help = "Accept a password below the strength threshold")]
        force: bool,
    },
    #[command(about = "Change user password (revokes the user's sessions)")]
    ChangePassword {
        #[arg(short, long, help = "Email address")]
        email: String,
        #[arg(short, long, help = "New password (will be prompted securely if not provided)")]
        password: Option<String>,
        #[arg(long, help = "Accept a password below the strength threshold")]
        force: bool,
    },
    #[command(about = "List users, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
        #[arg(short, long, help = "Only users of this org (ID or name)")]
        org: Option<String>,
    },
    #[command(about = "Remove users matching search term")]
    Rm {
        #[arg(help = "Search term to match users for removal (regex by default, use -F for fixed string)")]
        search_term: String,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
        #[arg(short = 'y', long = "yes", help = "Skip confirmation prompt")]
        yes: bool,
    },
    #[command(about = "Edit user fields")]
    Edit {
        #[arg(short, long, help = "User ID to edit")]
        id: i32,
        #[arg(long, help = "New email address")]
        email: Option<String>,
        #[arg(long, help = "New display name")]
        name: Option<String>,
    },
    #[command(about = "Grant a role to a user")]
    Grant {
        #[arg(short, long, help = "User email address")]
        email: String,
        #[arg(short, long, help = "Role name to grant")]
        role: String,
    },
    #[command(about = "Revoke a role from a user")]
    Revoke {
        #[arg(short, long, help = "User email address")]
        email: String,
        #[arg(short, long, help = "Role name to revoke")]
        role: String,
    },
}

pub fn handle_user_command_with_conn(
    conn: &mut SqliteConnection,
    action: UserAction,
    admin_user_id: i32,
) -> CliResult<()> {
    match action {
        UserAction::Add {
            email,
            password,
            org,
            name,
            roles,
            force,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_for_password()?,
            };
            add_user_impl(conn, &email, &password, &org, name, &roles, force, admin_user_id)?;
        }
        UserAction::ChangePassword {
            email,
            password,
            force,
        } => {
            let password = match password {
                Some(p) => p,
                None => prompt_for_password()?,
            };
            change_password_impl(conn, &email, &password, force, admin_user_id)?;
        }
        UserAction::Ls {
            search_term,
            fixed_string,
            org,
        } => {
            list_users_impl(conn, search_term, fixed_string, org)?;
        }
        UserAction::Rm {
            search_term,
            fixed_string,
            yes,
        } => {
            remove_users_impl(conn, search_term, fixed_string, yes, admin_user_id)?;
        }
        UserAction::Edit { id, email, name } => {
            user_edit_impl(conn, id, email, name, admin_user_id)?;
        }
        UserAction::Grant { email, role } => {
            grant_role_impl(conn, &email, &role)?;
        }
        UserAction::Revoke { email, role } => {
            revoke_role_impl(conn, &email, &role)?;
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn add_user_impl(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
    org: &str,
    name: Option<String>,
    roles: &[String],
    force: bool,
    admin_user_id: i32,
) -> CliResult<i32> {
    let email = email.trim().to_lowercase();
    if !email.contains('@') {
        return Err(format!("'{}' is not an email address", email).into());
    }
    check_password(password, force)?;
    let org_id = resolve_org_id(conn, org)?;

    if get_user_by_email(conn, &email)?.is_some() {
        return Err(format!("A user with email '{}' already exists", email).into());
    }

    let role_names: Vec<&str> = if roles.is_empty() {
        vec![VIEWER]
    } else {
        roles.iter().map(String::as_str).collect()
    };
    for role_name in &role_names {
        get_role_by_name(conn, role_name)?
            .ok_or_else(|| format!("Role '{}' not found", role_name))?;
    }

    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e))?;

    let created_user = insert_user(
        conn,
        NewUser {
            email,
            password_hash,
            org_id,
            name,
        },
        Some(admin_user_id),
    )?;
    for role_name in &role_names {
        assign_user_role_by_name(conn, created_user.id, role_name)?;
    }

    println!("User created successfully!");
    println!("ID: {}", created_user.id);
    println!("Email: {}", created_user.email);
    println!("Org ID: {}", created_user.org_id);
    println!("Roles: {}", role_names.join(", "));

    Ok(created_user.id)
}

pub fn change_password_impl(
    conn: &mut SqliteConnection,
    email: &str,
    password: &str,
    force: bool,
    admin_user_id: i32,
) -> CliResult<()> {
    check_password(password, force)?;
    let user = get_user_by_email(conn, email)?
        .ok_or_else(|| format!("User with email '{}' not found", email))?;

    let password_hash =
        hash_password(password).map_err(|e| format!("Failed to hash password: {}", e))?;
    update_user(conn, user.id, None, Some(password_hash), None, Some(admin_user_id))?;
    let revoked = revoke_user_sessions(conn, user.id)?;

    println!("Password changed successfully for user: {}", user.email);
    if revoked > 0 {
        println!("Revoked {} open session(s).", revoked);
    }
    Ok(())
}

pub fn list_users_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
    org: Option<String>,
) -> CliResult<()> {
    let filter = SearchFilter::new(search_term, fixed_string)?;
    let org_scope = match org {
        Some(identifier) => Some(resolve_org_id(conn, &identifier)?),
        None => None,
    };

    let users: Vec<_> = list_all_pages(|page| list_users_with_roles(conn, org_scope, page))?
        .into_iter()
        .filter(|user| filter.matches(&user.email))
        .collect();

    if users.is_empty() {
        println!("No users found.");
    } else {
        println!("Users:");
        for user in users {
            let roles: Vec<&str> = user.roles.iter().map(|r| r.name.as_str()).collect();
            println!(
                "  ID: {}, Email: {}, Org ID: {}, Name: {}, Roles: {}",
                user.id,
                user.email,
                user.org_id,
                user.name.as_deref().unwrap_or("-"),
                roles.join(",")
            );
        }
    }

    Ok(())
}

pub fn remove_users_impl(
    conn: &mut SqliteConnection,
    search_term: String,
    fixed_string: bool,
    yes: bool,
    admin_user_id: i32,
) -> CliResult<usize> {
    let filter = SearchFilter::new(Some(search_term), fixed_string)?;
    let matching_users: Vec<_> = list_all_pages(|page| list_users_with_roles(conn, None, page))?
        .into_iter()
        .filter(|user| user.id != admin_user_id && filter.matches(&user.email))
        .collect();

    if matching_users.is_empty() {
        println!("No users found matching the search term.");
        return Ok(0);
    }

    println!("Found {} user(s) matching the search term:", matching_users.len());
    for user in &matching_users {
        println!("  ID: {}, Email: {}, Org ID: {}", user.id, user.email, user.org_id);
    }

    if !yes
        && !confirm(&format!(
            "Are you sure you want to delete these {} user(s)?",
            matching_users.len()
        ))?
    {
        println!("Operation cancelled.");
        return Ok(0);
    }

    let mut deleted_count = 0;
    let mut errors = Vec::new();

    for user in matching_users {
        match delete_user_with_cleanup(conn, user.id, Some(admin_user_id)) {
            Ok(rows_affected) => {
                if rows_affected > 0 {
                    deleted_count += 1;
                    println!("Deleted user: {} (ID: {})", user.email, user.id);
                }
            }
            Err(e) => {
                errors.push(format!(
                    "Failed to delete user {} (ID: {}): {}",
                    user.email, user.id, e
                ));
            }
        }
    }

    println!("Successfully deleted {} user(s).", deleted_count);

    if !errors.is_empty() {
        println!("Errors encountered:");
        for error in errors {
            println!("  {}", error);
        }
        return Err("Some deletions failed".into());
    }

    Ok(deleted_count)
}

pub fn user_edit_impl(
    conn: &mut SqliteConnection,
    user_id: i32,
    new_email: Option<String>,
    new_name: Option<String>,
    admin_user_id: i32,
) -> CliResult<()> {
    get_user(conn, user_id)?.ok_or_else(|| format!("User with ID {} not found", user_id))?;

    if new_email.is_none() && new_name.is_none() {
        println!("No fields specified for update. Use --email or --name.");
        return Ok(());
    }

    let new_email = new_email.map(|e| e.trim().to_lowercase());
    if let Some(ref email) = new_email {
        if let Some(existing) = get_user_by_email(conn, email)? {
            if existing.id != user_id {
                return Err(format!("A user with email '{}' already exists", email).into());
            }
        }
    }

    let updated_user = update_user(conn, user_id, new_email, None, new_name, Some(admin_user_id))?;

    println!("User updated successfully!");
    println!("ID: {}", updated_user.id);
    println!("Email: {}", updated_user.email);
    println!("Name: {}", updated_user.name.as_deref().unwrap_or("-"));

    Ok(())
}

pub fn grant_role_impl(conn: &mut SqliteConnection, email: &str, role_name: &str) -> CliResult<()> {
    let user = get_user_by_email(conn, email)?
        .ok_or_else(|| format!("User with email '{}' not found", email))?;

    get_role_by_name(conn, role_name)?.ok_or_else(|| format!("Role '{}' not found", role_name))?;

    let current_roles = get_user_roles(conn, user.id)?;
    if current_roles.iter().any(|r| r.name == role_name) {
        println!("User '{}' already has role '{}'", email, role_name);
        return Ok(());
    }

    assign_user_role_by_name(conn, user.id, role_name)?;
    println!("Successfully added role '{}' to user '{}'", role_name, email);

    Ok(())
}

pub fn revoke_role_impl(conn: &mut SqliteConnection, email: &str, role_name: &str) -> CliResult<()> {
    let user = get_user_by_email(conn, email)?
        .ok_or_else(|| format!("User with email '{}' not found", email))?;

    match remove_user_role_by_name(conn, user.id, role_name)? {
        RoleRemoval::Removed => {
            println!("Successfully removed role '{}' from user '{}'", role_name, email);
            Ok(())
        }
        RoleRemoval::NotAssigned => {
            println!("User '{}' does not have role '{}'", email, role_name);
            Ok(())
        }
        RoleRemoval::LastRole => Err(format!(
            "Cannot remove role '{}' from user '{}': users must have at least one role",
            role_name, email
        )
        .into()),
    }
}

/// Walks every page of a paged listing.
fn list_all_pages<T, F>(mut fetch: F) -> Result<Vec<T>, diesel::result::Error>
where
    F: FnMut(Page) -> Result<Vec<T>, diesel::result::Error>,
{
    let mut all = Vec::new();
    let mut page = Page::new(Some(construtor_api::orm::MAX_PAGE_SIZE), Some(0));
    loop {
        let batch = fetch(page)?;
        let fetched = batch.len() as i64;
        all.extend(batch);
        if fetched < page.limit {
            return Ok(all);
        }
        page.offset += page.limit;
    }
}
