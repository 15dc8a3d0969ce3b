use std::io::{self, Write};

use diesel::{prelude::*, sqlite::SqliteConnection};
use dotenvy::dotenv;
use regex::Regex;
use rpassword::read_password;

use construtor_api::{
    admin_init_fairing::PLATFORM_ORG_NAME,
    models::{NewUser, PLATFORM_ADMIN},
    orm::{
        org::{get_org_by_id, get_org_by_name, insert_org},
        run_pending_migrations, set_foreign_keys,
        user::{get_user_by_email, insert_user},
        user_role::assign_user_role_by_name,
    },
};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Stored in place of a hash for accounts that must never log in. It is not
/// a valid PHC string, so password verification always fails.
pub const NO_LOGIN_HASH: &str = "!no-login";

/// Opens the database named by `DATABASE_URL` (also read from `.env`) and
/// brings its schema up to date.
pub fn establish_connection() -> CliResult<SqliteConnection> {
    dotenv().ok();
    let database_url =
        std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set (or put it in .env)")?;
    let mut conn = SqliteConnection::establish(&database_url)?;
    set_foreign_keys(&mut conn)?;
    run_pending_migrations(&mut conn).map_err(|e| format!("Failed to run migrations: {}", e))?;
    Ok(conn)
}

/// Get or create the account changes made from the CLI are attributed to:
/// `<system user>@localhost`, a platform admin that cannot log in.
pub fn get_or_create_admin_user(conn: &mut SqliteConnection) -> CliResult<i32> {
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "admin".to_string());
    let email = format!("{}@localhost", username.to_lowercase());

    if let Some(existing_user) = get_user_by_email(conn, &email)? {
        return Ok(existing_user.id);
    }

    let platform_org = match get_org_by_name(conn, PLATFORM_ORG_NAME)? {
        Some(org) => org,
        None => insert_org(conn, PLATFORM_ORG_NAME.to_string(), None, None)?,
    };

    let created_user = insert_user(
        conn,
        NewUser {
            email: email.clone(),
            password_hash: NO_LOGIN_HASH.to_string(),
            org_id: platform_org.id,
            name: Some(format!("CLI ({})", username)),
        },
        None,
    )?;
    assign_user_role_by_name(conn, created_user.id, PLATFORM_ADMIN)?;

    println!("Created admin user: {} (ID: {})", email, created_user.id);
    Ok(created_user.id)
}

/// Resolve an org identifier (either an ID or a name, case-insensitive) to
/// the ID of a live org.
pub fn resolve_org_id(conn: &mut SqliteConnection, org_identifier: &str) -> CliResult<i32> {
    if let Ok(id) = org_identifier.parse::<i32>() {
        match get_org_by_id(conn, id)? {
            Some(_) => Ok(id),
            None => Err(format!("Org with ID {} does not exist", id).into()),
        }
    } else {
        match get_org_by_name(conn, org_identifier)? {
            Some(org) => Ok(org.id),
            None => Err(format!("Org with name '{}' does not exist", org_identifier).into()),
        }
    }
}

/// Search term given on the command line: a regex, or a plain substring
/// with `-F`.
pub enum SearchFilter {
    All,
    Fixed(String),
    Pattern(Regex),
}

impl SearchFilter {
    pub fn new(search_term: Option<String>, fixed_string: bool) -> CliResult<Self> {
        match search_term {
            None => Ok(SearchFilter::All),
            Some(term) if fixed_string => Ok(SearchFilter::Fixed(term)),
            Some(term) => Regex::new(&term)
                .map(SearchFilter::Pattern)
                .map_err(|e| format!("Invalid regex pattern '{}': {}", term, e).into()),
        }
    }

    pub fn matches(&self, text: &str) -> bool {
        match self {
            SearchFilter::All => true,
            SearchFilter::Fixed(term) => text.contains(term.as_str()),
            SearchFilter::Pattern(regex) => regex.is_match(text),
        }
    }
}

/// Asks a yes/no question on stdin; anything but `y`/`yes` is a no.
pub fn confirm(question: &str) -> CliResult<bool> {
    print!("{} [y/N]: ", question);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim().to_lowercase();
    Ok(input == "y" || input == "yes")
}

pub fn prompt_for_password() -> CliResult<String> {
    print!("Enter new password: ");
    io::stdout().flush()?;
    let password = read_password()?;

    if password.is_empty() {
        return Err("Password cannot be empty".into());
    }

    print!("Confirm new password: ");
    io::stdout().flush()?;
    let confirm_password = read_password()?;

    if password != confirm_password {
        return Err("Passwords do not match".into());
    }

    Ok(password)
}

/// Refuses passwords the API would refuse, unless `force` is set.
pub fn check_password(password: &str, force: bool) -> CliResult<()> {
    let report = valida::evaluate_password(password);
    if report.is_acceptable(construtor_api::config::AppConfig::default().password_min_score) {
        return Ok(());
    }
    let hints = report.feedback().join("; ");
    if force {
        println!("Warning: weak password accepted because of --force ({})", hints);
        Ok(())
    } else {
        Err(format!("Password too weak: {}. Use --force to set it anyway.", hints).into())
    }
}
