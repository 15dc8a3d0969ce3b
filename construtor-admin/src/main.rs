//! Administrative CLI for a Meta Construtor SQLite database.
//!
//! Works directly on the database named by `DATABASE_URL`, through the same
//! ORM functions the API uses. Changes are recorded in the activity log as
//! made by `<system user>@localhost`, a platform admin created on first use.
//!
//! Run with `--help` for the available commands.

use clap::{Parser, Subcommand};

mod admin_cli;

use admin_cli::obra_commands::{ObraAction, handle_obra_command_with_conn};
use admin_cli::org_commands::{OrgAction, handle_org_command_with_conn};
use admin_cli::rate_limit_commands::{RateLimitAction, handle_rate_limit_command_with_conn};
use admin_cli::user_commands::{UserAction, handle_user_command_with_conn};
use admin_cli::utils::{establish_connection, get_or_create_admin_user};

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "construtor-admin")]
#[command(about = "Administrative CLI for Meta Construtor database management")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Manage organizations")]
    Org {
        #[command(subcommand)]
        action: OrgAction,
    },
    #[command(about = "Manage users and their roles")]
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    #[command(about = "Inspect and restore obras")]
    Obra {
        #[command(subcommand)]
        action: ObraAction,
    },
    #[command(about = "Maintain request rate limit counters")]
    RateLimit {
        #[command(subcommand)]
        action: RateLimitAction,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.version_info {
        println!("construtor-admin {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return Ok(());
    }

    let Some(command) = cli.command else {
        return Err("No command given; run with --help".into());
    };

    let mut conn = establish_connection()?;

    match command {
        Commands::Org { action } => {
            let admin_user_id = get_or_create_admin_user(&mut conn)?;
            handle_org_command_with_conn(&mut conn, action, admin_user_id)?
        }
        Commands::User { action } => {
            let admin_user_id = get_or_create_admin_user(&mut conn)?;
            handle_user_command_with_conn(&mut conn, action, admin_user_id)?
        }
        Commands::Obra { action } => {
            let admin_user_id = get_or_create_admin_user(&mut conn)?;
            handle_obra_command_with_conn(&mut conn, action, admin_user_id)?
        }
        Commands::RateLimit { action } => handle_rate_limit_command_with_conn(&mut conn, action)?,
    }

    Ok(())
}
