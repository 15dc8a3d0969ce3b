use clap::Subcommand;
use diesel::sqlite::SqliteConnection;

use construtor_api::models::{Obra, ObraStatus};
use construtor_api::orm::Page;
use construtor_api::orm::obra::{list_deleted_obras, list_obras, restore_obra};
use construtor_api::orm::org::get_org_by_id;

use super::utils::{CliResult, resolve_org_id};

#[derive(Subcommand)]
pub enum ObraAction {
    #[command(about = "List obras across orgs")]
    Ls {
        #[arg(short, long, help = "Only obras of this org (ID or name)")]
        org: Option<String>,
        #[arg(short, long, help = "Only obras with this status")]
        status: Option<String>,
        #[arg(long, help = "List soft-deleted obras instead")]
        deleted: bool,
        #[arg(long, default_value_t = 100, help = "Maximum rows to show")]
        limit: i64,
    },
    #[command(about = "Restore a soft-deleted obra")]
    Restore {
        #[arg(short, long, help = "Obra ID")]
        id: i32,
    },
}

pub fn handle_obra_command_with_conn(
    conn: &mut SqliteConnection,
    action: ObraAction,
    admin_user_id: i32,
) -> CliResult<()> {
    match action {
        ObraAction::Ls {
            org,
            status,
            deleted,
            limit,
        } => {
            let obras = list_obras_impl(conn, org, status, deleted, limit)?;
            print_obras(&obras, deleted);
        }
        ObraAction::Restore { id } => {
            restore_obra_impl(conn, id, admin_user_id)?;
        }
    }
    Ok(())
}

pub fn list_obras_impl(
    conn: &mut SqliteConnection,
    org: Option<String>,
    status: Option<String>,
    deleted: bool,
    limit: i64,
) -> CliResult<Vec<Obra>> {
    let org_scope = match org {
        Some(identifier) => Some(resolve_org_id(conn, &identifier)?),
        None => None,
    };
    let status = match status {
        Some(s) => Some(s.parse::<ObraStatus>()?),
        None => None,
    };

    if deleted {
        let mut obras = list_deleted_obras(conn, org_scope)?;
        if let Some(wanted) = status {
            obras.retain(|o| o.status == wanted.as_str());
        }
        obras.truncate(limit.max(0) as usize);
        Ok(obras)
    } else {
        Ok(list_obras(
            conn,
            org_scope,
            status.as_ref().map(ObraStatus::as_str),
            Page::new(Some(limit), None),
        )?)
    }
}

fn print_obras(obras: &[Obra], deleted: bool) {
    if obras.is_empty() {
        println!("No obras found.");
        return;
    }

    println!("Obras:");
    for obra in obras {
        let mut line = format!(
            "  ID: {}, Org ID: {}, Name: {}, Status: {}",
            obra.id, obra.org_id, obra.name, obra.status
        );
        if let Some(budget) = obra.budget_cents {
            line.push_str(&format!(", Budget: R$ {}.{:02}", budget / 100, budget % 100));
        }
        if deleted {
            if let Some(at) = obra.deleted_at {
                line.push_str(&format!(", Deleted: {}", at));
            }
        }
        println!("{}", line);
    }
}

pub fn restore_obra_impl(conn: &mut SqliteConnection, obra_id: i32, admin_user_id: i32) -> CliResult<()> {
    let obra = list_deleted_obras(conn, None)?
        .into_iter()
        .find(|o| o.id == obra_id)
        .ok_or_else(|| format!("No deleted obra with ID {}", obra_id))?;

    if get_org_by_id(conn, obra.org_id)?.is_none() {
        return Err(format!(
            "Org {} of obra {} is deleted; restore the org first",
            obra.org_id, obra.id
        )
        .into());
    }

    restore_obra(conn, obra_id, Some(admin_user_id))?;
    println!("Restored obra: {} (ID: {})", obra.name, obra.id);
    Ok(())
}
