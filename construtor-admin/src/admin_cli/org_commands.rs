use clap::Subcommand;
use diesel::sqlite::SqliteConnection;

use construtor_api::admin_init_fairing::PLATFORM_ORG_NAME;
use construtor_api::models::Org;
use construtor_api::orm::entity_activity::get_created_at;
use construtor_api::orm::org::{
    get_org_by_name, get_org_including_deleted, insert_org, list_all_orgs_including_deleted,
    restore_org, soft_delete_org, update_org,
};

use super::utils::{CliResult, SearchFilter, confirm, resolve_org_id};

#[derive(Subcommand)]
pub enum OrgAction {
    #[command(about = "List orgs, optionally filtered by search term")]
    Ls {
        #[arg(help = "Search term (regex by default, use -F for fixed string)")]
        search_term: Option<String>,
        #[arg(
            short = 'F',
            long = "fixed-string",
            help = "Treat search term as fixed string instead of regex"
        )]
        fixed_string: bool,
        #[arg(long, help = "Include soft-deleted orgs")]
        deleted: bool,
    },
    #[command(about = "Add a new org")]
    Add {
        #[arg(short, long, help = "Org name")]
        name: String,
        #[arg(short, long, help = "CNPJ (punctuation optional)")]
        cnpj: Option<String>,
    },
    #[command(about = "Soft-delete orgs matching search term")]
    Rm {
        #[arg(help = "Search term to match orgs for removal (regex by default, use -F for fixed string)")]
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
    #[command(about = "Edit org fields")]
    Edit {
        #[arg(help = "Org ID or name")]
        org: String,
        #[arg(long, help = "New name")]
        name: Option<String>,
        #[arg(long, help = "New CNPJ (punctuation optional)")]
        cnpj: Option<String>,
    },
    #[command(about = "Restore a soft-deleted org")]
    Restore {
        #[arg(short, long, help = "Org ID")]
        id: i32,
    },
}

pub fn handle_org_command_with_conn(
    conn: &mut SqliteConnection,
    action: OrgAction,
    admin_user_id: i32,
) -> CliResult<()> {
    match action {
        OrgAction::Ls {
            search_term,
            fixed_string,
            deleted,
        } => {
            list_orgs_impl(conn, search_term, fixed_string, deleted)?;
        }
        OrgAction::Add { name, cnpj } => {
            add_org_impl(conn, &name, cnpj.as_deref(), admin_user_id)?;
        }
        OrgAction::Rm {
            search_term,
            fixed_string,
            yes,
        } => {
            remove_orgs_impl(conn, search_term, fixed_string, yes, admin_user_id)?;
        }
        OrgAction::Edit { org, name, cnpj } => {
            edit_org_impl(conn, &org, name, cnpj.as_deref(), admin_user_id)?;
        }
        OrgAction::Restore { id } => {
            restore_org_impl(conn, id, admin_user_id)?;
        }
    }
    Ok(())
}

/// Checks a CNPJ and returns its canonical digits.
fn canonical_cnpj(input: &str) -> CliResult<String> {
    valida::validate_cnpj(input)
        .map(|cnpj| cnpj.digits().to_string())
        .map_err(|e| format!("Invalid CNPJ '{}': {}", input, e).into())
}

fn is_platform_org(org: &Org) -> bool {
    org.name.eq_ignore_ascii_case(PLATFORM_ORG_NAME)
}

pub fn list_orgs_impl(
    conn: &mut SqliteConnection,
    search_term: Option<String>,
    fixed_string: bool,
    include_deleted: bool,
) -> CliResult<()> {
    let filter = SearchFilter::new(search_term, fixed_string)?;
    let orgs: Vec<Org> = list_all_orgs_including_deleted(conn)?
        .into_iter()
        .filter(|org| include_deleted || org.deleted_at.is_none())
        .filter(|org| filter.matches(&org.name))
        .collect();

    if orgs.is_empty() {
        println!("No orgs found.");
        return Ok(());
    }

    println!("Orgs:");
    for org in orgs {
        let created = get_created_at(conn, "orgs", org.id)
            .map(|at| at.to_string())
            .unwrap_or_else(|_| "-".to_string());
        let deleted = match org.deleted_at {
            Some(at) => format!(", Deleted: {}", at),
            None => String::new(),
        };
        println!(
            "  ID: {}, Name: {}, CNPJ: {}, Created: {}{}",
            org.id,
            org.name,
            org.cnpj.as_deref().unwrap_or("-"),
            created,
            deleted
        );
    }
    Ok(())
}

pub fn add_org_impl(
    conn: &mut SqliteConnection,
    name: &str,
    cnpj: Option<&str>,
    admin_user_id: i32,
) -> CliResult<i32> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Org name cannot be empty".into());
    }
    let cnpj = cnpj.map(canonical_cnpj).transpose()?;

    if get_org_by_name(conn, name)?.is_some() {
        return Err(format!("An org named '{}' already exists", name).into());
    }

    let org = insert_org(conn, name.to_string(), cnpj, Some(admin_user_id))?;

    println!("Org created successfully!");
    println!("ID: {}", org.id);
    println!("Name: {}", org.name);
    if let Some(ref cnpj) = org.cnpj {
        println!("CNPJ: {}", cnpj);
    }
    Ok(org.id)
}

pub fn remove_orgs_impl(
    conn: &mut SqliteConnection,
    search_term: String,
    fixed_string: bool,
    yes: bool,
    admin_user_id: i32,
) -> CliResult<usize> {
    let filter = SearchFilter::new(Some(search_term), fixed_string)?;
    let (protected, matching_orgs): (Vec<Org>, Vec<Org>) = list_all_orgs_including_deleted(conn)?
        .into_iter()
        .filter(|org| org.deleted_at.is_none() && filter.matches(&org.name))
        .partition(is_platform_org);

    for org in &protected {
        println!("Skipping platform org '{}' (ID: {})", org.name, org.id);
    }

    if matching_orgs.is_empty() {
        println!("No orgs found matching the search term.");
        return Ok(0);
    }

    println!("Found {} org(s) matching the search term:", matching_orgs.len());
    for org in &matching_orgs {
        println!("  ID: {}, Name: {}", org.id, org.name);
    }

    if !yes
        && !confirm(&format!(
            "Are you sure you want to delete these {} org(s)? Their obras stop being visible.",
            matching_orgs.len()
        ))?
    {
        println!("Operation cancelled.");
        return Ok(0);
    }

    let mut deleted_count = 0;
    for org in matching_orgs {
        if soft_delete_org(conn, org.id, Some(admin_user_id))? > 0 {
            deleted_count += 1;
            println!("Deleted org: {} (ID: {})", org.name, org.id);
        }
    }
    println!("Successfully deleted {} org(s).", deleted_count);
    println!("Use `org restore --id <ID>` to bring one back.");

    Ok(deleted_count)
}

pub fn edit_org_impl(
    conn: &mut SqliteConnection,
    org_identifier: &str,
    new_name: Option<String>,
    new_cnpj: Option<&str>,
    admin_user_id: i32,
) -> CliResult<()> {
    let org_id = resolve_org_id(conn, org_identifier)?;

    if new_name.is_none() && new_cnpj.is_none() {
        println!("No fields specified for update. Use --name or --cnpj.");
        return Ok(());
    }

    let new_name = match new_name.map(|n| n.trim().to_string()) {
        Some(name) if name.is_empty() => return Err("Org name cannot be empty".into()),
        Some(name) => {
            if let Some(existing) = get_org_by_name(conn, &name)? {
                if existing.id != org_id {
                    return Err(format!("An org named '{}' already exists", name).into());
                }
            }
            Some(name)
        }
        None => None,
    };
    let new_cnpj = new_cnpj.map(canonical_cnpj).transpose()?;

    let org = update_org(conn, org_id, new_name, new_cnpj, Some(admin_user_id))?;

    println!("Org updated successfully!");
    println!("ID: {}", org.id);
    println!("Name: {}", org.name);
    println!("CNPJ: {}", org.cnpj.as_deref().unwrap_or("-"));
    Ok(())
}

pub fn restore_org_impl(conn: &mut SqliteConnection, org_id: i32, admin_user_id: i32) -> CliResult<()> {
    let org = get_org_including_deleted(conn, org_id)?
        .ok_or_else(|| format!("Org with ID {} does not exist", org_id))?;

    if org.deleted_at.is_none() {
        println!("Org '{}' (ID: {}) is not deleted.", org.name, org.id);
        return Ok(());
    }
    if get_org_by_name(conn, &org.name)?.is_some() {
        return Err(format!("Another live org is already named '{}'", org.name).into());
    }

    restore_org(conn, org_id, Some(admin_user_id))?;
    println!("Restored org: {} (ID: {})", org.name, org.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use construtor_api::orm::org::get_org_by_id;
    use construtor_api::orm::testing::{insert_test_user, setup_test_db};

    fn setup() -> (SqliteConnection, i32) {
        let mut conn = setup_test_db();
        let admin = insert_test_user(&mut conn, "cli@localhost", &[]);
        (conn, admin.id)
    }

    #[test]
    fn test_add_org_stores_cnpj_digits() {
        let (mut conn, admin_id) = setup();

        let id = add_org_impl(&mut conn, " Construtora Alfa ", Some("11.222.333/0001-81"), admin_id).unwrap();
        let org = get_org_by_id(&mut conn, id).unwrap().unwrap();
        assert_eq!(org.name, "Construtora Alfa");
        assert_eq!(org.cnpj.as_deref(), Some("11222333000181"));

        assert!(add_org_impl(&mut conn, "construtora alfa", None, admin_id).is_err());
        assert!(add_org_impl(&mut conn, "Construtora Beta", Some("11.222.333/0001-82"), admin_id).is_err());
        assert!(add_org_impl(&mut conn, "   ", None, admin_id).is_err());
    }

    #[test]
    fn test_remove_protects_platform_org_and_restore_brings_back() {
        let (mut conn, admin_id) = setup();
        let platform = add_org_impl(&mut conn, PLATFORM_ORG_NAME, None, admin_id).unwrap();
        let alfa = add_org_impl(&mut conn, "Construtora Alfa", None, admin_id).unwrap();
        add_org_impl(&mut conn, "Incorporadora Gama", None, admin_id).unwrap();

        let deleted = remove_orgs_impl(&mut conn, "Constru".to_string(), true, true, admin_id).unwrap();
        assert_eq!(deleted, 1);
        assert!(get_org_by_id(&mut conn, platform).unwrap().is_some());
        assert!(get_org_by_id(&mut conn, alfa).unwrap().is_none());

        restore_org_impl(&mut conn, alfa, admin_id).unwrap();
        assert!(get_org_by_id(&mut conn, alfa).unwrap().is_some());
        assert!(restore_org_impl(&mut conn, 9999, admin_id).is_err());
    }

    #[test]
    fn test_restore_refuses_name_clash() {
        let (mut conn, admin_id) = setup();
        let old = add_org_impl(&mut conn, "Construtora Alfa", None, admin_id).unwrap();
        remove_orgs_impl(&mut conn, "^Construtora Alfa$".to_string(), false, true, admin_id).unwrap();
        add_org_impl(&mut conn, "Construtora Alfa", None, admin_id).unwrap();

        assert!(restore_org_impl(&mut conn, old, admin_id).is_err());
    }

    #[test]
    fn test_edit_org() {
        let (mut conn, admin_id) = setup();
        let alfa = add_org_impl(&mut conn, "Construtora Alfa", None, admin_id).unwrap();
        add_org_impl(&mut conn, "Construtora Beta", None, admin_id).unwrap();

        edit_org_impl(&mut conn, "construtora alfa", None, Some("11222333000181"), admin_id).unwrap();
        let org = get_org_by_id(&mut conn, alfa).unwrap().unwrap();
        assert_eq!(org.cnpj.as_deref(), Some("11222333000181"));
        assert_eq!(org.name, "Construtora Alfa");

        assert!(edit_org_impl(&mut conn, &alfa.to_string(), Some("Construtora Beta".to_string()), None, admin_id).is_err());
        edit_org_impl(&mut conn, &alfa.to_string(), Some("Alfa Engenharia".to_string()), None, admin_id).unwrap();
        assert_eq!(get_org_by_id(&mut conn, alfa).unwrap().unwrap().name, "Alfa Engenharia");
    }
}
