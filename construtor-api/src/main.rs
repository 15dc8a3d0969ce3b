use clap::Parser;
use rocket::error;
use rocket::figment::Figment;
use rocket::info;

use construtor_api::config::AppConfig;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Parser)]
#[command(name = "construtor-api")]
#[command(about = "Meta Construtor API server for construction site management")]
#[command(version)]
struct Cli {
    /// Show extended version information
    #[arg(long, action = clap::ArgAction::SetTrue)]
    version_info: bool,

    /// SQLite database to open, overriding DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    #[arg(long)]
    address: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    /// Lifetime of new login sessions
    #[arg(long)]
    session_ttl_hours: Option<i64>,

    /// Serve without per-client request counters
    #[arg(long, action = clap::ArgAction::SetTrue)]
    no_rate_limit: bool,

    /// Print the effective application settings as JSON and exit
    #[arg(long, action = clap::ArgAction::SetTrue)]
    print_config: bool,
}

/// Layers command line options over the file and environment settings.
fn apply_cli(mut figment: Figment, cli: &Cli) -> Result<Figment, String> {
    if let Some(url) = &cli.database_url {
        figment = figment.merge(("databases.sqlite_db.url", url.clone()));
    }
    if let Some(address) = &cli.address {
        figment = figment.merge(("address", address.clone()));
    }
    if let Some(port) = cli.port {
        figment = figment.merge(("port", port));
    }
    if let Some(ttl) = cli.session_ttl_hours {
        if ttl <= 0 {
            return Err(format!("--session-ttl-hours must be positive, got {}", ttl));
        }
        figment = figment.merge(("session_ttl_hours", ttl));
    }
    if cli.no_rate_limit {
        figment = figment.merge(("rate_limit.enabled", false));
    }
    Ok(figment)
}

#[rocket::main]
async fn main() {
    let cli = Cli::parse();

    if cli.version_info {
        println!("construtor-api {}", built_info::PKG_VERSION);
        println!("Built: {}", built_info::BUILT_TIME_UTC);
        if let Some(commit) = built_info::GIT_COMMIT_HASH {
            println!("Git commit: {}", commit);
        }
        return;
    }

    let figment = match apply_cli(construtor_api::server_figment(), &cli) {
        Ok(figment) => figment,
        Err(e) => {
            error!("{}", e);
            std::process::exit(2);
        }
    };

    if cli.print_config {
        match figment.extract::<AppConfig>() {
            Ok(settings) => match serde_json::to_string_pretty(&settings) {
                Ok(text) => println!("{}", text),
                Err(e) => error!("Could not render settings: {}", e),
            },
            Err(e) => {
                error!("Invalid settings: {}", e);
                std::process::exit(2);
            }
        }
        return;
    }

    info!(
        "Meta Construtor API v{} starting (built {}, commit {})",
        built_info::PKG_VERSION,
        built_info::BUILT_TIME_UTC,
        built_info::GIT_COMMIT_HASH.unwrap_or("unknown")
    );
    if cli.no_rate_limit {
        info!("Rate limiting disabled from the command line");
    }

    if let Err(e) = construtor_api::rocket_from(figment).launch().await {
        error!("Meta Construtor API failed to launch: {}", e);
        std::process::exit(1);
    }
}
