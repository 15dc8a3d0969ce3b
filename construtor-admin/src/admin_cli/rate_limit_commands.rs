use chrono::{Duration, NaiveDateTime, Utc};
use clap::Subcommand;
use diesel::sqlite::SqliteConnection;

use construtor_api::orm::rate_limit::prune_rate_limits;

use super::utils::CliResult;

#[derive(Subcommand)]
pub enum RateLimitAction {
    #[command(about = "Delete request counters whose window started long ago")]
    Prune {
        #[arg(long, default_value_t = 24, help = "Age in hours of the oldest counter to keep")]
        older_than_hours: i64,
    },
}

pub fn handle_rate_limit_command_with_conn(
    conn: &mut SqliteConnection,
    action: RateLimitAction,
) -> CliResult<()> {
    match action {
        RateLimitAction::Prune { older_than_hours } => {
            let removed = prune_impl(conn, older_than_hours, Utc::now().naive_utc())?;
            println!("Removed {} rate limit counter(s).", removed);
        }
    }
    Ok(())
}

pub fn prune_impl(conn: &mut SqliteConnection, older_than_hours: i64, now: NaiveDateTime) -> CliResult<usize> {
    if older_than_hours < 0 {
        return Err("--older-than-hours cannot be negative".into());
    }
    let cutoff = Duration::try_hours(older_than_hours)
        .and_then(|age| now.checked_sub_signed(age))
        .ok_or("--older-than-hours is out of range")?;
    Ok(prune_rate_limits(conn, cutoff)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use construtor_api::orm::rate_limit::{check_rate_limit, get_rate_limit_entry};
    use construtor_api::orm::testing::setup_test_db;

    #[test]
    fn test_prune_keeps_recent_counters() {
        let mut conn = setup_test_db();
        let now = Utc::now().naive_utc();
        check_rate_limit(&mut conn, "10.0.0.1", "GET /api/obras", 10, 60, now - Duration::hours(30)).unwrap();
        check_rate_limit(&mut conn, "10.0.0.2", "GET /api/obras", 10, 60, now - Duration::hours(1)).unwrap();

        assert_eq!(prune_impl(&mut conn, 24, now).unwrap(), 1);
        assert!(get_rate_limit_entry(&mut conn, "10.0.0.1", "GET /api/obras").unwrap().is_none());
        assert!(get_rate_limit_entry(&mut conn, "10.0.0.2", "GET /api/obras").unwrap().is_some());
        assert!(prune_impl(&mut conn, -1, now).is_err());
    }

    #[test]
    fn test_prune_rejects_out_of_range_age() {
        let mut conn = setup_test_db();
        let now = Utc::now().naive_utc();
        check_rate_limit(&mut conn, "10.0.0.1", "GET /api/obras", 10, 60, now).unwrap();

        assert!(prune_impl(&mut conn, i64::MAX, now).is_err());
        assert!(get_rate_limit_entry(&mut conn, "10.0.0.1", "GET /api/obras").unwrap().is_some());
    }
}
