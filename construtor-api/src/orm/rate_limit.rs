//! Fixed-window request counting.
//!
//! One row per (identifier, endpoint) holds the start of the current window
//! and the number of requests seen in it.

use chrono::{Duration, NaiveDateTime};
use diesel::prelude::*;

use crate::models::{NewRateLimitEntry, RateLimitEntry};

/// Records a request and returns whether it is allowed.
///
/// A missing row or an expired window starts a new window with a count of
/// one. A full window denies without incrementing. Runs in one transaction
/// so concurrent checks cannot both take the last slot.
pub fn check_rate_limit(
    conn: &mut SqliteConnection,
    identifier_val: &str,
    endpoint_val: &str,
    max_requests: i32,
    window_seconds: i64,
    now: NaiveDateTime,
) -> Result<bool, diesel::result::Error> {
    use crate::schema::rate_limits::dsl::*;

    conn.transaction::<_, diesel::result::Error, _>(|conn| {
        let entry = rate_limits
            .filter(identifier.eq(identifier_val))
            .filter(endpoint.eq(endpoint_val))
            .select(RateLimitEntry::as_select())
            .first(conn)
            .optional()?;

        let entry = match entry {
            Some(entry) => entry,
            None => {
                diesel::insert_into(rate_limits)
                    .values(&NewRateLimitEntry {
                        identifier: identifier_val.to_string(),
                        endpoint: endpoint_val.to_string(),
                        window_start: now,
                        request_count: 1,
                    })
                    .execute(conn)?;
                return Ok(true);
            }
        };

        if now - entry.window_start >= Duration::seconds(window_seconds) {
            diesel::update(rate_limits.filter(id.eq(entry.id)))
                .set((window_start.eq(now), request_count.eq(1)))
                .execute(conn)?;
            return Ok(true);
        }

        if entry.request_count >= max_requests {
            return Ok(false);
        }

        diesel::update(rate_limits.filter(id.eq(entry.id)))
            .set(request_count.eq(request_count + 1))
            .execute(conn)?;
        Ok(true)
    })
}

/// Gets the counter row of one (identifier, endpoint) pair.
pub fn get_rate_limit_entry(
    conn: &mut SqliteConnection,
    identifier_val: &str,
    endpoint_val: &str,
) -> Result<Option<RateLimitEntry>, diesel::result::Error> {
    use crate::schema::rate_limits::dsl::*;
    rate_limits
        .filter(identifier.eq(identifier_val))
        .filter(endpoint.eq(endpoint_val))
        .select(RateLimitEntry::as_select())
        .first(conn)
        .optional()
}

/// Deletes counters whose window started before `older_than`. Returns the
/// number of rows removed.
pub fn prune_rate_limits(
    conn: &mut SqliteConnection,
    older_than: NaiveDateTime,
) -> Result<usize, diesel::result::Error> {
    use crate::schema::rate_limits::dsl::*;
    diesel::delete(rate_limits.filter(window_start.lt(older_than))).execute(conn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orm::testing::setup_test_db;
    use chrono::NaiveDate;

    fn at(seconds: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
            + Duration::seconds(seconds)
    }

    #[test]
    fn test_allows_up_to_max_then_denies() {
        let mut conn = setup_test_db();
        for _ in 0..3 {
            assert!(check_rate_limit(&mut conn, "10.0.0.1", "POST /api/login", 3, 60, at(0)).unwrap());
        }
        assert!(!check_rate_limit(&mut conn, "10.0.0.1", "POST /api/login", 3, 60, at(10)).unwrap());

        // denied requests do not consume the counter
        let entry = get_rate_limit_entry(&mut conn, "10.0.0.1", "POST /api/login")
            .unwrap()
            .unwrap();
        assert_eq!(entry.request_count, 3);
    }

    #[test]
    fn test_window_expiry_resets_count() {
        let mut conn = setup_test_db();
        assert!(check_rate_limit(&mut conn, "ip", "GET /api/obras", 1, 60, at(0)).unwrap());
        assert!(!check_rate_limit(&mut conn, "ip", "GET /api/obras", 1, 60, at(59)).unwrap());
        assert!(check_rate_limit(&mut conn, "ip", "GET /api/obras", 1, 60, at(60)).unwrap());

        let entry = get_rate_limit_entry(&mut conn, "ip", "GET /api/obras").unwrap().unwrap();
        assert_eq!(entry.window_start, at(60));
        assert_eq!(entry.request_count, 1);
    }

    #[test]
    fn test_counters_are_per_identifier_and_endpoint() {
        let mut conn = setup_test_db();
        assert!(check_rate_limit(&mut conn, "a", "GET /api/obras", 1, 60, at(0)).unwrap());
        assert!(check_rate_limit(&mut conn, "b", "GET /api/obras", 1, 60, at(0)).unwrap());
        assert!(check_rate_limit(&mut conn, "a", "GET /api/rdos", 1, 60, at(0)).unwrap());
        assert!(!check_rate_limit(&mut conn, "a", "GET /api/obras", 1, 60, at(1)).unwrap());
    }

    #[test]
    fn test_prune_removes_old_windows() {
        let mut conn = setup_test_db();
        check_rate_limit(&mut conn, "old", "GET /api/obras", 5, 60, at(0)).unwrap();
        check_rate_limit(&mut conn, "new", "GET /api/obras", 5, 60, at(600)).unwrap();

        assert_eq!(prune_rate_limits(&mut conn, at(300)).unwrap(), 1);
        assert!(get_rate_limit_entry(&mut conn, "old", "GET /api/obras").unwrap().is_none());
        assert!(get_rate_limit_entry(&mut conn, "new", "GET /api/obras").unwrap().is_some());
    }
}
