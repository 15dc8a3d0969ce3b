//! Request guard enforcing the fixed-window rate limit.
//!
//! Requests are counted per client IP and per route (`"POST /api/login"`,
//! `"GET /api/obras/<id>"`). When the limit is hit the guard fails with 429,
//! which the catcher renders as JSON. Any failure of the check itself lets
//! the request through.

use chrono::Utc;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{self, FromRequest, Request};

use crate::config::AppConfig;
use crate::orm::DbConn;
use crate::orm::rate_limit::check_rate_limit;

/// Proof that the request was within its rate limit.
#[derive(Debug)]
pub struct RateLimited;

fn client_identifier(request: &Request<'_>) -> String {
    request
        .client_ip()
        .map(|ip| ip.to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn endpoint_key(request: &Request<'_>) -> String {
    match request.route() {
        Some(route) => format!("{} {}", route.method, route.uri),
        None => format!("{} {}", request.method(), request.uri().path()),
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RateLimited {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> request::Outcome<Self, Self::Error> {
        let settings = match request.rocket().state::<AppConfig>() {
            Some(config) => config.rate_limit.clone(),
            None => {
                warn!("Rate limit settings missing; request allowed");
                return Outcome::Success(RateLimited);
            }
        };
        if !settings.enabled {
            return Outcome::Success(RateLimited);
        }

        let db = match request.guard::<DbConn>().await {
            Outcome::Success(db) => db,
            _ => {
                warn!("No database connection for rate limit check; request allowed");
                return Outcome::Success(RateLimited);
            }
        };

        let identifier = client_identifier(request);
        let endpoint = endpoint_key(request);
        let now = Utc::now().naive_utc();

        let log_identifier = identifier.clone();
        let log_endpoint = endpoint.clone();
        let verdict = db
            .run(move |conn| {
                check_rate_limit(
                    conn,
                    &identifier,
                    &endpoint,
                    settings.max_requests,
                    settings.window_seconds,
                    now,
                )
            })
            .await;

        match verdict {
            Ok(true) => Outcome::Success(RateLimited),
            Ok(false) => {
                info!("Rate limit exceeded: {} on {}", log_identifier, log_endpoint);
                Outcome::Error((Status::TooManyRequests, ()))
            }
            Err(e) => {
                warn!(
                    "Rate limit check failed for {} on {}; request allowed: {:?}",
                    log_identifier, log_endpoint, e
                );
                Outcome::Success(RateLimited)
            }
        }
    }
}
