//! Health and version endpoint.

use rocket::{Route, serde::json::Json};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::rate_limit::RateLimited;

pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

#[derive(Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HealthStatus {
    pub status: String,
    pub version: String,
    pub built: String,
    pub git_commit: Option<String>,
}

/// Health Status endpoint.
///
/// - **URL:** `/api/status`
/// - **Method:** `GET`
/// - **Authentication:** None required
///
/// ```json
/// {
///   "status": "running",
///   "version": "0.1.0",
///   "built": "Fri, 15 Aug 2025 18:13:43 +0000",
///   "git_commit": "cd51275141a2e7d49737aa7dd4e8ff7c9a804d67"
/// }
/// ```
#[get("/status")]
pub fn health_status(_rate: RateLimited) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        built: built_info::BUILT_TIME_UTC.to_string(),
        git_commit: built_info::GIT_COMMIT_HASH.map(str::to_string),
    })
}

pub fn routes() -> Vec<Route> {
    routes![health_status]
}
