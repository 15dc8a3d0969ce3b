#[macro_use]
extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::figment::value::Map;
use rocket::figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use rocket::http::Status;
use rocket::request::Request;
use rocket::serde::json::{Json, Value, json};
use rocket::{Build, Rocket};

pub mod admin_init_fairing;
pub mod api;
pub mod config;
pub mod logged_json;
pub mod models;
pub mod normalize;
pub mod orm;
pub use orm::DbConn;
pub mod rate_limit;
pub mod schema;
pub mod session_guards;

#[cfg(test)]
pub mod generate_types;

fn error_body(message: &str, req: &Request, status: Status) -> Json<Value> {
    Json(json!({
        "error": message,
        "path": req.uri().path().to_string(),
        "status": status.code
    }))
}

#[catch(401)]
fn unauthorized(req: &Request) -> Json<Value> {
    error_body("Unauthorized", req, Status::Unauthorized)
}

#[catch(403)]
fn forbidden(req: &Request) -> Json<Value> {
    error_body("Forbidden", req, Status::Forbidden)
}

#[catch(404)]
fn not_found(req: &Request) -> Json<Value> {
    error_body("Not Found", req, Status::NotFound)
}

// Rocket answers unmatched methods with 404; this covers explicit 405s.
#[catch(405)]
fn method_not_allowed(req: &Request) -> Json<Value> {
    error_body("Method Not Allowed", req, Status::MethodNotAllowed)
}

#[catch(422)]
fn unprocessable_entity(req: &Request) -> Json<Value> {
    error_body("Unprocessable Entity", req, Status::UnprocessableEntity)
}

#[catch(429)]
fn too_many_requests(req: &Request) -> Json<Value> {
    error_body("Too many requests, slow down", req, Status::TooManyRequests)
}

#[catch(500)]
fn internal_server_error(req: &Request) -> Json<Value> {
    error_body("Internal Server Error", req, Status::InternalServerError)
}

#[catch(default)]
fn default_catcher(status: Status, req: &Request) -> Json<Value> {
    error_body(status.reason().unwrap_or("Unknown Error"), req, status)
}

pub fn mount_api_routes(rocket: Rocket<Build>) -> Rocket<Build> {
    rocket.mount("/api", api::routes())
}

fn log_rocket_info(rocket: &Rocket<Build>) {
    let figment = rocket.figment();

    if let Ok(address) = figment.extract_inner::<String>("address") {
        info!("Rocket is running at: {}", address);
    }

    if let Ok(port) = figment.extract_inner::<u16>("port") {
        info!("Rocket is listening on port: {}", port);
    }

    match figment.extract_inner::<Map<String, Value>>("databases.sqlite_db") {
        Ok(db_config) => {
            if let Some(Value::String(url)) = db_config.get("url") {
                info!("Database URL: {}", url);
            } else {
                warn!("Database URL not found in configuration");
            }
        }
        Err(e) => {
            warn!("Failed to extract database configuration: {}", e);
        }
    }

    match figment.extract_inner::<i32>("rate_limit.max_requests") {
        Ok(max) => info!("Rate limit: {} requests per window", max),
        Err(_) => info!("Rate limit: defaults"),
    }
}

/// Attaches the database, migrations, admin bootstrap, settings and
/// catchers to a Rocket built from `figment`, and mounts the API.
///
/// Shared by the server and the test harness, which only differ in the
/// figment they pass.
pub fn build_rocket(figment: Figment) -> Rocket<Build> {
    let rocket = rocket::custom(figment)
        .attach(DbConn::fairing())
        .attach(orm::set_foreign_keys_fairing())
        .attach(orm::run_migrations_fairing())
        .attach(admin_init_fairing::admin_init_fairing())
        .attach(AdHoc::config::<config::AppConfig>())
        .register(
            "/",
            catchers![
                unauthorized,
                forbidden,
                not_found,
                method_not_allowed,
                unprocessable_entity,
                too_many_requests,
                internal_server_error,
                default_catcher
            ],
        );

    mount_api_routes(rocket)
}

/// The production Rocket: `Rocket.toml`, then `ROCKET_*` variables, then
/// `DATABASE_URL` (also read from `.env`).
///
/// Tests do not go through here; they build on `orm::testing::test_rocket`.
pub fn rocket() -> Rocket<Build> {
    rocket_from(server_figment())
}

/// Server settings: Rocket defaults, then `Rocket.toml`, then `ROCKET_*`
/// variables, then `DATABASE_URL` (read from `.env` when present).
pub fn server_figment() -> Figment {
    if let Err(e) = dotenvy::dotenv() {
        info!("No .env file loaded: {}", e);
    }

    let figment = Figment::from(rocket::Config::default())
        .merge(Toml::file("Rocket.toml").nested())
        .merge(Env::prefixed("ROCKET_").global());

    match std::env::var("DATABASE_URL") {
        Ok(database_url) => figment.merge(("databases.sqlite_db.url", database_url)),
        Err(_) => {
            warn!("DATABASE_URL is not set; using databases.sqlite_db from Rocket.toml");
            figment
        }
    }
}

/// Builds the server from an already assembled figment and logs where it
/// will listen and which database it opens.
pub fn rocket_from(figment: Figment) -> Rocket<Build> {
    let rocket = build_rocket(figment);
    log_rocket_info(&rocket);
    rocket
}
