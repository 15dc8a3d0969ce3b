//! Database operations for user authentication and session management.
//!
//! Passwords are stored as Argon2 PHC strings. A successful login stores an
//! opaque UUID session token with an expiry and hands it to the browser in
//! the `session` cookie.

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, NaiveDateTime, Utc};
use diesel::prelude::*;
use rocket::http::{Cookie, CookieJar, SameSite, Status};
use uuid::Uuid;

use crate::models::{NewSession, User};
use crate::orm::DbConn;
use crate::orm::testing::FakeDbConn;
use crate::schema::sessions;

/// Lets the same async helpers run against the pooled `DbConn` and the
/// in-memory `FakeDbConn` used by unit tests.
pub trait DbRunner {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static;
}

impl DbRunner for DbConn {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        DbConn::run(self, f)
    }
}

impl DbRunner for FakeDbConn {
    fn run<F, R>(&self, f: F) -> impl std::future::Future<Output = R>
    where
        F: FnOnce(&mut diesel::SqliteConnection) -> R + Send + 'static,
        R: Send + 'static,
    {
        FakeDbConn::run(self, f)
    }
}

fn generate_session_token() -> String {
    Uuid::new_v4().to_string()
}

/// Finds a user by email, ignoring case and surrounding whitespace.
pub async fn find_user_by_email<D: DbRunner>(db: &D, email: &str) -> Result<Option<User>, Status> {
    let email = email.to_owned();
    db.run(move |conn| crate::orm::user::get_user_by_email(conn, &email))
        .await
        .map_err(|e| {
            error!("Database error looking up user for login: {:?}", e);
            Status::InternalServerError
        })
}

/// Checks a password against a stored Argon2 hash. A malformed hash never
/// verifies.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed_hash) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok(),
        Err(e) => {
            warn!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Hashes a password with Argon2 default parameters and a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
}

/// When a session created at `now` expires. `None` when `ttl_hours` does
/// not fit in a timestamp.
pub fn session_expiry(now: NaiveDateTime, ttl_hours: i64) -> Option<NaiveDateTime> {
    Duration::try_hours(ttl_hours).and_then(|ttl| now.checked_add_signed(ttl))
}

/// Creates a session that expires after `ttl_hours` and returns its token.
pub async fn create_and_store_session<D: DbRunner>(
    db: &D,
    user_id: i32,
    ttl_hours: i64,
) -> Result<String, Status> {
    let session_token = generate_session_token();
    let now = Utc::now().naive_utc();
    let expires_at = session_expiry(now, ttl_hours).ok_or_else(|| {
        error!("session_ttl_hours {} is out of range", ttl_hours);
        Status::InternalServerError
    })?;

    let new_session = NewSession {
        id: session_token.clone(),
        user_id,
        created_at: now,
        expires_at: Some(expires_at),
        revoked: false,
    };

    db.run(move |conn| {
        diesel::insert_into(sessions::table)
            .values(&new_session)
            .execute(conn)
    })
    .await
    .map_err(|e| {
        error!("Failed to store session: {:?}", e);
        Status::InternalServerError
    })?;

    Ok(session_token)
}

/// Builds the session cookie: HTTP-only, SameSite=Lax, secure outside
/// tests.
pub fn session_cookie(session_token: &str) -> Cookie<'static> {
    Cookie::build(("session", session_token.to_string()))
        .http_only(true)
        .secure(!cfg!(test))
        .same_site(SameSite::Lax)
        .path("/")
        .build()
}

/// Validates credentials, stores a session and sets the cookie.
///
/// Unknown emails, wrong passwords and users of a deleted org all answer 401
/// so accounts cannot be enumerated; blank credentials answer 400.
pub async fn process_login<D: DbRunner>(
    db: &D,
    cookies: &CookieJar<'_>,
    login: &crate::api::login::LoginRequest,
    ttl_hours: i64,
) -> Result<User, Status> {
    if login.email.trim().is_empty() || login.password.is_empty() {
        return Err(Status::BadRequest);
    }

    let user = match find_user_by_email(db, &login.email).await? {
        Some(user) => user,
        None => return Err(Status::Unauthorized),
    };

    if !verify_password(&login.password, &user.password_hash) {
        return Err(Status::Unauthorized);
    }

    let org_id = user.org_id;
    let org = db
        .run(move |conn| crate::orm::org::get_org_by_id(conn, org_id))
        .await
        .map_err(|e| {
            error!("Database error loading org for login: {:?}", e);
            Status::InternalServerError
        })?;
    if org.is_none() {
        info!("Login refused for user {}: org {} is deleted", user.id, org_id);
        return Err(Status::Unauthorized);
    }

    let session_token = create_and_store_session(db, user.id, ttl_hours).await?;
    cookies.add(session_cookie(&session_token));

    Ok(user)
}
