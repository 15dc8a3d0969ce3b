use chrono::{Duration, Utc};
use diesel::prelude::*;
use rocket::http::{ContentType, Cookie, Status};
use rocket::local::asynchronous::{Client, LocalResponse};
use rocket::serde::json::{Value, json};

use construtor_api::DbConn;
use construtor_api::models::NewSession;
use construtor_api::orm::testing::test_rocket;
use construtor_api::schema::sessions;

async fn login<'c>(client: &'c Client, email: &str, password: &str) -> LocalResponse<'c> {
    client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await
}

async fn login_and_get_session(client: &Client, email: &str) -> Cookie<'static> {
    let response = login(client, email, "admin").await;
    assert_eq!(response.status(), Status::Ok);
    response
        .cookies()
        .get("session")
        .expect("Session cookie should be set")
        .clone()
        .into_owned()
}

#[rocket::async_test]
async fn test_login_sets_http_only_cookie_and_returns_profile() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = login(&client, "admin@alfa.com", "admin").await;
    assert_eq!(response.status(), Status::Ok);

    let cookie = response.cookies().get("session").expect("session cookie").clone();
    assert_eq!(cookie.http_only(), Some(true));

    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["email"], "admin@alfa.com");
    assert_eq!(body["org_name"], "Construtora Alfa");
    assert_eq!(body["roles"], json!(["admin"]));
}

#[rocket::async_test]
async fn test_login_is_case_insensitive_on_email() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = login(&client, "  Editor@Alfa.com ", "admin").await;
    assert_eq!(response.status(), Status::Ok);
}

#[rocket::async_test]
async fn test_bad_credentials_are_indistinguishable() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let wrong_password = login(&client, "admin@alfa.com", "nope").await;
    assert_eq!(wrong_password.status(), Status::Unauthorized);
    assert!(wrong_password.cookies().get("session").is_none());
    let wrong_password: Value = wrong_password.into_json().await.expect("valid JSON response");

    let unknown_user = login(&client, "ninguem@alfa.com", "admin").await;
    assert_eq!(unknown_user.status(), Status::Unauthorized);
    let unknown_user: Value = unknown_user.into_json().await.expect("valid JSON response");

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(unknown_user["error"], "Invalid credentials");
}

#[rocket::async_test]
async fn test_empty_credentials_are_a_bad_request() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = login(&client, "", "").await;
    assert_eq!(response.status(), Status::BadRequest);
}

#[rocket::async_test]
async fn test_me_requires_session() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.get("/api/me").dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["status"], 401);
    assert_eq!(body["path"], "/api/me");

    let forged = client
        .get("/api/me")
        .cookie(Cookie::new("session", "not-a-session"))
        .dispatch()
        .await;
    assert_eq!(forged.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn test_me_returns_current_user() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let session = login_and_get_session(&client, "viewer@alfa.com").await;

    let response = client.get("/api/me").cookie(session).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["email"], "viewer@alfa.com");
    assert_eq!(body["roles"], json!(["viewer"]));
}

#[rocket::async_test]
async fn test_logout_revokes_session() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let session = login_and_get_session(&client, "editor@beta.com").await;

    let response = client.post("/api/logout").cookie(session.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let response = client.get("/api/me").cookie(session).dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);
}

#[rocket::async_test]
async fn test_logout_without_session_still_succeeds() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.post("/api/logout").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
}

#[rocket::async_test]
async fn test_status_is_public() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.get("/api/status").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["status"], "running");
    assert!(body["version"].is_string());
}

#[rocket::async_test]
async fn test_unknown_route_answers_json_404() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client.get("/api/nada-aqui").dispatch().await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["error"], "Not Found");
}

#[rocket::async_test]
async fn test_expired_session_is_rejected() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let session = login_and_get_session(&client, "editor@alfa.com").await;
    let me: Value = client
        .get("/api/me")
        .cookie(session)
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid JSON response");
    let user_id = me["user_id"].as_i64().expect("user id") as i32;

    let db = DbConn::get_one(client.rocket()).await.expect("database connection");
    db.run(move |conn| {
        let now = Utc::now().naive_utc();
        diesel::insert_into(sessions::table)
            .values(&NewSession {
                id: "stale-session".to_string(),
                user_id,
                created_at: now - Duration::hours(80),
                expires_at: Some(now - Duration::hours(8)),
                revoked: false,
            })
            .execute(conn)
    })
    .await
    .expect("insert expired session");

    let response = client
        .get("/api/me")
        .cookie(Cookie::new("session", "stale-session"))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Unauthorized);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["status"], 401);
}
