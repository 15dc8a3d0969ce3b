use rocket::http::{ContentType, Cookie, Status};
use rocket::local::asynchronous::Client;
use rocket::serde::json::{Value, json};

use construtor_api::orm::testing::test_rocket;

const STRONG_PASSWORD: &str = "Canteiro#2025";

async fn login_with(client: &Client, email: &str, password: &str) -> Option<Cookie<'static>> {
    let response = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": password }).to_string())
        .dispatch()
        .await;
    if response.status() != Status::Ok {
        return None;
    }
    response.cookies().get("session").map(|c| c.clone().into_owned())
}

async fn login_and_get_session(client: &Client, email: &str) -> Cookie<'static> {
    login_with(client, email, "admin")
        .await
        .unwrap_or_else(|| panic!("login failed for {}", email))
}

async fn user_id_of(client: &Client, session: &Cookie<'static>) -> i64 {
    let response = client.get("/api/me").cookie(session.clone()).dispatch().await;
    let body: Value = response.into_json().await.expect("valid JSON response");
    body["user_id"].as_i64().expect("user_id")
}

async fn create_user(client: &Client, session: &Cookie<'static>, body: Value) -> Value {
    let response = client
        .post("/api/users")
        .cookie(session.clone())
        .json(&body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
    response.into_json().await.expect("valid JSON response")
}

#[rocket::async_test]
async fn test_admin_creates_user_in_own_org_with_default_role() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;

    let user = create_user(
        &client,
        &admin,
        json!({ "email": "Mestre@Alfa.com", "senha": STRONG_PASSWORD, "nome": "Mestre de Obras" }),
    )
    .await;
    assert_eq!(user["email"], "mestre@alfa.com");
    assert_eq!(user["name"], "Mestre de Obras");
    assert_eq!(user["roles"][0]["name"], "viewer");
    assert!(user.get("password_hash").is_none());

    let session = login_with(&client, "mestre@alfa.com", STRONG_PASSWORD).await;
    assert!(session.is_some(), "new user should be able to log in");
}

#[rocket::async_test]
async fn test_weak_password_is_rejected_with_hints() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;

    let response = client
        .post("/api/users")
        .cookie(admin)
        .json(&json!({ "email": "fraco@alfa.com", "password": "obra" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
    let body: Value = response.into_json().await.expect("valid JSON response");
    let error = body["error"].as_str().expect("error message");
    assert!(error.starts_with("Password too weak"));
    assert!(error.contains("Use at least 8 characters"));
}

#[rocket::async_test]
async fn test_duplicate_email_conflicts() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;

    let response = client
        .post("/api/users")
        .cookie(admin)
        .json(&json!({ "email": "EDITOR@alfa.com", "password": STRONG_PASSWORD }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
}

#[rocket::async_test]
async fn test_user_management_requires_admin() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;

    let response = client
        .post("/api/users")
        .cookie(editor.clone())
        .json(&json!({ "email": "novo@alfa.com", "password": STRONG_PASSWORD }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client.get("/api/users").cookie(editor).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[rocket::async_test]
async fn test_org_admin_cannot_target_other_org() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let alfa_admin = login_and_get_session(&client, "admin@alfa.com").await;
    let beta_admin = login_and_get_session(&client, "admin@beta.com").await;
    let beta_editor = login_and_get_session(&client, "editor@beta.com").await;
    let beta_editor_id = user_id_of(&client, &beta_editor).await;

    let me: Value = client
        .get("/api/me")
        .cookie(beta_admin)
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid JSON response");

    let response = client
        .post("/api/users")
        .cookie(alfa_admin.clone())
        .json(&json!({ "email": "intruso@beta.com", "password": STRONG_PASSWORD, "org_id": me["org_id"] }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .get(format!("/api/users/{}", beta_editor_id))
        .cookie(alfa_admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let response = client
        .delete(format!("/api/users/{}", beta_editor_id))
        .cookie(alfa_admin)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_list_users_is_scoped_to_org() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@beta.com").await;

    let response = client.get("/api/users").cookie(admin).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let users: Value = response.into_json().await.expect("valid JSON response");
    let emails: Vec<&str> = users
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|u| u["email"].as_str())
        .collect();
    assert_eq!(emails.len(), 2);
    assert!(emails.iter().all(|e| e.ends_with("@beta.com")));
}

#[rocket::async_test]
async fn test_users_read_and_update_themselves() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let viewer = login_and_get_session(&client, "viewer@alfa.com").await;
    let viewer_id = user_id_of(&client, &viewer).await;

    let response = client
        .get(format!("/api/users/{}", viewer_id))
        .cookie(viewer.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let user: Value = response.into_json().await.expect("valid JSON response");
    assert!(user["created_at"].is_string());

    let response = client
        .put(format!("/api/users/{}", viewer_id))
        .cookie(viewer.clone())
        .json(&json!({ "name": "Visitante" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let user: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(user["name"], "Visitante");
    assert_eq!(user["email"], "viewer@alfa.com");

    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let editor_id = user_id_of(&client, &editor).await;
    let response = client
        .put(format!("/api/users/{}", editor_id))
        .cookie(viewer)
        .json(&json!({ "name": "Hacked" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);
}

#[rocket::async_test]
async fn test_admin_password_reset_revokes_sessions() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let editor_id = user_id_of(&client, &editor).await;

    let response = client
        .put(format!("/api/users/{}", editor_id))
        .cookie(admin)
        .json(&json!({ "password": STRONG_PASSWORD }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client.get("/api/me").cookie(editor).dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);

    assert!(login_with(&client, "editor@alfa.com", "admin").await.is_none());
    assert!(login_with(&client, "editor@alfa.com", STRONG_PASSWORD).await.is_some());
}

#[rocket::async_test]
async fn test_self_delete_conflicts_and_other_delete_succeeds() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let admin_id = user_id_of(&client, &admin).await;
    let viewer = login_and_get_session(&client, "viewer@alfa.com").await;
    let viewer_id = user_id_of(&client, &viewer).await;

    let response = client
        .delete(format!("/api/users/{}", admin_id))
        .cookie(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .delete(format!("/api/users/{}", viewer_id))
        .cookie(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client.get("/api/me").cookie(viewer).dispatch().await;
    assert_eq!(response.status(), Status::Unauthorized);

    let response = client
        .get(format!("/api/users/{}", viewer_id))
        .cookie(admin)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_role_grants_and_revocations() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let viewer = login_and_get_session(&client, "viewer@alfa.com").await;
    let viewer_id = user_id_of(&client, &viewer).await;
    let roles_url = format!("/api/users/{}/roles", viewer_id);

    let response = client
        .post(roles_url.clone())
        .cookie(admin.clone())
        .json(&json!({ "papel": "editor" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let roles: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(roles.as_array().expect("array").len(), 2);

    let response = client
        .post(roles_url.clone())
        .cookie(admin.clone())
        .json(&json!({ "role": "mestre" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);

    let response = client
        .post(roles_url.clone())
        .cookie(admin.clone())
        .json(&json!({ "role": "platform-admin" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client
        .delete(format!("{}/admin", roles_url))
        .cookie(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["error"], "User does not have role 'admin'");

    let response = client
        .delete(format!("{}/viewer", roles_url))
        .cookie(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .delete(format!("{}/editor", roles_url))
        .cookie(admin.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client.get(roles_url).cookie(viewer).dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let roles: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(roles[0]["name"], "editor");
}

#[rocket::async_test]
async fn test_platform_admin_creates_user_in_any_org() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let superadmin = login_and_get_session(&client, "superadmin@example.com").await;
    let beta = login_and_get_session(&client, "admin@beta.com").await;
    let me: Value = client
        .get("/api/me")
        .cookie(beta)
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid JSON response");

    let user = create_user(
        &client,
        &superadmin,
        json!({
            "email": "gerente@beta.com",
            "password": STRONG_PASSWORD,
            "orgId": me["org_id"],
            "roles": ["admin", "editor"]
        }),
    )
    .await;
    assert_eq!(user["org_id"], me["org_id"]);
    assert_eq!(user["roles"].as_array().expect("array").len(), 2);
}
