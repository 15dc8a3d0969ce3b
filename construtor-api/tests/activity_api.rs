use rocket::http::{ContentType, Cookie, Status};
use rocket::local::asynchronous::Client;
use rocket::serde::json::{Value, json};

use construtor_api::orm::testing::test_rocket;

async fn login_and_get_session(client: &Client, email: &str) -> Cookie<'static> {
    let response = client
        .post("/api/login")
        .header(ContentType::JSON)
        .body(json!({ "email": email, "password": "admin" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok, "login failed for {}", email);
    response
        .cookies()
        .get("session")
        .expect("Session cookie should be set")
        .clone()
        .into_owned()
}

#[rocket::async_test]
async fn test_obra_history_records_each_change_with_user() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let me: Value = client
        .get("/api/me")
        .cookie(editor.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid JSON response");

    let response = client
        .post("/api/obras")
        .cookie(editor.clone())
        .json(&json!({ "name": "Centro Esportivo" }))
        .dispatch()
        .await;
    let obra: Value = response.into_json().await.expect("valid JSON response");
    let obra_url = format!("/api/obras/{}", obra["id"]);

    let response = client
        .put(obra_url.clone())
        .cookie(editor.clone())
        .json(&json!({ "status": "em_andamento" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let response = client.delete(obra_url).cookie(editor).dispatch().await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .get(format!("/api/activity/obras/{}", obra["id"]))
        .cookie(admin)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let history: Value = response.into_json().await.expect("valid JSON response");
    let history = history.as_array().expect("array");
    let operations: Vec<&str> = history
        .iter()
        .filter_map(|e| e["operation_type"].as_str())
        .collect();
    assert_eq!(operations, vec!["create", "update", "delete"]);
    assert!(history.iter().all(|e| e["user_id"] == me["user_id"]));
    assert!(history.iter().all(|e| e["org_id"] == obra["org_id"]));
}

#[rocket::async_test]
async fn test_activity_access_rules() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let beta_admin = login_and_get_session(&client, "admin@beta.com").await;
    let superadmin = login_and_get_session(&client, "superadmin@example.com").await;

    let response = client
        .post("/api/obras")
        .cookie(editor.clone())
        .json(&json!({ "name": "Biblioteca" }))
        .dispatch()
        .await;
    let obra: Value = response.into_json().await.expect("valid JSON response");
    let url = format!("/api/activity/obras/{}", obra["id"]);

    let response = client.get(url.clone()).cookie(editor).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);

    let response = client.get(url.clone()).cookie(beta_admin.clone()).dispatch().await;
    assert_eq!(response.status(), Status::NotFound);

    let response = client.get(url).cookie(superadmin).dispatch().await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .get(format!("/api/activity/sessions/{}", obra["id"]))
        .cookie(beta_admin)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::BadRequest);
}
