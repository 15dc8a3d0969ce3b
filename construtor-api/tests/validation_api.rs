use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use rocket::serde::json::{Value, json};

use construtor_api::orm::testing::test_rocket;

async fn validate_document(client: &Client, value: &str) -> Value {
    let response = client
        .get(format!("/api/validate/document/{}", value))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    response.into_json().await.expect("valid JSON response")
}

#[rocket::async_test]
async fn test_formatted_cnpj_with_slash_is_valid() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let body = validate_document(&client, "11.222.333/0001-81").await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["kind"], "cnpj");
    assert_eq!(body["digits"], "11222333000181");
    assert_eq!(body["formatted"], "11.222.333/0001-81");
    assert!(body["error"].is_null());
}

#[rocket::async_test]
async fn test_bare_cpf_is_formatted() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let body = validate_document(&client, "52998224725").await;
    assert_eq!(body["valid"], true);
    assert_eq!(body["kind"], "cpf");
    assert_eq!(body["formatted"], "529.982.247-25");
}

#[rocket::async_test]
async fn test_invalid_documents_answer_200_with_reason() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let wrong_digit = validate_document(&client, "529.982.247-26").await;
    assert_eq!(wrong_digit["valid"], false);
    assert_eq!(wrong_digit["error"], "Check digits do not match");
    assert!(wrong_digit["kind"].is_null());

    let repeated = validate_document(&client, "00000000000").await;
    assert_eq!(repeated["valid"], false);

    let short = validate_document(&client, "1234").await;
    assert_eq!(short["valid"], false);
    assert!(short["error"].is_string());
}

#[rocket::async_test]
async fn test_password_strength_report() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");

    let response = client
        .post("/api/validate/password")
        .header(ContentType::JSON)
        .body(json!({ "senha": "canteiro2024" }).to_string())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["score"], 2);
    assert_eq!(body["strength"], "media");
    assert_eq!(body["acceptable"], false);
    assert_eq!(body["min_score"], 3);
    assert_eq!(body["uppercase"], false);
    assert_eq!(
        body["feedback"],
        json!(["Add an uppercase letter", "Add a symbol"])
    );

    let response = client
        .post("/api/validate/password")
        .header(ContentType::JSON)
        .body(json!({ "password": "Canteiro#2024" }).to_string())
        .dispatch()
        .await;
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["score"], 4);
    assert_eq!(body["strength"], "muito_forte");
    assert_eq!(body["acceptable"], true);
    assert!(body["feedback"].as_array().expect("array").is_empty());
}
