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

async fn post_json(client: &Client, session: &Cookie<'static>, url: &str, body: Value) -> (Status, Value) {
    let response = client
        .post(url.to_string())
        .cookie(session.clone())
        .json(&body)
        .dispatch()
        .await;
    let status = response.status();
    let body = response.into_json().await.unwrap_or(Value::Null);
    (status, body)
}

async fn get_json(client: &Client, session: &Cookie<'static>, url: &str) -> (Status, Value) {
    let response = client.get(url.to_string()).cookie(session.clone()).dispatch().await;
    let status = response.status();
    let body = response.into_json().await.unwrap_or(Value::Null);
    (status, body)
}

#[rocket::async_test]
async fn test_equipe_takes_org_from_obra() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let (_, obra) = post_json(&client, &editor, "/api/obras", json!({ "name": "Viaduto Leste" })).await;

    let (status, equipe) = post_json(
        &client,
        &editor,
        "/api/equipes",
        json!({
            "obraId": obra["id"],
            "nome": "Armação",
            "lider": "João Pedreira",
            "especialidade": "Ferragem",
            "quantidade_membros": 8
        }),
    )
    .await;
    assert_eq!(status, Status::Created);
    assert_eq!(equipe["org_id"], obra["org_id"]);
    assert_eq!(equipe["leader_name"], "João Pedreira");
    assert_eq!(equipe["member_count"], 8);

    let (status, equipes) = get_json(&client, &editor, &format!("/api/equipes?obra_id={}", obra["id"])).await;
    assert_eq!(status, Status::Ok);
    assert_eq!(equipes.as_array().expect("array").len(), 1);
}

#[rocket::async_test]
async fn test_equipe_validation_and_org_mismatch() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let superadmin = login_and_get_session(&client, "superadmin@example.com").await;
    let alfa = login_and_get_session(&client, "editor@alfa.com").await;
    let beta = login_and_get_session(&client, "editor@beta.com").await;
    let (_, obra) = post_json(&client, &alfa, "/api/obras", json!({ "name": "Creche" })).await;
    let (_, beta_me) = get_json(&client, &beta, "/api/me").await;

    let (status, _) = post_json(
        &client,
        &alfa,
        "/api/equipes",
        json!({ "name": "Pintura", "member_count": -3 }),
    )
    .await;
    assert_eq!(status, Status::BadRequest);

    let (status, _) = post_json(
        &client,
        &superadmin,
        "/api/equipes",
        json!({ "name": "Pintura", "obra_id": obra["id"], "org_id": beta_me["org_id"] }),
    )
    .await;
    assert_eq!(status, Status::BadRequest);

    let (status, _) = post_json(
        &client,
        &beta,
        "/api/equipes",
        json!({ "name": "Pintura", "obra_id": obra["id"] }),
    )
    .await;
    assert_eq!(status, Status::NotFound);
}

#[rocket::async_test]
async fn test_equipe_update_and_delete() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let viewer = login_and_get_session(&client, "viewer@alfa.com").await;
    let (_, equipe) = post_json(&client, &editor, "/api/equipes", json!({ "name": "Elétrica" })).await;
    let url = format!("/api/equipes/{}", equipe["id"]);
    assert_eq!(equipe["member_count"], 0);

    let response = client
        .put(url.clone())
        .cookie(editor.clone())
        .json(&json!({ "memberCount": 4 }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let updated: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(updated["member_count"], 4);
    assert_eq!(updated["name"], "Elétrica");

    let response = client.delete(url.clone()).cookie(viewer.clone()).dispatch().await;
    assert_eq!(response.status(), Status::Forbidden);

    let (status, fetched) = get_json(&client, &viewer, &url).await;
    assert_eq!(status, Status::Ok);
    assert!(fetched["created_at"].is_string());

    let response = client.delete(url.clone()).cookie(editor.clone()).dispatch().await;
    assert_eq!(response.status(), Status::NoContent);
    let (status, _) = get_json(&client, &editor, &url).await;
    assert_eq!(status, Status::NotFound);
}

#[rocket::async_test]
async fn test_equipamento_defaults_and_filters() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let (_, obra) = post_json(&client, &editor, "/api/obras", json!({ "name": "Shopping Sul" })).await;

    let (status, betoneira) = post_json(
        &client,
        &editor,
        "/api/equipamentos",
        json!({ "nome": "Betoneira", "categoria": "Concreto", "obra_id": obra["id"] }),
    )
    .await;
    assert_eq!(status, Status::Created);
    assert_eq!(betoneira["ownership"], "proprio");
    assert_eq!(betoneira["status"], "disponivel");

    let (status, guindaste) = post_json(
        &client,
        &editor,
        "/api/equipamentos",
        json!({
            "name": "Guindaste",
            "propriedade": "alugado",
            "status": "em_uso",
            "dailyRateCents": 180000
        }),
    )
    .await;
    assert_eq!(status, Status::Created);
    assert_eq!(guindaste["daily_rate_cents"], 180000);
    assert!(guindaste["obra_id"].is_null());

    let (_, em_uso) = get_json(&client, &editor, "/api/equipamentos?status=em_uso").await;
    assert_eq!(em_uso.as_array().expect("array").len(), 1);
    assert_eq!(em_uso[0]["name"], "Guindaste");

    let (_, on_site) = get_json(&client, &editor, &format!("/api/equipamentos?obra_id={}", obra["id"])).await;
    assert_eq!(on_site.as_array().expect("array").len(), 1);

    let (status, _) = get_json(&client, &editor, "/api/equipamentos?status=quebrado").await;
    assert_eq!(status, Status::BadRequest);
}

#[rocket::async_test]
async fn test_equipamento_rejects_negative_rate() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;

    let (status, _) = post_json(
        &client,
        &editor,
        "/api/equipamentos",
        json!({ "name": "Retroescavadeira", "daily_rate_cents": -10 }),
    )
    .await;
    assert_eq!(status, Status::BadRequest);
}

#[rocket::async_test]
async fn test_equipamento_moves_to_maintenance() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let beta = login_and_get_session(&client, "editor@beta.com").await;
    let (_, equipamento) =
        post_json(&client, &editor, "/api/equipamentos", json!({ "name": "Compactador" })).await;
    let url = format!("/api/equipamentos/{}", equipamento["id"]);

    let response = client
        .put(url.clone())
        .cookie(editor.clone())
        .json(&json!({ "status": "manutencao" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let updated: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(updated["status"], "manutencao");
    assert_eq!(updated["ownership"], "proprio");

    let (status, _) = get_json(&client, &beta, &url).await;
    assert_eq!(status, Status::NotFound);

    let response = client.delete(url.clone()).cookie(editor.clone()).dispatch().await;
    assert_eq!(response.status(), Status::NoContent);
    let (_, remaining) = get_json(&client, &editor, "/api/equipamentos").await;
    assert!(remaining.as_array().expect("array").is_empty());
}
