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

/// Creates an obra and a draft RDO in the session's org, returning the RDO.
async fn draft_rdo(client: &Client, session: &Cookie<'static>, date: &str) -> Value {
    let (status, obra) = post_json(client, session, "/api/obras", json!({ "name": "Torre Norte" })).await;
    assert_eq!(status, Status::Created);
    let (status, rdo) = post_json(
        client,
        session,
        "/api/rdos",
        json!({ "obra_id": obra["id"], "data": date, "clima": "ensolarado" }),
    )
    .await;
    assert_eq!(status, Status::Created);
    rdo
}

async fn move_rdo(client: &Client, session: &Cookie<'static>, rdo_id: &Value, to: &str) -> (Status, Value) {
    post_json(
        client,
        session,
        &format!("/api/rdos/{}/status", rdo_id),
        json!({ "status": to }),
    )
    .await
}

#[rocket::async_test]
async fn test_new_rdo_is_a_draft_owned_by_creator() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let me: Value = client
        .get("/api/me")
        .cookie(editor.clone())
        .dispatch()
        .await
        .into_json()
        .await
        .expect("valid JSON response");

    let rdo = draft_rdo(&client, &editor, "2025-05-05").await;
    assert_eq!(rdo["status"], "rascunho");
    assert_eq!(rdo["weather"], "ensolarado");
    assert_eq!(rdo["report_date"], "2025-05-05");
    assert_eq!(rdo["created_by"], me["user_id"]);
    assert_eq!(rdo["org_id"], me["org_id"]);
}

#[rocket::async_test]
async fn test_one_rdo_per_obra_and_day() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let rdo = draft_rdo(&client, &editor, "2025-05-05").await;

    let (status, _) = post_json(
        &client,
        &editor,
        "/api/rdos",
        json!({ "obra_id": rdo["obra_id"], "report_date": "2025-05-05" }),
    )
    .await;
    assert_eq!(status, Status::Conflict);

    let (status, _) = post_json(
        &client,
        &editor,
        "/api/rdos",
        json!({ "obra_id": rdo["obra_id"], "report_date": "2025-05-06" }),
    )
    .await;
    assert_eq!(status, Status::Created);
}

#[rocket::async_test]
async fn test_rdo_for_invisible_obra_is_not_found() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let alfa = login_and_get_session(&client, "editor@alfa.com").await;
    let beta = login_and_get_session(&client, "editor@beta.com").await;
    let rdo = draft_rdo(&client, &alfa, "2025-05-05").await;

    let (status, _) = post_json(
        &client,
        &beta,
        "/api/rdos",
        json!({ "obra_id": rdo["obra_id"], "report_date": "2025-05-07" }),
    )
    .await;
    assert_eq!(status, Status::NotFound);

    let response = client
        .get(format!("/api/rdos/{}", rdo["id"]))
        .cookie(beta.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let (status, _) = move_rdo(&client, &beta, &rdo["id"], "enviado").await;
    assert_eq!(status, Status::NotFound);
}

#[rocket::async_test]
async fn test_full_review_workflow() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let rdo = draft_rdo(&client, &editor, "2025-05-05").await;
    let rdo_id = rdo["id"].clone();

    let (status, body) = move_rdo(&client, &editor, &rdo_id, "enviado").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "enviado");

    let (status, body) = move_rdo(&client, &editor, &rdo_id, "aprovado").await;
    assert_eq!(status, Status::Forbidden);
    assert!(body["error"].as_str().unwrap().contains("aprovado"));

    let (status, body) = move_rdo(&client, &admin, &rdo_id, "rejeitado").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "rejeitado");

    let response = client
        .put(format!("/api/rdos/{}", rdo_id))
        .cookie(editor.clone())
        .json(&json!({ "observacoes": "Refeito o relatório de concretagem" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let (status, _) = move_rdo(&client, &editor, &rdo_id, "rascunho").await;
    assert_eq!(status, Status::Ok);
    let (status, _) = move_rdo(&client, &editor, &rdo_id, "enviado").await;
    assert_eq!(status, Status::Ok);
    let (status, body) = move_rdo(&client, &admin, &rdo_id, "aprovado").await;
    assert_eq!(status, Status::Ok);
    assert_eq!(body["status"], "aprovado");
    assert_eq!(body["notes"], "Refeito o relatório de concretagem");

    let response = client
        .get(format!("/api/rdos?status=aprovado&obra_id={}", rdo["obra_id"]))
        .cookie(editor)
        .dispatch()
        .await;
    let rdos: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(rdos.as_array().expect("array").len(), 1);
}

#[rocket::async_test]
async fn test_invalid_transitions_conflict() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let rdo = draft_rdo(&client, &admin, "2025-05-05").await;

    let (status, body) = move_rdo(&client, &admin, &rdo["id"], "aprovado").await;
    assert_eq!(status, Status::Conflict);
    assert_eq!(body["error"], "Cannot move RDO from rascunho to aprovado");

    let (status, _) = move_rdo(&client, &admin, &rdo["id"], "rascunho").await;
    assert_eq!(status, Status::Conflict);

    let (status, _) = move_rdo(&client, &admin, &rdo["id"], "arquivado").await;
    assert_eq!(status, Status::UnprocessableEntity);
}

#[rocket::async_test]
async fn test_viewer_cannot_submit() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let viewer = login_and_get_session(&client, "viewer@alfa.com").await;
    let rdo = draft_rdo(&client, &editor, "2025-05-05").await;

    let (status, _) = move_rdo(&client, &viewer, &rdo["id"], "enviado").await;
    assert_eq!(status, Status::Forbidden);

    let response = client
        .get(format!("/api/rdos/{}", rdo["id"]))
        .cookie(viewer)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let fetched: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(fetched["status"], "rascunho");
    assert!(fetched["updated_at"].is_string());
}

#[rocket::async_test]
async fn test_submitted_rdo_and_items_are_locked() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let rdo = draft_rdo(&client, &editor, "2025-05-05").await;
    let rdo_id = rdo["id"].clone();

    let (status, item) = post_json(
        &client,
        &editor,
        "/api/rdo-itens",
        json!({ "rdo_id": rdo_id, "descricao": "Concretagem da laje", "quantidade": 12.5, "unidade": "m3" }),
    )
    .await;
    assert_eq!(status, Status::Created);
    assert_eq!(item["quantity"], 12.5);

    let (status, _) = move_rdo(&client, &editor, &rdo_id, "enviado").await;
    assert_eq!(status, Status::Ok);

    let response = client
        .put(format!("/api/rdos/{}", rdo_id))
        .cookie(editor.clone())
        .json(&json!({ "notes": "tarde demais" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["error"], "RDO is enviado and cannot be changed");

    let (status, _) = post_json(
        &client,
        &editor,
        "/api/rdo-itens",
        json!({ "rdo_id": rdo_id, "description": "Item atrasado" }),
    )
    .await;
    assert_eq!(status, Status::Conflict);

    let response = client
        .put(format!("/api/rdo-itens/{}", item["id"]))
        .cookie(editor.clone())
        .json(&json!({ "quantity": 13.0 }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .delete(format!("/api/rdo-itens/{}", item["id"]))
        .cookie(editor.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let response = client
        .get(format!("/api/rdo-itens?rdo_id={}", rdo_id))
        .cookie(editor)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let items: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(items.as_array().expect("array").len(), 1);
}

#[rocket::async_test]
async fn test_rdo_item_validation_and_crew() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let alfa = login_and_get_session(&client, "editor@alfa.com").await;
    let beta = login_and_get_session(&client, "editor@beta.com").await;
    let rdo = draft_rdo(&client, &alfa, "2025-05-05").await;

    let (status, _) = post_json(
        &client,
        &alfa,
        "/api/rdo-itens",
        json!({ "rdo_id": rdo["id"], "description": "Escavação", "quantity": -2.0 }),
    )
    .await;
    assert_eq!(status, Status::BadRequest);

    let (status, beta_crew) =
        post_json(&client, &beta, "/api/equipes", json!({ "name": "Equipe Beta" })).await;
    assert_eq!(status, Status::Created);
    let (status, _) = post_json(
        &client,
        &alfa,
        "/api/rdo-itens",
        json!({ "rdo_id": rdo["id"], "description": "Escavação", "equipe_id": beta_crew["id"] }),
    )
    .await;
    assert_eq!(status, Status::NotFound);

    let (status, crew) = post_json(
        &client,
        &alfa,
        "/api/equipes",
        json!({ "obra_id": rdo["obra_id"], "name": "Escavação Alfa" }),
    )
    .await;
    assert_eq!(status, Status::Created);
    let (status, item) = post_json(
        &client,
        &alfa,
        "/api/rdo-itens",
        json!({ "rdoId": rdo["id"], "description": "Escavação", "equipeId": crew["id"] }),
    )
    .await;
    assert_eq!(status, Status::Created);
    assert_eq!(item["equipe_id"], crew["id"]);
    assert_eq!(item["quantity"], 0.0);

    let response = client
        .put(format!("/api/rdo-itens/{}", item["id"]))
        .cookie(alfa.clone())
        .json(&json!({ "quantity": 40.0, "unit": "m3" }))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let updated: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(updated["quantity"], 40.0);
    assert_eq!(updated["description"], "Escavação");

    let response = client
        .get(format!("/api/rdo-itens/{}", item["id"]))
        .cookie(beta)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);
}

#[rocket::async_test]
async fn test_deleting_rdo_removes_its_items() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let rdo = draft_rdo(&client, &editor, "2025-05-05").await;

    let (status, item) = post_json(
        &client,
        &editor,
        "/api/rdo-itens",
        json!({ "rdo_id": rdo["id"], "description": "Limpeza do canteiro" }),
    )
    .await;
    assert_eq!(status, Status::Created);

    let response = client
        .delete(format!("/api/rdos/{}", rdo["id"]))
        .cookie(editor.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NoContent);

    let response = client
        .get(format!("/api/rdo-itens/{}", item["id"]))
        .cookie(editor.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::NotFound);

    let (status, _) = post_json(
        &client,
        &editor,
        "/api/rdos",
        json!({ "obra_id": rdo["obra_id"], "report_date": "2025-05-05" }),
    )
    .await;
    assert_eq!(status, Status::Created);
}

#[rocket::async_test]
async fn test_approved_rdo_cannot_be_deleted() {
    let client = Client::untracked(test_rocket()).await.expect("valid rocket instance");
    let editor = login_and_get_session(&client, "editor@alfa.com").await;
    let admin = login_and_get_session(&client, "admin@alfa.com").await;
    let rdo = draft_rdo(&client, &editor, "2025-06-02").await;
    let rdo_id = rdo["id"].clone();

    let (status, item) = post_json(
        &client,
        &editor,
        "/api/rdo-itens",
        json!({ "rdo_id": rdo_id, "description": "Armação dos pilares" }),
    )
    .await;
    assert_eq!(status, Status::Created);

    let (status, _) = move_rdo(&client, &editor, &rdo_id, "enviado").await;
    assert_eq!(status, Status::Ok);

    let response = client
        .delete(format!("/api/rdos/{}", rdo_id))
        .cookie(editor.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Conflict);

    let (status, _) = move_rdo(&client, &admin, &rdo_id, "aprovado").await;
    assert_eq!(status, Status::Ok);

    for session in [&editor, &admin] {
        let response = client
            .delete(format!("/api/rdos/{}", rdo_id))
            .cookie(session.clone())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Conflict);
        let body: Value = response.into_json().await.expect("valid JSON response");
        assert_eq!(body["error"], "RDO is aprovado and cannot be changed");
    }

    let response = client
        .get(format!("/api/rdos/{}", rdo_id))
        .cookie(editor.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let body: Value = response.into_json().await.expect("valid JSON response");
    assert_eq!(body["status"], "aprovado");

    let response = client
        .get(format!("/api/rdo-itens/{}", item["id"]))
        .cookie(editor)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}
