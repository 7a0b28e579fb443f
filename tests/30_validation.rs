mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use zykor_api::auth::Role;

#[tokio::test]
async fn restore_without_backup_id_names_the_field() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/configuracoes/backup/restore"))
        .bearer_auth(server.admin_token())
        .json(&json!({ "barId": 3 }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "backupId é obrigatório");
    assert!(server.stub.calls().is_empty(), "no downstream contact expected");
    Ok(())
}

#[tokio::test]
async fn list_without_bar_id_is_400() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.token(Role::Gerente, &[3], &["checklists", "receitas", "notificacoes"]);

    for path in ["/api/checklists", "/api/receitas?categoria=drinks", "/api/notificacoes?bar_id="] {
        let res = server.client.get(server.url(path)).bearer_auth(&token).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{}", path);
        let body = res.json::<Value>().await?;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "bar_id é obrigatório");
    }
    assert!(server.stub.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn malformed_json_is_400_and_server_keeps_serving() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.token(Role::Gerente, &[3], &["checklists"]);

    let res = server
        .client
        .post(server.url("/api/checklists"))
        .bearer_auth(&token)
        .header("content-type", "application/json")
        .body("{\"bar_id\": 3, \"nome\": ")
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "JSON inválido");

    let res = server.client.get(server.url("/health")).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    Ok(())
}

#[tokio::test]
async fn missing_required_fields_never_reach_the_database() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.token(Role::Gerente, &[3], &["checklists", "receitas"]);

    let cases = [
        ("/api/checklists", json!({"bar_id": 3, "setor": "bar"}), "nome é obrigatório"),
        ("/api/checklists", json!({"bar_id": 3, "nome": "Abertura", "setor": "  "}), "setor é obrigatório"),
        ("/api/checklists", json!({"nome": "Abertura", "setor": "bar"}), "bar_id é obrigatório"),
        ("/api/receitas", json!({"bar_id": 3, "nome": "Caipirinha"}), "rendimento é obrigatório"),
    ];

    for (path, payload, message) in cases {
        let res = server
            .client
            .post(server.url(path))
            .bearer_auth(&token)
            .json(&payload)
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{} {}", path, payload);
        assert_eq!(res.json::<Value>().await?["error"], message);
    }
    assert!(server.stub.mutations().is_empty());
    Ok(())
}

#[tokio::test]
async fn empty_body_reads_as_empty_object() -> Result<()> {
    let server = common::TestServer::spawn().await?;

    let res = server
        .client
        .post(server.url("/api/configuracoes/backup/restore"))
        .bearer_auth(server.admin_token())
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(res.json::<Value>().await?["error"], "barId é obrigatório");
    Ok(())
}

#[tokio::test]
async fn invalid_ids_and_periods_are_rejected() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    let token = server.token(Role::Gerente, &[3], &["checklists", "vendas"]);

    let res = server.client.get(server.url("/api/checklists/abc")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .get(server.url("/api/vendas/resumo?bar_id=3&data_inicio=2024-05-31&data_fim=2024-05-01"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = res.json::<Value>().await?;
    assert_eq!(body["fields"]["data_inicio"], "deve ser anterior ou igual a data_fim");

    let res = server
        .client
        .get(server.url("/api/vendas/resumo?bar_id=3&data_inicio=01/05/2024&data_fim=2024-05-31"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    assert!(server.stub.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn oversized_bodies_are_refused() -> Result<()> {
    let server = common::TestServer::spawn_with(|config| {
        config.api.max_request_size_bytes = 1024;
    })
    .await?;
    let token = server.token(Role::Gerente, &[3], &["checklists"]);

    let res = server
        .client
        .post(server.url("/api/checklists"))
        .bearer_auth(&token)
        .json(&json!({"bar_id": 3, "nome": "x".repeat(4096), "setor": "bar"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "PAYLOAD_TOO_LARGE");
    assert!(server.stub.mutations().is_empty());
    Ok(())
}
