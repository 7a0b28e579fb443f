mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use zykor_api::auth::Role;

fn seed_backups(server: &common::TestServer) {
    server.stub.seed(
        "backups",
        vec![
            json!({"id": 10, "bar_id": 3, "tipo": "completo", "tamanho_bytes": 2048, "status": "concluido"}),
            json!({"id": 11, "bar_id": 5, "tipo": "completo", "tamanho_bytes": 1024, "status": "concluido"}),
        ],
    );
}

#[tokio::test]
async fn backups_are_listed_per_bar() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    seed_backups(&server);
    let token = server.token(Role::Gerente, &[3], &["configuracoes"]);

    let res = server
        .client
        .get(server.url("/api/configuracoes/backup?bar_id=3"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["data"][0]["id"], 10);

    let list = &server.stub.calls_to("/rest/v1/backups")[0];
    assert!(list.query.contains("limit=20"), "{}", list.query);
    assert!(list.query.contains("order=created_at.desc"), "{}", list.query);
    Ok(())
}

#[tokio::test]
async fn restore_is_admin_only() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    seed_backups(&server);
    let token = server.token(Role::Gerente, &[3], &["configuracoes"]);

    let res = server
        .client
        .post(server.url("/api/configuracoes/backup/restore"))
        .bearer_auth(&token)
        .json(&json!({"barId": 3, "backupId": 10}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(res.json::<Value>().await?["error"], "Permissão insuficiente para esta operação");
    assert!(server.stub.calls().is_empty());
    Ok(())
}

#[tokio::test]
async fn restoring_a_backup_of_another_bar_is_404() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    seed_backups(&server);

    let res = server
        .client
        .post(server.url("/api/configuracoes/backup/restore"))
        .bearer_auth(server.admin_token())
        .json(&json!({"barId": 3, "backupId": 11}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.json::<Value>().await?["error"], "Backup não encontrado");
    assert!(server.stub.calls_to("/rest/v1/rpc/restore_backup").is_empty());
    Ok(())
}

#[tokio::test]
async fn restore_calls_the_database_function() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    seed_backups(&server);
    server
        .stub
        .rpc_result("restore_backup", json!({"tabelas": 14, "registros": 5120}));

    let res = server
        .client
        .post(server.url("/api/configuracoes/backup/restore"))
        .bearer_auth(server.admin_token())
        .json(&json!({"barId": "3", "backupId": "10"}))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);

    let body = res.json::<Value>().await?;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["backupId"], 10);
    assert_eq!(body["data"]["barId"], 3);
    assert_eq!(body["data"]["resultado"]["tabelas"], 14);

    let rpc = server.stub.calls_to("/rest/v1/rpc/restore_backup");
    assert_eq!(rpc.len(), 1);
    assert_eq!(rpc[0].authorization.as_deref(), Some("Bearer service-key"));
    assert_eq!(rpc[0].body["p_backup_id"], 10);
    assert_eq!(rpc[0].body["p_bar_id"], 3);
    assert!(rpc[0].body["p_usuario_id"].is_string());
    Ok(())
}

#[tokio::test]
async fn sales_summary_passes_period_to_rpc() -> Result<()> {
    let server = common::TestServer::spawn().await?;
    server
        .stub
        .rpc_result("get_vendas_resumo", json!({"faturamento": 18250.5, "tickets": 412}));
    let token = server.token(Role::Gerente, &[3], &["vendas"]);

    let res = server
        .client
        .get(server.url("/api/vendas/resumo?bar_id=3&data_inicio=2024-05-01&data_fim=2024-05-31"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await?["data"],
        json!({"faturamento": 18250.5, "tickets": 412})
    );

    let rpc = &server.stub.calls_to("/rest/v1/rpc/get_vendas_resumo")[0];
    assert_eq!(
        rpc.body,
        json!({"p_bar_id": 3, "p_data_inicio": "2024-05-01", "p_data_fim": "2024-05-31"})
    );

    let res = server
        .client
        .get(server.url("/api/vendas/resumo?bar_id=5&data_inicio=2024-05-01&data_fim=2024-05-31"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
    assert_eq!(server.stub.calls_to("/rest/v1/rpc/get_vendas_resumo").len(), 1);
    Ok(())
}
