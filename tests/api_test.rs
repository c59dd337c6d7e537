//! HTTPクライアントのテスト（モックサーバー使用）

use base64::{engine::general_purpose::STANDARD, Engine as _};
use mockito::{Matcher, Server};
use receipt_audit::api::{ApiClient, ApiError, AuditBackend, RulesUpload};
use receipt_audit::download;
use receipt_audit_common::{
    find_scenario, AuditDecision, AuditResult, ConfirmPayload, RulesMode, SourceFile,
};
use std::time::Duration;
use tempfile::tempdir;

fn client(server: &Server) -> ApiClient {
    ApiClient::new(&server.url(), Duration::from_secs(5)).unwrap()
}

fn audit_result() -> AuditResult {
    AuditResult {
        audit_decision: AuditDecision::AnomalyDetected,
        violation_score: 0.9,
        violations: vec![],
        reasoning: "Alcohol".into(),
    }
}

#[tokio::test]
async fn test_detail_message_is_surfaced_exactly() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/audit/check")
        .with_status(422)
        .with_header("content-type", "application/json")
        .with_body(r#"{"detail": "X"}"#)
        .create_async()
        .await;

    let data = find_scenario("b").unwrap().data();
    let err = client(&server).check(&data).await.unwrap_err();
    assert_eq!(err.to_string(), "X");
    assert!(matches!(err, ApiError::Backend { status: Some(422), .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_message_field_used_when_no_detail() {
    let mut server = Server::new_async().await;
    server
        .mock("DELETE", "/api/v1/audit/rules/r1")
        .with_status(500)
        .with_body(r#"{"message": "Failed to delete rule"}"#)
        .create_async()
        .await;

    let err = client(&server).delete_rule("r1").await.unwrap_err();
    assert_eq!(err.message(), "Failed to delete rule");
}

#[tokio::test]
async fn test_unstructured_failure_uses_transport_message() {
    let mut server = Server::new_async().await;
    server
        .mock("POST", "/api/v1/audit/check")
        .with_status(500)
        .with_body("Internal Server Error")
        .create_async()
        .await;

    let data = find_scenario("a").unwrap().data();
    let err = client(&server).check(&data).await.unwrap_err();
    assert!(err.message().contains("500"), "{}", err);
    assert!(err.message().contains("/api/v1/audit/check"), "{}", err);
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let client = ApiClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
    let err = client.health().await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.message().is_empty());
}

#[tokio::test]
async fn test_extract_sends_multipart_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("receipt.jpg");
    std::fs::write(&path, b"jpeg bytes").unwrap();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("POST", "/api/v1/ocr/extract")
        .match_header("content-type", Matcher::Regex("multipart/form-data".into()))
        .match_body(Matcher::AllOf(vec![
            Matcher::Regex(r#"name="file"; filename="receipt.jpg""#.into()),
            Matcher::Regex("jpeg bytes".into()),
        ]))
        .with_header("content-type", "application/json")
        .with_body(
            r#"{
                "receipt_id": "R-100",
                "store_name": "GS25",
                "date": "2026-02-11",
                "items": [{"id": 1, "name": "Soju", "unit_price": 1800, "count": 3, "price": 5400}],
                "total_price": 5400
            }"#,
        )
        .create_async()
        .await;

    let source = SourceFile {
        path,
        file_name: "receipt.jpg".into(),
        size: 10,
        mime_type: "image/jpeg".into(),
    };
    let data = client(&server).extract(&source).await.unwrap();
    assert_eq!(data.receipt_id, "R-100");
    assert_eq!(data.items[0].price, 5400);
    assert!(data.image_url.is_none());
    mock.assert_async().await;
}

#[tokio::test]
async fn test_batch_confirm_wraps_receipts() {
    let mut server = Server::new_async().await;
    let pdf = STANDARD.encode(b"%PDF-1.4 batch");
    let mock = server
        .mock("POST", "/api/v1/audit/batch-confirm")
        .match_body(Matcher::Regex(
            r#"\{"receipts":\[\{"receipt_data":\{"receipt_id":"DEMO-002""#.into(),
        ))
        .with_header("content-type", "application/json")
        .with_body(format!(
            r#"{{"status": "success", "pdf_url": "data/reports/batch.pdf", "pdf_data": "{}", "filename": "batch_audit_report.pdf"}}"#,
            pdf
        ))
        .create_async()
        .await;

    let payload = ConfirmPayload {
        receipt_data: find_scenario("b").unwrap().data(),
        audit_result: audit_result(),
    };
    let response = client(&server).batch_confirm(&[payload]).await.unwrap();
    let artifact = download::decode_report(&response, download::BATCH_REPORT_NAME).unwrap();
    assert_eq!(artifact.bytes, b"%PDF-1.4 batch");
    assert_eq!(artifact.filename, "batch_audit_report.pdf");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_rules_endpoints() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/api/v1/audit/rules")
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"mode": "rag", "total_chunks": 4, "rules": [{"id": "c1", "title": "Alcohol", "content": "No alcohol"}]}"#,
        )
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/v1/audit/rules/c1")
        .match_body(Matcher::Json(serde_json::json!({"content": "No alcohol after 18:00"})))
        .with_body(r#"{"status": "success", "message": "Rule c1 updated"}"#)
        .create_async()
        .await;
    let upload = server
        .mock("POST", "/api/v1/audit/upload-rules")
        .match_body(Matcher::Regex(r#"name="text""#.into()))
        .with_body(r#"{"status": "success", "message": "Processed 1 chunks"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let rules = client.list_rules().await.unwrap();
    assert_eq!(rules.mode, RulesMode::Rag);
    assert_eq!(rules.total_chunks, Some(4));
    assert!(rules.is_editable(&rules.rules[0]));

    let ack = client.update_rule("c1", "No alcohol after 18:00").await.unwrap();
    assert_eq!(ack.message, "Rule c1 updated");

    let ack = client
        .upload_rules(&RulesUpload {
            file: None,
            text: Some("Taxi only after 22:00".into()),
        })
        .await
        .unwrap();
    assert!(ack.is_success());

    update.assert_async().await;
    upload.assert_async().await;
}

/// 規程IDに区切り文字が含まれてもパスは1セグメント
#[tokio::test]
async fn test_rule_id_is_percent_encoded() {
    let mut server = Server::new_async().await;
    let delete = server
        .mock("DELETE", "/api/v1/audit/rules/a%2Fb%3Fx")
        .with_body(r#"{"status": "success", "message": "Rule deleted"}"#)
        .create_async()
        .await;
    let update = server
        .mock("PUT", "/api/v1/audit/rules/Taxi%20rule")
        .with_body(r#"{"status": "success", "message": "Rule updated"}"#)
        .create_async()
        .await;

    let client = client(&server);
    let ack = client.delete_rule("a/b?x").await.unwrap();
    assert_eq!(ack.message, "Rule deleted");
    let ack = client.update_rule("Taxi rule", "after 22:00").await.unwrap();
    assert_eq!(ack.message, "Rule updated");

    delete.assert_async().await;
    update.assert_async().await;
}
