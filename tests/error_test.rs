//! エラーケーステスト
//!
//! 各種エラー条件でのエラーハンドリングを検証

use receipt_audit::api::ApiError;
use receipt_audit::error::AuditError;
use receipt_audit::{download, scanner, session};
use receipt_audit_common::{ConfirmResponse, RecordId, Session, ValidationError};
use std::path::Path;
use tempfile::tempdir;

/// 存在しないフォルダをスキャンした場合
#[test]
fn test_scan_nonexistent_folder() {
    let result = scanner::scan_folder(Path::new("/nonexistent/path/12345"));
    assert!(matches!(result, Err(AuditError::FileNotFound(_))));
}

/// 画像のないフォルダをスキャンした場合
#[test]
fn test_scan_folder_no_images() {
    let dir = tempdir().expect("Failed to create temp dir");
    std::fs::write(dir.path().join("memo.txt"), "hello").unwrap();
    std::fs::write(dir.path().join("data.json"), "{}").unwrap();

    let result = scanner::scan_folder(dir.path());
    assert!(result.unwrap().is_empty());
}

/// 明示指定した非対応ファイルは検証エラーとして返る
#[test]
fn test_select_unsupported_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("receipt.heic");
    std::fs::write(&path, b"heic").unwrap();

    let selection = scanner::select(&[path]).unwrap();
    assert!(selection.accepted.is_empty());
    assert_eq!(
        selection.rejected,
        vec![ValidationError::UnsupportedType { file_name: "receipt.heic".into() }]
    );
}

/// AuditErrorのDisplay実装確認
#[test]
fn test_error_display() {
    let errors = vec![
        AuditError::Config("テスト設定エラー".to_string()),
        AuditError::FileNotFound("receipt.jpg".to_string()),
        AuditError::MissingSource("abc1234".to_string()),
        AuditError::MissingReceiptData("abc1234".to_string()),
        AuditError::MissingAuditResult("abc1234".to_string()),
        AuditError::NoEligibleRecords,
        AuditError::UnknownScenario("Scenario Z".to_string()),
        AuditError::RuleNotEditable("c1".to_string()),
        AuditError::ReportDecode("invalid".to_string()),
    ];

    for err in errors {
        let display = format!("{}", err);
        assert!(!display.is_empty(), "Error display should not be empty");
    }
}

/// API失敗はバックエンドの文言をそのまま記録する
#[test]
fn test_record_message_passes_api_message_through() {
    let err: AuditError = ApiError::Backend {
        status: Some(400),
        message: "Unsupported image type".into(),
    }
    .into();
    assert_eq!(err.record_message(), "Unsupported image type");

    let err: AuditError = receipt_audit_common::Error::RecordBusy(RecordId::from("abc1234").to_string()).into();
    assert!(err.record_message().contains("abc1234"));
}

/// 不正なJSONからのエラー変換
#[test]
fn test_json_parse_error() {
    let result: Result<Session, serde_json::Error> = serde_json::from_str("{ invalid json }");
    let err: AuditError = result.unwrap_err().into();
    assert!(matches!(err, AuditError::JsonParse(_)));
}

/// IOエラーからのエラー変換
#[test]
fn test_io_error_conversion() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err: AuditError = io_err.into();
    assert!(matches!(err, AuditError::Io(_)));
}

/// PDFデータのない成功応答
#[test]
fn test_report_without_pdf_data() {
    let response = ConfirmResponse {
        status: "success".into(),
        ..Default::default()
    };
    let err = download::decode_report(&response, download::BATCH_REPORT_NAME).unwrap_err();
    assert_eq!(err.to_string(), "PDFレポートの生成に失敗しました");
}

/// 保存先に書き込めないセッション
#[test]
fn test_session_save_to_directory_fails() {
    let dir = tempdir().unwrap();
    let result = session::save(dir.path(), &Session::new());
    assert!(matches!(result, Err(AuditError::Io(_))));
}
