use crate::api::ApiError;
use receipt_audit_common::ValidationError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Common(#[from] receipt_audit_common::Error),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("元の画像ファイルがありません: {0}")]
    MissingSource(String),

    #[error("抽出データがありません: {0}")]
    MissingReceiptData(String),

    #[error("監査結果がありません: {0}")]
    MissingAuditResult(String),

    #[error("対象のレシートがありません")]
    NoEligibleRecords,

    #[error("デモシナリオが見つかりません: {0}")]
    UnknownScenario(String),

    #[error("この規程は編集できません: {0}")]
    RuleNotEditable(String),

    #[error("レポートのデコードに失敗: {0}")]
    ReportDecode(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(String),
}

impl AuditError {
    /// レコードに記録するメッセージ
    ///
    /// API失敗はバックエンドの文言をそのまま返す
    pub fn record_message(&self) -> String {
        match self {
            AuditError::Api(e) => e.message().to_string(),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, AuditError>;
