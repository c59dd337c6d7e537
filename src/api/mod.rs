//! バックエンドAPI連携
//!
//! - `AuditBackend`: ワークフローが利用するバックエンド操作
//! - `ApiClient`: reqwest による HTTP 実装
//!
//! 失敗はすべて `ApiError` に正規化する。リトライはしない。

mod client;

pub use client::ApiClient;

use async_trait::async_trait;
use receipt_audit_common::{
    AckResponse, AuditResult, ConfirmPayload, ConfirmResponse, HealthResponse, ReceiptData,
    RulesResponse, SourceFile,
};
use std::path::PathBuf;
use thiserror::Error;

/// 正規化されたAPIエラー
///
/// 表示はメッセージのみ（レコードのエラー欄にそのまま入る）
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// 接続失敗・タイムアウトなど
    #[error("{0}")]
    Transport(String),

    /// バックエンドが返したエラー
    #[error("{message}")]
    Backend { status: Option<u16>, message: String },

    /// レスポンスの形式が想定外
    #[error("{0}")]
    Decode(String),

    /// 送信ファイルの読み込み失敗
    #[error("{0}")]
    File(String),
}

impl ApiError {
    pub fn message(&self) -> &str {
        match self {
            ApiError::Transport(m) | ApiError::Decode(m) | ApiError::File(m) => m,
            ApiError::Backend { message, .. } => message,
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        ApiError::Backend {
            status: None,
            message: message.into(),
        }
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// 規程アップロードの内容（ファイルとテキストのどちらか、または両方）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RulesUpload {
    pub file: Option<PathBuf>,
    pub text: Option<String>,
}

impl RulesUpload {
    pub fn is_empty(&self) -> bool {
        self.file.is_none() && self.text.as_deref().map_or(true, |t| t.trim().is_empty())
    }
}

/// バックエンド操作
#[async_trait]
pub trait AuditBackend: Send + Sync {
    /// POST /api/v1/ocr/extract
    async fn extract(&self, file: &SourceFile) -> ApiResult<ReceiptData>;

    /// POST /api/v1/audit/check
    async fn check(&self, receipt: &ReceiptData) -> ApiResult<AuditResult>;

    /// POST /api/v1/audit/confirm
    async fn confirm(&self, payload: &ConfirmPayload) -> ApiResult<ConfirmResponse>;

    /// POST /api/v1/audit/batch-confirm
    async fn batch_confirm(&self, receipts: &[ConfirmPayload]) -> ApiResult<ConfirmResponse>;

    /// GET /api/v1/audit/rules
    async fn list_rules(&self) -> ApiResult<RulesResponse>;

    /// POST /api/v1/audit/upload-rules
    async fn upload_rules(&self, upload: &RulesUpload) -> ApiResult<AckResponse>;

    /// PUT /api/v1/audit/rules/{id}
    async fn update_rule(&self, id: &str, content: &str) -> ApiResult<AckResponse>;

    /// DELETE /api/v1/audit/rules/{id}
    async fn delete_rule(&self, id: &str) -> ApiResult<AckResponse>;

    /// GET /health
    async fn health(&self) -> ApiResult<HealthResponse>;
}
