//! reqwest によるバックエンドクライアント

use super::{ApiError, ApiResult, AuditBackend, RulesUpload};
use crate::config::Config;
use async_trait::async_trait;
use receipt_audit_common::{
    validation, AckResponse, ApiErrorBody, AuditResult, BatchConfirmRequest, ConfirmPayload,
    ConfirmResponse, HealthResponse, ReceiptData, RuleUpdateRequest, RulesResponse, SourceFile,
};
use reqwest::multipart::{Form, Part};
use reqwest::{RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(&config.api_url(), config.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 規程IDは1つのパスセグメントとしてエンコードする
    fn rule_url(&self, id: &str) -> ApiResult<Url> {
        let mut url = Url::parse(&self.url("/api/v1/audit/rules"))
            .map_err(|e| ApiError::Transport(format!("{}: {}", self.base_url, e)))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::Transport(format!("不正なURL: {}", self.base_url)))?
            .push(id);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder, endpoint: &str) -> ApiResult<T> {
        debug!(endpoint, "API呼び出し");
        let response = request.send().await.map_err(|e| {
            warn!(endpoint, error = %e, "通信エラー");
            ApiError::Transport(e.to_string())
        })?;
        read_response(response, endpoint).await
    }
}

/// レスポンスを読み取り、失敗時はエラーボディからメッセージを取り出す
///
/// 構造化されていないボディの場合は通信層のメッセージを使う
async fn read_response<T: DeserializeOwned>(response: Response, endpoint: &str) -> ApiResult<T> {
    let status = response.status();
    if status.is_client_error() || status.is_server_error() {
        let transport_message = response
            .error_for_status_ref()
            .err()
            .map(|e| e.to_string())
            .unwrap_or_else(|| status.to_string());
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&body)
            .ok()
            .and_then(|b| b.message())
            .unwrap_or(transport_message);
        warn!(endpoint, status = status.as_u16(), %message, "バックエンドエラー");
        return Err(ApiError::Backend {
            status: Some(status.as_u16()),
            message,
        });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ApiError::Decode(format!("{}: {}", endpoint, e)))
}

async fn file_part(path: &Path, file_name: &str, mime_type: &str) -> ApiResult<Part> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ApiError::File(format!("{}: {}", path.display(), e)))?;
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime_type)
        .map_err(|e| ApiError::File(e.to_string()))
}

#[async_trait]
impl AuditBackend for ApiClient {
    async fn extract(&self, file: &SourceFile) -> ApiResult<ReceiptData> {
        let part = file_part(&file.path, &file.file_name, &file.mime_type).await?;
        let form = Form::new().part("file", part);
        let request = self.http.post(self.url("/api/v1/ocr/extract")).multipart(form);
        self.send(request, "ocr/extract").await
    }

    async fn check(&self, receipt: &ReceiptData) -> ApiResult<AuditResult> {
        let request = self.http.post(self.url("/api/v1/audit/check")).json(receipt);
        self.send(request, "audit/check").await
    }

    async fn confirm(&self, payload: &ConfirmPayload) -> ApiResult<ConfirmResponse> {
        let request = self.http.post(self.url("/api/v1/audit/confirm")).json(payload);
        self.send(request, "audit/confirm").await
    }

    async fn batch_confirm(&self, receipts: &[ConfirmPayload]) -> ApiResult<ConfirmResponse> {
        let body = BatchConfirmRequest {
            receipts: receipts.to_vec(),
        };
        let request = self.http.post(self.url("/api/v1/audit/batch-confirm")).json(&body);
        self.send(request, "audit/batch-confirm").await
    }

    async fn list_rules(&self) -> ApiResult<RulesResponse> {
        let request = self.http.get(self.url("/api/v1/audit/rules"));
        self.send(request, "audit/rules").await
    }

    async fn upload_rules(&self, upload: &RulesUpload) -> ApiResult<AckResponse> {
        let mut form = Form::new();
        if let Some(path) = &upload.file {
            let mime = validation::rules_mime_type(path).unwrap_or("application/octet-stream");
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "rules".to_string());
            form = form.part("file", file_part(path, &file_name, mime).await?);
        }
        if let Some(text) = upload.text.as_deref().filter(|t| !t.trim().is_empty()) {
            form = form.text("text", text.to_string());
        }
        let request = self.http.post(self.url("/api/v1/audit/upload-rules")).multipart(form);
        self.send(request, "audit/upload-rules").await
    }

    async fn update_rule(&self, id: &str, content: &str) -> ApiResult<AckResponse> {
        let body = RuleUpdateRequest {
            content: content.to_string(),
        };
        let request = self
            .http
            .put(self.rule_url(id)?)
            .json(&body);
        self.send(request, "audit/rules/update").await
    }

    async fn delete_rule(&self, id: &str) -> ApiResult<AckResponse> {
        let request = self.http.delete(self.rule_url(id)?);
        self.send(request, "audit/rules/delete").await
    }

    async fn health(&self) -> ApiResult<HealthResponse> {
        let request = self.http.get(self.url("/health"));
        self.send(request, "health").await
    }
}
