//! レシート処理レコード
//!
//! 1件のレシート（アップロード画像またはデモデータ）と、その処理状態。

use crate::types::{AuditResult, ReceiptData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::PathBuf;

/// クライアント側で生成するレコードID（不透明な文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    const LEN: usize = 7;

    /// シード・連番・現在時刻からIDを生成
    pub fn generate(seed: &str, seq: u64) -> Self {
        let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(seed.as_bytes());
        hasher.update(seq.to_le_bytes());
        hasher.update(nanos.to_le_bytes());
        let digest = hex::encode(hasher.finalize());
        Self(digest[..Self::LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 処理ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    #[default]
    Pending,
    Extracting,
    Extracted,
    Auditing,
    Audited,
    Error,
}

impl ReceiptStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "pending",
            ReceiptStatus::Extracting => "extracting",
            ReceiptStatus::Extracted => "extracted",
            ReceiptStatus::Auditing => "auditing",
            ReceiptStatus::Audited => "audited",
            ReceiptStatus::Error => "error",
        }
    }

    /// 表示ラベル
    pub fn label(&self) -> &'static str {
        match self {
            ReceiptStatus::Pending => "待機中",
            ReceiptStatus::Extracting => "OCR処理中",
            ReceiptStatus::Extracted => "データ確認中",
            ReceiptStatus::Auditing => "監査中",
            ReceiptStatus::Audited => "監査完了",
            ReceiptStatus::Error => "エラー",
        }
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, ReceiptStatus::Extracting | ReceiptStatus::Auditing)
    }
}

impl std::fmt::Display for ReceiptStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// アップロード元ファイル
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub file_name: String,
    pub size: u64,
    pub mime_type: String,
}

/// ダウンロード済みレポートの情報
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportInfo {
    pub filename: String,
    /// サーバー側の保存先
    #[serde(default)]
    pub pdf_url: String,
}

/// レシート処理レコード
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReceiptRecord {
    pub id: RecordId,
    #[serde(default)]
    pub source: Option<SourceFile>,
    /// サムネイルのData URI
    #[serde(default)]
    pub preview: Option<String>,
    #[serde(default)]
    pub receipt_data: Option<ReceiptData>,
    #[serde(default)]
    pub audit_result: Option<AuditResult>,
    #[serde(default)]
    pub status: ReceiptStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub report: Option<ReportInfo>,
    pub added_at: DateTime<Utc>,
}

impl ReceiptRecord {
    /// ファイル選択から作成（pending）
    pub fn from_file(id: RecordId, source: SourceFile) -> Self {
        Self {
            id,
            source: Some(source),
            preview: None,
            receipt_data: None,
            audit_result: None,
            status: ReceiptStatus::Pending,
            error: None,
            report: None,
            added_at: Utc::now(),
        }
    }

    /// 抽出済みデータから作成（デモシナリオ用）
    pub fn from_data(id: RecordId, data: ReceiptData) -> Self {
        Self {
            id,
            source: None,
            preview: None,
            receipt_data: Some(data),
            audit_result: None,
            status: ReceiptStatus::Extracted,
            error: None,
            report: None,
            added_at: Utc::now(),
        }
    }

    /// 表示名（ファイル名 → レシートID → レコードID）
    pub fn display_name(&self) -> String {
        if let Some(src) = &self.source {
            return src.file_name.clone();
        }
        if let Some(data) = &self.receipt_data {
            return data.receipt_id.clone();
        }
        self.id.to_string()
    }

    /// 部分更新をマージ
    pub fn apply(&mut self, patch: RecordPatch) {
        if let Some(preview) = patch.preview {
            self.preview = preview;
        }
        if let Some(data) = patch.receipt_data {
            self.receipt_data = data;
        }
        if let Some(audit) = patch.audit_result {
            self.audit_result = audit;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(error) = patch.error {
            self.error = error;
        }
        if let Some(report) = patch.report {
            self.report = report;
        }
    }
}

/// レコードの部分更新
///
/// 外側の `None` は「変更しない」、`Some(None)` は「クリア」
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    pub preview: Option<Option<String>>,
    pub receipt_data: Option<Option<ReceiptData>>,
    pub audit_result: Option<Option<AuditResult>>,
    pub status: Option<ReceiptStatus>,
    pub error: Option<Option<String>>,
    pub report: Option<Option<ReportInfo>>,
}

impl RecordPatch {
    pub fn status(status: ReceiptStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// 処理開始（エラーをクリア）
    pub fn started(status: ReceiptStatus) -> Self {
        Self {
            status: Some(status),
            error: Some(None),
            ..Default::default()
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: Some(ReceiptStatus::Error),
            error: Some(Some(message.into())),
            ..Default::default()
        }
    }

    pub fn preview(data_uri: String) -> Self {
        Self {
            preview: Some(Some(data_uri)),
            ..Default::default()
        }
    }

    pub fn with_receipt_data(mut self, data: ReceiptData) -> Self {
        self.receipt_data = Some(Some(data));
        self
    }

    pub fn with_audit_result(mut self, audit: AuditResult) -> Self {
        self.audit_result = Some(Some(audit));
        self
    }

    pub fn with_report(mut self, report: ReportInfo) -> Self {
        self.report = Some(Some(report));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> SourceFile {
        SourceFile {
            path: PathBuf::from("/tmp/receipt.jpg"),
            file_name: "receipt.jpg".into(),
            size: 2048,
            mime_type: "image/jpeg".into(),
        }
    }

    #[test]
    fn test_record_id_generate() {
        let a = RecordId::generate("receipt.jpg", 1);
        let b = RecordId::generate("receipt.jpg", 2);
        assert_eq!(a.as_str().len(), 7);
        assert!(a.as_str().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn test_status_serialize_lowercase() {
        let json = serde_json::to_string(&ReceiptStatus::Audited).unwrap();
        assert_eq!(json, "\"audited\"");
        assert!(ReceiptStatus::Extracting.is_in_progress());
        assert!(!ReceiptStatus::Error.is_in_progress());
    }

    #[test]
    fn test_patch_merges_only_given_fields() {
        let mut record = ReceiptRecord::from_file(RecordId::from("r1"), source());
        record.apply(RecordPatch::failed("OCR失敗"));
        assert_eq!(record.status, ReceiptStatus::Error);
        assert_eq!(record.error.as_deref(), Some("OCR失敗"));

        record.apply(RecordPatch::preview("data:image/jpeg;base64,AAAA".into()));
        assert_eq!(record.status, ReceiptStatus::Error);
        assert!(record.preview.is_some());

        record.apply(RecordPatch::started(ReceiptStatus::Extracting));
        assert_eq!(record.status, ReceiptStatus::Extracting);
        assert!(record.error.is_none());
        assert!(record.preview.is_some());
    }

    #[test]
    fn test_display_name_fallbacks() {
        let record = ReceiptRecord::from_file(RecordId::from("r1"), source());
        assert_eq!(record.display_name(), "receipt.jpg");

        let data = ReceiptData {
            receipt_id: "DEMO-002".into(),
            ..Default::default()
        };
        let record = ReceiptRecord::from_data(RecordId::from("r2"), data);
        assert_eq!(record.display_name(), "DEMO-002");
        assert_eq!(record.status, ReceiptStatus::Extracted);
    }
}
