//! バックエンドAPIの型定義
//!
//! サーバー側 (`/api/v1/ocr`, `/api/v1/audit`) のJSONスキーマと同じ構造:
//! - ReceiptData: OCR抽出結果（編集可能）
//! - AuditResult: 監査結果（バックエンドが生成、読み取り専用）
//! - ConfirmResponse: PDFレポート生成結果
//! - RulesResponse: 規程一覧

use serde::{Deserialize, Serialize};

/// 明細行
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// レシート内で一意な行ID
    pub id: u32,
    pub name: String,
    pub unit_price: u64,
    pub count: u32,
    /// unit_price × count
    pub price: u64,
}

impl ReceiptItem {
    pub fn new(id: u32, name: impl Into<String>, unit_price: u64, count: u32) -> Self {
        Self {
            id,
            name: name.into(),
            unit_price,
            count,
            price: unit_price.saturating_mul(count as u64),
        }
    }
}

/// OCR抽出結果
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptData {
    pub receipt_id: String,
    pub store_name: String,
    /// 取引日時（"2026-02-11 19:30" 形式、サーバー側の文字列をそのまま保持）
    pub date: String,
    #[serde(default)]
    pub items: Vec<ReceiptItem>,
    /// 明細金額の合計
    #[serde(default)]
    pub total_price: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// 監査判定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditDecision {
    Pass,
    #[serde(rename = "Anomaly Detected")]
    AnomalyDetected,
    Warning,
}

impl AuditDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditDecision::Pass => "Pass",
            AuditDecision::AnomalyDetected => "Anomaly Detected",
            AuditDecision::Warning => "Warning",
        }
    }
}

impl std::fmt::Display for AuditDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 違反項目
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// 対象の明細行ID（0はレシート全体）
    pub item_id: u32,
    pub reason: String,
    pub policy_reference: String,
}

/// 監査結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub audit_decision: AuditDecision,
    /// 0.0〜1.0
    pub violation_score: f64,
    #[serde(default)]
    pub violations: Vec<Violation>,
    #[serde(default)]
    pub reasoning: String,
}

/// リスク区分（表示用）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskLevel {
    High,
    Medium,
    Low,
}

impl AuditResult {
    pub fn risk_level(&self) -> RiskLevel {
        if self.violation_score > 0.7 {
            RiskLevel::High
        } else if self.violation_score > 0.3 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// スコアを百分率で返す（範囲外の値は丸める）
    pub fn score_percent(&self) -> u8 {
        (self.violation_score.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

/// confirm / batch-confirm のリクエスト要素
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmPayload {
    pub receipt_data: ReceiptData,
    pub audit_result: AuditResult,
}

/// batch-confirm リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfirmRequest {
    pub receipts: Vec<ConfirmPayload>,
}

/// PDFレポート生成レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmResponse {
    pub status: String,
    #[serde(default)]
    pub pdf_url: String,
    /// Base64エンコードされたPDF
    #[serde(default)]
    pub pdf_data: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    /// status が "error" の場合の理由
    #[serde(default)]
    pub message: Option<String>,
}

impl ConfirmResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// 規程操作の応答 `{status, message}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

impl AckResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// 規程エントリ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesEntry {
    /// 既定の規程では付与されない
    #[serde(default)]
    pub id: Option<String>,
    pub title: String,
    pub content: String,
}

/// 規程ストアの動作モード
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RulesMode {
    /// 永続ストア（編集可能）
    Rag,
    /// 既定の静的ルール
    Fallback,
}

/// 規程一覧レスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesResponse {
    pub mode: RulesMode,
    #[serde(default)]
    pub total_chunks: Option<u64>,
    #[serde(default)]
    pub rules: Vec<RulesEntry>,
}

impl RulesResponse {
    /// 編集・削除できるエントリか
    pub fn is_editable(&self, entry: &RulesEntry) -> bool {
        self.mode == RulesMode::Rag && entry.id.is_some()
    }

    pub fn find(&self, id: &str) -> Option<&RulesEntry> {
        self.rules.iter().find(|r| r.id.as_deref() == Some(id))
    }
}

/// 規程更新リクエスト
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuleUpdateRequest {
    pub content: String,
}

/// `/health` レスポンス
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// バックエンドのエラーボディ
///
/// FastAPIのバリデーションエラーでは `detail` が配列になるため、
/// 文字列以外は無視する
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiErrorBody {
    /// 表示用メッセージ（detail → message の順）
    pub fn message(&self) -> Option<String> {
        let detail = self
            .detail
            .as_ref()
            .and_then(|d| d.as_str())
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        detail.or_else(|| self.message.clone().filter(|s| !s.is_empty()))
    }
}
