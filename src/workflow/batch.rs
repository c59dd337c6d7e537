//! バッチ処理の集計

use crate::download::ReportArtifact;
use receipt_audit_common::{RecordId, WorkflowStep};

/// バッチ処理の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchKind {
    Extract,
    Audit,
    Confirm,
}

impl BatchKind {
    pub fn label(&self) -> &'static str {
        match self {
            BatchKind::Extract => "レシート処理",
            BatchKind::Audit => "監査処理",
            BatchKind::Confirm => "PDF生成",
        }
    }

    /// 1件以上成功した場合に進むステップ
    pub fn target_step(&self) -> WorkflowStep {
        match self {
            BatchKind::Extract => WorkflowStep::Review,
            BatchKind::Audit | BatchKind::Confirm => WorkflowStep::Results,
        }
    }
}

/// 1件ごとの進捗
#[derive(Debug, Clone)]
pub struct BatchProgress {
    pub kind: BatchKind,
    /// 0始まり
    pub index: usize,
    pub total: usize,
    pub id: RecordId,
    pub error: Option<String>,
}

/// バッチ処理の結果
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub kind: BatchKind,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<(RecordId, String)>,
    /// Confirm のみ
    pub artifacts: Vec<ReportArtifact>,
}

impl BatchReport {
    pub fn new(kind: BatchKind, attempted: usize) -> Self {
        Self {
            kind,
            attempted,
            succeeded: 0,
            failures: Vec::new(),
            artifacts: Vec::new(),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn advanced(&self) -> bool {
        self.succeeded > 0
    }

    /// 失敗件数の通知文
    pub fn notice(&self) -> Option<String> {
        if self.failures.is_empty() {
            None
        } else {
            Some(format!("{}件の{}に失敗しました", self.failed(), self.kind.label()))
        }
    }
}
