//! ワークフロー状態
//!
//! 画面側の状態（現在ステップ・表示タブ・選択レコード・通知）と
//! レシートコレクションをまとめた `Session`。

use crate::record::{ReceiptStatus, RecordId};
use crate::store::ReceiptStore;
use serde::{Deserialize, Serialize};

/// ワークフローのステップ
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowStep {
    /// 1. レシートアップロード
    #[default]
    Upload,
    /// 2. データ編集 & 監査
    Review,
    /// 3. 最終結果
    Results,
}

impl WorkflowStep {
    pub const ALL: [WorkflowStep; 3] = [WorkflowStep::Upload, WorkflowStep::Review, WorkflowStep::Results];

    pub fn number(&self) -> u8 {
        match self {
            WorkflowStep::Upload => 1,
            WorkflowStep::Review => 2,
            WorkflowStep::Results => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WorkflowStep::Upload => "レシートアップロード",
            WorkflowStep::Review => "データ編集 & 監査",
            WorkflowStep::Results => "最終結果",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub step: WorkflowStep,
    pub active_tab: WorkflowStep,
    pub selected: Option<RecordId>,
    /// 直近のバッチ処理の通知（失敗件数など）
    pub notice: Option<String>,
}

impl WorkflowState {
    /// ステップを進め、表示タブも合わせる
    pub fn advance_to(&mut self, step: WorkflowStep) {
        self.step = step;
        self.active_tab = step;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// セッション全体の状態
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    pub store: ReceiptStore,
    pub state: WorkflowState,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// コレクションとワークフロー状態を初期化
    pub fn reset(&mut self) {
        self.store.clear();
        self.state.reset();
    }

    /// 選択中のレコードID
    ///
    /// 未選択または削除済みの場合は先頭レコード
    pub fn selected_id(&self) -> Option<RecordId> {
        self.state
            .selected
            .as_ref()
            .filter(|id| self.store.contains(id))
            .cloned()
            .or_else(|| self.store.records().first().map(|r| r.id.clone()))
    }

    /// 未選択なら最初の extracted レコードを選択
    pub fn select_first_extracted(&mut self) {
        let has_selection = self
            .state
            .selected
            .as_ref()
            .is_some_and(|id| self.store.contains(id));
        if has_selection {
            return;
        }
        if let Some(record) = self.store.iter().find(|r| r.status == ReceiptStatus::Extracted) {
            self.state.selected = Some(record.id.clone());
        }
    }

    /// レコード削除（選択中なら選択解除）
    pub fn remove(&mut self, id: &RecordId) -> bool {
        let removed = self.store.remove(id).is_some();
        if removed && self.state.selected.as_ref() == Some(id) {
            self.state.selected = None;
        }
        removed
    }
}
