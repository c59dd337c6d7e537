//! ワークフロー制御
//!
//! レシートごとの処理（OCR抽出 → 監査 → レポート）を順に実行する。
//!
//! - 単体処理: ステータスを処理中にしてAPIを呼び、結果を保存する。
//!   失敗時は error にしてメッセージを記録し、呼び出し元にも返す
//! - バッチ処理: 対象レコードを1件ずつ順番に処理する（並列にしない）。
//!   途中の失敗では止めず、最後に失敗件数を通知する
//!
//! セッションのロックは `.await` をまたいで保持しない。

mod batch;

pub use batch::{BatchKind, BatchProgress, BatchReport};

use crate::api::AuditBackend;
use crate::download::{self, ReportArtifact};
use crate::error::{AuditError, Result};
use crate::preview;
use receipt_audit_common::{
    find_scenario, AuditResult, ConfirmPayload, ReceiptData, ReceiptEdit, ReceiptStatus,
    RecordId, RecordPatch, Session, SourceFile, WorkflowStep,
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub type SharedSession = Arc<Mutex<Session>>;

fn lock(session: &SharedSession) -> MutexGuard<'_, Session> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// サーバー呼び出し中フラグ（drop で解除）
struct InFlight {
    session: SharedSession,
    ids: Vec<RecordId>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let mut session = lock(&self.session);
        for id in &self.ids {
            session.store.finish(id);
        }
    }
}

pub struct Workflow<B> {
    backend: B,
    session: SharedSession,
    previews: Mutex<Vec<JoinHandle<()>>>,
    preview_max_size: u32,
}

impl<B: AuditBackend> Workflow<B> {
    pub fn new(backend: B, session: Session) -> Self {
        Self {
            backend,
            session: Arc::new(Mutex::new(session)),
            previews: Mutex::new(Vec::new()),
            preview_max_size: 320,
        }
    }

    pub fn with_preview_size(mut self, max_size: u32) -> Self {
        self.preview_max_size = max_size;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> SharedSession {
        Arc::clone(&self.session)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        lock(&self.session)
    }

    /// 現在のセッション状態のコピー
    pub fn snapshot(&self) -> Session {
        self.lock().clone()
    }

    fn in_flight(&self, ids: Vec<RecordId>) -> InFlight {
        InFlight {
            session: Arc::clone(&self.session),
            ids,
        }
    }

    // =============================================
    // コレクション操作
    // =============================================

    /// ファイルを追加し、プレビュー生成を開始
    ///
    /// tokio ランタイム上で呼ぶこと
    pub fn add_files(&self, files: Vec<SourceFile>) -> Vec<RecordId> {
        let paths: Vec<_> = files.iter().map(|f| f.path.clone()).collect();
        let ids = self.lock().store.add(files);

        let mut previews = self.previews.lock().unwrap_or_else(PoisonError::into_inner);
        for (id, path) in ids.iter().cloned().zip(paths) {
            let session = Arc::clone(&self.session);
            previews.push(preview::spawn_preview(id, path, self.preview_max_size, move |id, uri| {
                // 削除済みなら何もしない
                lock(&session).store.update(&id, RecordPatch::preview(uri));
            }));
        }
        info!(count = ids.len(), "レシート追加");
        ids
    }

    /// 実行中のプレビュー生成を待つ
    pub async fn wait_previews(&self) {
        let handles = std::mem::take(&mut *self.previews.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "プレビュータスクの待機に失敗");
            }
        }
    }

    /// デモシナリオを extracted レコードとして追加（通信なし）
    pub fn load_scenario(&self, name: &str) -> Result<RecordId> {
        let scenario = find_scenario(name).ok_or_else(|| AuditError::UnknownScenario(name.to_string()))?;
        let mut session = self.lock();
        let id = session.store.add_extracted(scenario.data());
        session.state.selected = Some(id.clone());
        session.state.advance_to(WorkflowStep::Review);
        info!(record = %id, scenario = scenario.name, "デモシナリオ読み込み");
        Ok(id)
    }

    pub fn select(&self, id: &RecordId) -> Result<()> {
        let mut session = self.lock();
        session.store.require(id)?;
        session.state.selected = Some(id.clone());
        Ok(())
    }

    pub fn remove(&self, id: &RecordId) -> bool {
        self.lock().remove(id)
    }

    pub fn reset(&self) {
        self.lock().reset();
    }

    /// 抽出データを編集
    ///
    /// 明細を追加した場合はそのIDを返す
    pub fn edit(&self, id: &RecordId, edit: ReceiptEdit) -> Result<Option<u32>> {
        let mut session = self.lock();
        if session.store.is_busy(id) {
            return Err(receipt_audit_common::Error::RecordBusy(id.to_string()).into());
        }
        let mut data = session
            .store
            .require(id)?
            .receipt_data
            .clone()
            .ok_or_else(|| AuditError::MissingReceiptData(id.to_string()))?;
        let added = data.apply(edit)?;
        session.store.update(id, RecordPatch::default().with_receipt_data(data));
        Ok(added)
    }

    // =============================================
    // 単体処理
    // =============================================

    /// OCR抽出
    pub async fn extract_one(&self, id: &RecordId) -> Result<ReceiptData> {
        let (source, _guard) = {
            let mut session = self.lock();
            let source = session
                .store
                .require(id)?
                .source
                .clone()
                .ok_or_else(|| AuditError::MissingSource(id.to_string()))?;
            session.store.begin(id)?;
            session.store.update(id, RecordPatch::started(ReceiptStatus::Extracting));
            (source, self.in_flight(vec![id.clone()]))
        };

        debug!(record = %id, file = %source.file_name, "OCR抽出開始");
        match self.backend.extract(&source).await {
            Ok(data) => {
                let patch = RecordPatch::status(ReceiptStatus::Extracted).with_receipt_data(data.clone());
                self.lock().store.update(id, patch);
                info!(record = %id, items = data.items.len(), "OCR抽出完了");
                Ok(data)
            }
            Err(e) => {
                self.lock().store.update(id, RecordPatch::failed(e.message()));
                warn!(record = %id, error = %e, "OCR抽出失敗");
                Err(e.into())
            }
        }
    }

    /// 監査チェック
    pub async fn audit_one(&self, id: &RecordId) -> Result<AuditResult> {
        let (data, _guard) = {
            let mut session = self.lock();
            let data = session
                .store
                .require(id)?
                .receipt_data
                .clone()
                .ok_or_else(|| AuditError::MissingReceiptData(id.to_string()))?;
            session.store.begin(id)?;
            session.store.update(id, RecordPatch::started(ReceiptStatus::Auditing));
            (data, self.in_flight(vec![id.clone()]))
        };

        debug!(record = %id, receipt = %data.receipt_id, "監査開始");
        match self.backend.check(&data).await {
            Ok(result) => {
                let patch = RecordPatch::status(ReceiptStatus::Audited).with_audit_result(result.clone());
                self.lock().store.update(id, patch);
                info!(record = %id, decision = %result.audit_decision, "監査完了");
                Ok(result)
            }
            Err(e) => {
                self.lock().store.update(id, RecordPatch::failed(e.message()));
                warn!(record = %id, error = %e, "監査失敗");
                Err(e.into())
            }
        }
    }

    /// 単票PDFレポート生成
    ///
    /// ステータスに処理中状態がないため、処理中フラグのみ立てる
    pub async fn confirm_one(&self, id: &RecordId) -> Result<ReportArtifact> {
        let (payload, _guard) = {
            let mut session = self.lock();
            let record = session.store.require(id)?;
            let receipt_data = record
                .receipt_data
                .clone()
                .ok_or_else(|| AuditError::MissingReceiptData(id.to_string()))?;
            let audit_result = record
                .audit_result
                .clone()
                .ok_or_else(|| AuditError::MissingAuditResult(id.to_string()))?;
            session.store.begin(id)?;
            (
                ConfirmPayload { receipt_data, audit_result },
                self.in_flight(vec![id.clone()]),
            )
        };

        let fallback = download::single_report_name(&payload.receipt_data.receipt_id);
        let outcome = match self.backend.confirm(&payload).await {
            Ok(response) => download::decode_report(&response, &fallback),
            Err(e) => Err(e.into()),
        };

        match outcome {
            Ok(artifact) => {
                self.lock()
                    .store
                    .update(id, RecordPatch::default().with_report(artifact.info()));
                info!(record = %id, file = %artifact.filename, "レポート生成完了");
                Ok(artifact)
            }
            Err(e) => {
                self.lock().store.update(id, RecordPatch::failed(e.record_message()));
                warn!(record = %id, error = %e, "レポート生成失敗");
                Err(e)
            }
        }
    }

    /// 監査済みレコードをまとめて1つのPDFにする
    ///
    /// 全体が成功した場合のみレポートを返す。失敗時はレコードを変更しない
    pub async fn confirm_batch(&self) -> Result<ReportArtifact> {
        let (ids, payloads, _guard) = {
            let mut session = self.lock();
            session.state.notice = None;
            let ids = session.store.confirmable();
            if ids.is_empty() {
                return Err(AuditError::NoEligibleRecords);
            }

            let mut begun: Vec<RecordId> = Vec::new();
            for id in &ids {
                if let Err(e) = session.store.begin(id) {
                    for started in &begun {
                        session.store.finish(started);
                    }
                    return Err(e.into());
                }
                begun.push(id.clone());
            }

            let payloads: Vec<ConfirmPayload> = ids
                .iter()
                .filter_map(|id| session.store.get(id))
                .filter_map(|r| {
                    Some(ConfirmPayload {
                        receipt_data: r.receipt_data.clone()?,
                        audit_result: r.audit_result.clone()?,
                    })
                })
                .collect();
            (ids, payloads, self.in_flight(begun))
        };

        info!(count = payloads.len(), "一括レポート生成開始");
        let outcome = match self.backend.batch_confirm(&payloads).await {
            Ok(response) => download::decode_report(&response, download::BATCH_REPORT_NAME),
            Err(e) => Err(e.into()),
        };

        let mut session = self.lock();
        match outcome {
            Ok(artifact) => {
                for id in &ids {
                    session
                        .store
                        .update(id, RecordPatch::default().with_report(artifact.info()));
                }
                Ok(artifact)
            }
            Err(e) => {
                session.state.notice = Some(e.record_message());
                warn!(error = %e, "一括レポート生成失敗");
                Err(e)
            }
        }
    }

    // =============================================
    // バッチ処理
    // =============================================

    fn eligible(&self, kind: BatchKind) -> Vec<RecordId> {
        let session = self.lock();
        match kind {
            BatchKind::Extract => session.store.extractable(),
            BatchKind::Audit => session.store.auditable(),
            BatchKind::Confirm => session.store.confirmable(),
        }
    }

    async fn run_one(&self, kind: BatchKind, id: &RecordId) -> Result<Option<ReportArtifact>> {
        match kind {
            BatchKind::Extract => self.extract_one(id).await.map(|_| None),
            BatchKind::Audit => self.audit_one(id).await.map(|_| None),
            BatchKind::Confirm => self.confirm_one(id).await.map(Some),
        }
    }

    /// 対象レコードを1件ずつ処理
    ///
    /// 対象は開始時点で確定する。1件以上成功した場合のみステップを進める
    pub async fn run_batch(
        &self,
        kind: BatchKind,
        progress: &mut dyn FnMut(&BatchProgress),
    ) -> BatchReport {
        self.lock().state.notice = None;
        let ids = self.eligible(kind);
        let total = ids.len();
        let mut report = BatchReport::new(kind, total);

        for (index, id) in ids.into_iter().enumerate() {
            let error = match self.run_one(kind, &id).await {
                Ok(artifact) => {
                    report.succeeded += 1;
                    report.artifacts.extend(artifact);
                    None
                }
                Err(e) => {
                    let message = e.record_message();
                    report.failures.push((id.clone(), message.clone()));
                    Some(message)
                }
            };
            progress(&BatchProgress { kind, index, total, id, error });
        }

        let mut session = self.lock();
        if report.advanced() {
            session.state.advance_to(kind.target_step());
            if kind == BatchKind::Extract {
                session.select_first_extracted();
            }
        }
        session.state.notice = report.notice();
        info!(
            kind = kind.label(),
            attempted = report.attempted,
            succeeded = report.succeeded,
            "バッチ処理完了"
        );
        report
    }

    pub async fn extract_all(&self) -> BatchReport {
        self.run_batch(BatchKind::Extract, &mut |_| {}).await
    }

    pub async fn audit_all(&self) -> BatchReport {
        self.run_batch(BatchKind::Audit, &mut |_| {}).await
    }

    pub async fn confirm_all(&self) -> BatchReport {
        self.run_batch(BatchKind::Confirm, &mut |_| {}).await
    }
}
