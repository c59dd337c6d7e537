//! レシートコレクション
//!
//! 追加順を保持するレコード列。更新はすべて `add` / `update` / `remove` /
//! `replace_all` を経由する。

use crate::error::{Error, Result};
use crate::record::{ReceiptRecord, ReceiptStatus, RecordId, RecordPatch, SourceFile};
use crate::types::ReceiptData;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReceiptStore {
    records: Vec<ReceiptRecord>,
    /// ID生成用の連番
    #[serde(default)]
    seq: u64,
    /// サーバー呼び出し中のレコード（永続化しない）
    #[serde(skip)]
    in_flight: HashSet<RecordId>,
}

impl ReceiptStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&mut self, seed: &str) -> RecordId {
        loop {
            self.seq += 1;
            let id = RecordId::generate(seed, self.seq);
            if !self.contains(&id) {
                return id;
            }
        }
    }

    /// ファイルを pending レコードとして末尾に追加
    pub fn add(&mut self, files: Vec<SourceFile>) -> Vec<RecordId> {
        files
            .into_iter()
            .map(|file| {
                let id = self.next_id(&file.file_name);
                self.records.push(ReceiptRecord::from_file(id.clone(), file));
                id
            })
            .collect()
    }

    /// 抽出済みデータを extracted レコードとして追加
    pub fn add_extracted(&mut self, data: ReceiptData) -> RecordId {
        let id = self.next_id(&data.receipt_id);
        self.records.push(ReceiptRecord::from_data(id.clone(), data));
        id
    }

    /// 部分更新（IDが存在しなければ何もしない）
    pub fn update(&mut self, id: &RecordId, patch: RecordPatch) -> bool {
        match self.records.iter_mut().find(|r| &r.id == id) {
            Some(record) => {
                record.apply(patch);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &RecordId) -> Option<ReceiptRecord> {
        let index = self.records.iter().position(|r| &r.id == id)?;
        self.in_flight.remove(id);
        Some(self.records.remove(index))
    }

    /// 全件置き換え
    pub fn replace_all(&mut self, records: Vec<ReceiptRecord>) {
        self.in_flight.retain(|id| records.iter().any(|r| &r.id == id));
        self.records = records;
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.in_flight.clear();
    }

    pub fn get(&self, id: &RecordId) -> Option<&ReceiptRecord> {
        self.records.iter().find(|r| &r.id == id)
    }

    pub fn require(&self, id: &RecordId) -> Result<&ReceiptRecord> {
        self.get(id).ok_or_else(|| Error::RecordNotFound(id.to_string()))
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.get(id).is_some()
    }

    pub fn records(&self) -> &[ReceiptRecord] {
        &self.records
    }

    pub fn ids(&self) -> Vec<RecordId> {
        self.records.iter().map(|r| r.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReceiptRecord> {
        self.records.iter()
    }

    fn filter_ids<F>(&self, pred: F) -> Vec<RecordId>
    where
        F: Fn(&ReceiptRecord) -> bool,
    {
        self.records.iter().filter(|r| pred(r)).map(|r| r.id.clone()).collect()
    }

    /// OCR対象: pending / error
    pub fn extractable(&self) -> Vec<RecordId> {
        self.filter_ids(|r| matches!(r.status, ReceiptStatus::Pending | ReceiptStatus::Error))
    }

    /// 監査対象: extracted / error かつ抽出データあり
    pub fn auditable(&self) -> Vec<RecordId> {
        self.filter_ids(|r| {
            matches!(r.status, ReceiptStatus::Extracted | ReceiptStatus::Error)
                && r.receipt_data.is_some()
        })
    }

    /// レポート対象: audited
    pub fn confirmable(&self) -> Vec<RecordId> {
        self.filter_ids(|r| {
            r.status == ReceiptStatus::Audited
                && r.receipt_data.is_some()
                && r.audit_result.is_some()
        })
    }

    /// サーバー呼び出し開始をマーク
    ///
    /// 既に処理中なら `RecordBusy`
    pub fn begin(&mut self, id: &RecordId) -> Result<()> {
        if !self.contains(id) {
            return Err(Error::RecordNotFound(id.to_string()));
        }
        if !self.in_flight.insert(id.clone()) {
            return Err(Error::RecordBusy(id.to_string()));
        }
        Ok(())
    }

    pub fn finish(&mut self, id: &RecordId) {
        self.in_flight.remove(id);
    }

    pub fn is_busy(&self, id: &RecordId) -> bool {
        self.in_flight.contains(id)
    }

    /// 中断された処理中レコードを error に戻す
    ///
    /// 戻したレコード数を返す
    pub fn recover_interrupted(&mut self) -> usize {
        let mut count = 0;
        for record in self.records.iter_mut().filter(|r| r.status.is_in_progress()) {
            record.apply(RecordPatch::failed("処理が中断されました"));
            count += 1;
        }
        count
    }
}
