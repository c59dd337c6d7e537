//! 抽出データの編集
//!
//! 明細の単価・数量を変更すると金額を再計算し、
//! 明細の追加・変更・削除のたびに合計金額を再計算する。

use crate::error::{Error, Result};
use crate::types::{ReceiptData, ReceiptItem};

/// 明細フィールドの変更内容
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemEdit {
    Name(String),
    UnitPrice(u64),
    Count(u32),
}

/// レシート全体の編集操作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiptEdit {
    StoreName(String),
    Date(String),
    Item { item_id: u32, edit: ItemEdit },
    AddItem,
    RemoveItem(u32),
}

/// 合計金額を計算
pub fn total_price(items: &[ReceiptItem]) -> u64 {
    items.iter().fold(0u64, |sum, item| sum.saturating_add(item.price))
}

/// 次の明細ID（既存の最大値 + 1）
///
/// 最大値が `u32::MAX` の場合は `None`
pub fn next_item_id(items: &[ReceiptItem]) -> Option<u32> {
    items.iter().map(|i| i.id).max().unwrap_or(0).checked_add(1)
}

impl ReceiptData {
    /// 合計金額を明細から再計算
    pub fn recompute_total(&mut self) {
        self.total_price = total_price(&self.items);
    }

    /// 合計金額が明細と一致しているか
    pub fn is_consistent(&self) -> bool {
        self.total_price == total_price(&self.items)
            && self
                .items
                .iter()
                .all(|i| i.price == i.unit_price.saturating_mul(i.count as u64))
    }

    /// 編集を適用
    ///
    /// 追加した明細のIDは `Ok(Some(id))` で返す
    pub fn apply(&mut self, edit: ReceiptEdit) -> Result<Option<u32>> {
        let mut added = None;
        match edit {
            ReceiptEdit::StoreName(name) => self.store_name = name,
            ReceiptEdit::Date(date) => self.date = date,
            ReceiptEdit::Item { item_id, edit } => {
                let item = self
                    .items
                    .iter_mut()
                    .find(|i| i.id == item_id)
                    .ok_or(Error::ItemNotFound(item_id))?;
                match edit {
                    ItemEdit::Name(name) => item.name = name,
                    ItemEdit::UnitPrice(price) => {
                        item.unit_price = price;
                        item.price = price.saturating_mul(item.count as u64);
                    }
                    ItemEdit::Count(0) => return Err(Error::InvalidCount(0)),
                    ItemEdit::Count(count) => {
                        item.count = count;
                        item.price = item.unit_price.saturating_mul(count as u64);
                    }
                }
            }
            ReceiptEdit::AddItem => {
                let id = next_item_id(&self.items).ok_or(Error::ItemIdExhausted)?;
                self.items.push(ReceiptItem::new(id, "", 0, 1));
                added = Some(id);
            }
            ReceiptEdit::RemoveItem(item_id) => {
                let before = self.items.len();
                self.items.retain(|i| i.id != item_id);
                if self.items.len() == before {
                    return Err(Error::ItemNotFound(item_id));
                }
            }
        }
        self.recompute_total();
        Ok(added)
    }
}
