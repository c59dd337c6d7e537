//! デモシナリオ
//!
//! バックエンドなしで編集・監査画面を試すための抽出済みデータ

use crate::types::{ReceiptData, ReceiptItem};

/// デモシナリオ
#[derive(Debug, Clone, Copy)]
pub struct DemoScenario {
    pub name: &'static str,
    build: fn() -> ReceiptData,
}

impl DemoScenario {
    pub fn data(&self) -> ReceiptData {
        (self.build)()
    }

    /// "Scenario B: Alcohol Violation" → "Alcohol Violation"
    pub fn short_name(&self) -> &'static str {
        self.name
            .split_once(": ")
            .map(|(_, rest)| rest)
            .unwrap_or(self.name)
    }

    /// "Scenario B: ..." → "b"
    fn key(&self) -> Option<String> {
        let (prefix, _) = self.name.split_once(':')?;
        prefix.split_whitespace().last().map(|k| k.to_lowercase())
    }

    fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        !query.is_empty()
            && (self.name.to_lowercase() == query
                || self.short_name().to_lowercase() == query
                || self.key().as_deref() == Some(query.as_str()))
    }
}

fn normal_office_supply() -> ReceiptData {
    let items = vec![
        ReceiptItem::new(1, "A4 Paper (500 sheets)", 5500, 2),
        ReceiptItem::new(2, "Ballpoint Pen Black", 1200, 5),
    ];
    ReceiptData {
        receipt_id: "DEMO-001".into(),
        store_name: "Alpha Stationeries".into(),
        date: "2026-02-10 14:00".into(),
        total_price: crate::editor::total_price(&items),
        items,
        image_url: None,
    }
}

fn alcohol_violation() -> ReceiptData {
    let items = vec![
        ReceiptItem::new(1, "Soju (Chamisul)", 1800, 3),
        ReceiptItem::new(2, "Snack", 1500, 1),
        ReceiptItem::new(3, "Beer (Cass)", 2500, 2),
    ];
    ReceiptData {
        receipt_id: "DEMO-002".into(),
        store_name: "GS25 Convenience".into(),
        date: "2026-02-11 19:30".into(),
        total_price: crate::editor::total_price(&items),
        items,
        image_url: None,
    }
}

pub const SCENARIOS: &[DemoScenario] = &[
    DemoScenario {
        name: "Scenario A: Normal Office Supply",
        build: normal_office_supply,
    },
    DemoScenario {
        name: "Scenario B: Alcohol Violation",
        build: alcohol_violation,
    },
];

/// 名前・短縮名・キー（"a", "b"）でシナリオを検索
pub fn find_scenario(query: &str) -> Option<&'static DemoScenario> {
    SCENARIOS.iter().find(|s| s.matches(query))
}
