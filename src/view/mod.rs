//! テキスト表示
//!
//! セッション状態だけから文字列を組み立てる（副作用なし）

use receipt_audit_common::{
    AuditResult, ReceiptData, ReceiptRecord, RiskLevel, RulesResponse, RulesMode, Session,
    WorkflowState, WorkflowStep, SCENARIOS,
};
use std::fmt::Write as _;

/// 3桁区切り
pub fn format_amount(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_size(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    let b = bytes as f64;
    if b >= KB * KB {
        format!("{:.1} MB", b / (KB * KB))
    } else if b >= KB {
        format!("{:.1} KB", b / KB)
    } else {
        format!("{} B", bytes)
    }
}

pub fn risk_label(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::High => "高リスク",
        RiskLevel::Medium => "中リスク",
        RiskLevel::Low => "低リスク",
    }
}

/// ステップバー
///
/// 例: `✔ 1.レシートアップロード ─ ▶ 2.データ編集 & 監査 ─ 3.最終結果`
pub fn step_bar(state: &WorkflowState) -> String {
    WorkflowStep::ALL
        .iter()
        .map(|step| {
            let mark = if *step < state.step {
                "✔ "
            } else if *step == state.step {
                "▶ "
            } else {
                ""
            };
            format!("{}{}.{}", mark, step.number(), step.label())
        })
        .collect::<Vec<_>>()
        .join(" ─ ")
}

fn record_line(record: &ReceiptRecord, selected: bool) -> String {
    let cursor = if selected { ">" } else { " " };
    let detail = match &record.source {
        Some(src) => format_size(src.size),
        None => "デモ".to_string(),
    };
    let mut line = format!(
        "{} {}  {}  ({})  [{}]",
        cursor,
        record.id,
        record.display_name(),
        detail,
        record.status.label()
    );
    if let Some(err) = &record.error {
        let _ = write!(line, "  ⚠ {}", err);
    }
    if let Some(report) = &record.report {
        let _ = write!(line, "  📄 {}", report.filename);
    }
    line
}

/// アップロード一覧とデモシナリオ
pub fn upload_stage(session: &Session) -> String {
    let mut out = String::new();
    let selected = session.selected_id();

    if session.store.is_empty() {
        out.push_str("レシートがありません\n");
    } else {
        let _ = writeln!(out, "レシート: {}件", session.store.len());
        for record in session.store.iter() {
            let is_selected = selected.as_ref() == Some(&record.id);
            let _ = writeln!(out, "{}", record_line(record, is_selected));
        }
    }

    out.push_str("\nデモシナリオ:\n");
    for scenario in SCENARIOS {
        let _ = writeln!(out, "  - {}", scenario.name);
    }
    out
}

/// 抽出データの明細表
pub fn receipt_table(data: &ReceiptData) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "レシートID: {}", data.receipt_id);
    let _ = writeln!(out, "店舗: {}", data.store_name);
    let _ = writeln!(out, "日時: {}", data.date);
    let _ = writeln!(out, "{:>3}  {:<24} {:>10} {:>5} {:>12}", "#", "品名", "単価", "数量", "金額");
    for item in &data.items {
        let _ = writeln!(
            out,
            "{:>3}  {:<24} {:>10} {:>5} {:>12}",
            item.id,
            item.name,
            format_amount(item.unit_price),
            item.count,
            format_amount(item.price)
        );
    }
    let _ = writeln!(out, "合計: {}", format_amount(data.total_price));
    out
}

/// 選択中レコードの確認・編集画面
pub fn review_stage(session: &Session) -> String {
    let Some(id) = session.selected_id() else {
        return "レシートがありません\n".to_string();
    };
    let Some(record) = session.store.get(&id) else {
        return "レシートがありません\n".to_string();
    };

    let mut out = format!("[{}] {}  [{}]\n", record.id, record.display_name(), record.status.label());
    match &record.receipt_data {
        Some(data) => out.push_str(&receipt_table(data)),
        None => out.push_str("抽出データがありません\n"),
    }
    if let Some(err) = &record.error {
        let _ = writeln!(out, "⚠ {}", err);
    }
    out
}

/// 監査結果の詳細
pub fn audit_detail(result: &AuditResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "判定: {}  違反スコア: {}%  ({})",
        result.audit_decision,
        result.score_percent(),
        risk_label(result.risk_level())
    );
    if result.violations.is_empty() {
        out.push_str("違反: なし\n");
    } else {
        out.push_str("違反:\n");
        for v in &result.violations {
            let target = if v.item_id == 0 {
                "全体".to_string()
            } else {
                format!("明細#{}", v.item_id)
            };
            let _ = writeln!(out, "  - [{}] {} ({})", target, v.reason, v.policy_reference);
        }
    }
    if !result.reasoning.is_empty() {
        let _ = writeln!(out, "根拠: {}", result.reasoning);
    }
    out
}

/// 監査結果一覧
pub fn results_stage(session: &Session) -> String {
    let mut out = String::new();
    let mut shown = 0;
    for record in session.store.iter() {
        let Some(result) = &record.audit_result else {
            continue;
        };
        shown += 1;
        let _ = writeln!(out, "{}", record_line(record, false).trim_start());
        for line in audit_detail(result).lines() {
            let _ = writeln!(out, "    {}", line);
        }
    }
    if shown == 0 {
        out.push_str("監査結果がありません\n");
    }
    out
}

/// 規程一覧
pub fn rules_panel(rules: &RulesResponse) -> String {
    let mut out = String::new();
    let mode = match rules.mode {
        RulesMode::Rag => "RAG",
        RulesMode::Fallback => "既定ルール",
    };
    let _ = write!(out, "モード: {}", mode);
    if let Some(chunks) = rules.total_chunks {
        let _ = write!(out, "  チャンク数: {}", chunks);
    }
    out.push('\n');

    if rules.rules.is_empty() {
        out.push_str("規程がありません\n");
    }
    for entry in &rules.rules {
        let id = entry.id.as_deref().unwrap_or("-");
        let lock = if rules.is_editable(entry) { "" } else { " 🔒" };
        let _ = writeln!(out, "[{}] {}{}", id, entry.title, lock);
        for line in entry.content.lines().take(3) {
            let _ = writeln!(out, "    {}", line);
        }
    }
    out
}

/// 現在のタブを表示
pub fn render(session: &Session) -> String {
    let mut out = step_bar(&session.state);
    out.push_str("\n\n");
    if let Some(notice) = &session.state.notice {
        let _ = writeln!(out, "⚠ {}\n", notice);
    }
    let body = match session.state.active_tab {
        WorkflowStep::Upload => upload_stage(session),
        WorkflowStep::Review => review_stage(session),
        WorkflowStep::Results => results_stage(session),
    };
    out.push_str(&body);
    out
}
