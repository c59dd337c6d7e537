//! 対話式の抽出データ編集

use crate::api::AuditBackend;
use crate::error::{AuditError, Result};
use crate::view;
use crate::workflow::Workflow;
use dialoguer::Input;
use receipt_audit_common::{ItemEdit, ReceiptEdit, RecordId};

const HELP: &str = "操作: store <店舗名> / date <日時> / name <#> <品名> / price <#> <単価> / count <#> <数量> / add / del <#> / q:終了";

/// 編集アクション
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditAction {
    Apply(ReceiptEdit),
    Help,
    Quit,
}

fn parse_number<T: std::str::FromStr>(value: Option<&str>, what: &str) -> std::result::Result<T, String> {
    let value = value.ok_or_else(|| format!("{}を指定してください", what))?;
    value
        .trim()
        .replace(',', "")
        .parse()
        .map_err(|_| format!("{}が不正です: {}", what, value))
}

fn required_text(value: Option<&str>, what: &str) -> std::result::Result<String, String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(format!("{}を指定してください", what)),
    }
}

/// 1行の入力を編集操作に変換
pub fn parse_edit_command(line: &str) -> std::result::Result<EditAction, String> {
    let line = line.trim();
    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((c, r)) => (c, Some(r.trim())),
        None => (line, None),
    };

    let edit = match command {
        "" | "h" | "help" | "?" => return Ok(EditAction::Help),
        "q" | "Q" | "quit" => return Ok(EditAction::Quit),
        "store" => ReceiptEdit::StoreName(required_text(rest, "店舗名")?),
        "date" => ReceiptEdit::Date(required_text(rest, "日時")?),
        "add" => ReceiptEdit::AddItem,
        "del" | "rm" => ReceiptEdit::RemoveItem(parse_number(rest, "明細番号")?),
        "name" | "price" | "count" => {
            let (id, value) = match rest.and_then(|r| r.split_once(char::is_whitespace)) {
                Some((id, value)) => (Some(id), Some(value)),
                None => (rest, None),
            };
            let item_id = parse_number(id, "明細番号")?;
            let edit = match command {
                "name" => ItemEdit::Name(required_text(value, "品名")?),
                "price" => ItemEdit::UnitPrice(parse_number(value, "単価")?),
                _ => ItemEdit::Count(parse_number(value, "数量")?),
            };
            ReceiptEdit::Item { item_id, edit }
        }
        other => return Err(format!("不明な操作です: {}", other)),
    };
    Ok(EditAction::Apply(edit))
}

/// 対話式で抽出データを編集
pub fn run_interactive_edit<B: AuditBackend>(workflow: &Workflow<B>, id: &RecordId) -> Result<()> {
    println!("{}\n", view::review_stage(&workflow.snapshot()));
    println!("{}", HELP);
    println!("---\n");

    loop {
        let input: String = Input::new()
            .with_prompt("編集")
            .allow_empty(true)
            .interact_text()
            .map_err(|e| AuditError::Prompt(e.to_string()))?;

        match parse_edit_command(&input) {
            Ok(EditAction::Quit) => break,
            Ok(EditAction::Help) => println!("{}", HELP),
            Ok(EditAction::Apply(edit)) => match workflow.edit(id, edit) {
                Ok(added) => {
                    if let Some(item_id) = added {
                        println!("  → 明細#{}を追加", item_id);
                    }
                    if let Some(data) = workflow.snapshot().store.get(id).and_then(|r| r.receipt_data.as_ref()) {
                        println!("{}", view::receipt_table(data));
                    }
                }
                Err(e) => println!("  ⚠ {}", e),
            },
            Err(msg) => println!("  ⚠ {}", msg),
        }
    }

    println!("✓ 編集を終了しました");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_item_edits() {
        assert_eq!(
            parse_edit_command("price 2 1,500"),
            Ok(EditAction::Apply(ReceiptEdit::Item { item_id: 2, edit: ItemEdit::UnitPrice(1500) }))
        );
        assert_eq!(
            parse_edit_command("count 1 4"),
            Ok(EditAction::Apply(ReceiptEdit::Item { item_id: 1, edit: ItemEdit::Count(4) }))
        );
        assert_eq!(
            parse_edit_command("name 3 Green Tea 500ml"),
            Ok(EditAction::Apply(ReceiptEdit::Item {
                item_id: 3,
                edit: ItemEdit::Name("Green Tea 500ml".into())
            }))
        );
    }

    #[test]
    fn test_parse_receipt_edits() {
        assert_eq!(
            parse_edit_command("store GS25 Gangnam"),
            Ok(EditAction::Apply(ReceiptEdit::StoreName("GS25 Gangnam".into())))
        );
        assert_eq!(parse_edit_command("add"), Ok(EditAction::Apply(ReceiptEdit::AddItem)));
        assert_eq!(parse_edit_command("del 2"), Ok(EditAction::Apply(ReceiptEdit::RemoveItem(2))));
        assert_eq!(parse_edit_command("q"), Ok(EditAction::Quit));
        assert_eq!(parse_edit_command(""), Ok(EditAction::Help));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_edit_command("price 2").is_err());
        assert!(parse_edit_command("price x 100").is_err());
        assert!(parse_edit_command("count 1 -3").is_err());
        assert!(parse_edit_command("store").is_err());
        assert!(parse_edit_command("explode").is_err());
    }
}
