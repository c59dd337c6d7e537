use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "receipt-audit")]
#[command(about = "レシート経費監査クライアント", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// セッションファイル（デフォルト: カレント/.receipt-audit-session.json）
    #[arg(long, global = true)]
    pub session: Option<PathBuf>,

    /// バックエンドURL（設定より優先）
    #[arg(long, global = true)]
    pub api_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// レシート画像を追加（フォルダ指定可）
    Add {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// デモシナリオを読み込む（a / b / シナリオ名）
    Demo {
        scenario: String,
    },

    /// レシート一覧を表示
    List,

    /// 現在のステップを表示（ID指定でそのレシートを表示）
    Show {
        id: Option<String>,
    },

    /// レシートを選択
    Select {
        id: String,
    },

    /// 抽出データを対話的に編集
    Edit {
        id: String,
    },

    /// レシートを削除
    Remove {
        id: String,
    },

    /// すべてのレシートとワークフロー状態を初期化
    Reset,

    /// OCR抽出（ID省略時は未処理・エラーのレシートすべて）
    Extract {
        id: Option<String>,
    },

    /// 監査チェック（ID省略時は抽出済み・エラーのレシートすべて）
    Audit {
        id: Option<String>,
    },

    /// PDFレポートを生成
    Confirm {
        /// 単票で生成するレシート（省略時は監査済みすべて）
        id: Option<String>,

        /// 監査済みレシートを1つのPDFにまとめる
        #[arg(long, conflicts_with = "id")]
        batch: bool,

        /// 保存先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 追加からOCR・監査・一括レポートまで実行
    Run {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// 保存先ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 監査規程を管理
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },

    /// バックエンドの稼働確認
    Health,

    /// 設定を表示/編集
    Config {
        /// バックエンドURLを設定
        #[arg(long)]
        set_api_url: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}

#[derive(Subcommand)]
pub enum RulesAction {
    /// 規程一覧
    List,

    /// 規程を追加（ファイルとテキストのどちらか、または両方）
    Add {
        /// 規程ドキュメント (pdf/txt/docx/doc)
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// 規程テキスト
        #[arg(short, long)]
        text: Option<String>,
    },

    /// 規程を更新
    Update {
        id: String,

        /// 新しい内容
        #[arg(short, long, required = true)]
        content: String,
    },

    /// 規程を削除
    Delete {
        id: String,
    },
}
