//! エラー型定義

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug)]
pub enum Error {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("レコードが見つかりません: {0}")]
    RecordNotFound(String),

    #[error("レコードは処理中です: {0}")]
    RecordBusy(String),

    #[error("明細が見つかりません: {0}")]
    ItemNotFound(u32),

    #[error("数量は1以上で指定してください: {0}")]
    InvalidCount(u32),

    #[error("明細IDの上限に達しました")]
    ItemIdExhausted,
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
