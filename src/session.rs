//! セッションファイル
//!
//! CLI の各コマンド間でコレクションとワークフロー状態を引き継ぐ。

use crate::error::Result;
use receipt_audit_common::Session;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const SESSION_FILE_NAME: &str = ".receipt-audit-session.json";

/// 既定のセッションファイル（カレントディレクトリ）
pub fn default_path() -> PathBuf {
    PathBuf::from(SESSION_FILE_NAME)
}

#[derive(Debug, Serialize, Deserialize)]
struct SessionFile {
    /// バージョン（互換性チェック用）
    version: u32,
    session: Session,
}

impl SessionFile {
    const CURRENT_VERSION: u32 = 1;
}

/// セッションを読み込み
///
/// ファイルがない・読めない・バージョン不一致の場合は空のセッション。
/// 処理中のまま保存されたレコードは error に戻す
pub fn load(path: &Path) -> Session {
    if !path.exists() {
        return Session::new();
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "セッションファイルを開けません");
            return Session::new();
        }
    };

    let mut session = match serde_json::from_reader::<_, SessionFile>(BufReader::new(file)) {
        Ok(file) if file.version == SessionFile::CURRENT_VERSION => file.session,
        Ok(file) => {
            warn!(found = file.version, "セッションバージョン不一致、新規作成します");
            return Session::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "セッションファイルの解析に失敗");
            return Session::new();
        }
    };

    let recovered = session.store.recover_interrupted();
    if recovered > 0 {
        info!(count = recovered, "中断されたレコードを error に戻しました");
    }
    session
}

/// セッションを保存
pub fn save(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(
        writer,
        &SessionFile {
            version: SessionFile::CURRENT_VERSION,
            session: session.clone(),
        },
    )?;
    Ok(())
}
