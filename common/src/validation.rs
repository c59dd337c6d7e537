//! アップロード前のローカル検証
//!
//! サイズ・形式が不正なファイルはネットワーク層に到達させない

use std::path::Path;
use thiserror::Error;

/// レシート画像の最大サイズ（10MB）
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// 対応画像形式（拡張子, MIMEタイプ）
pub const SUPPORTED_IMAGE_TYPES: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("bmp", "image/bmp"),
    ("webp", "image/webp"),
];

/// 規程ドキュメントの対応形式（拡張子, MIMEタイプ）
pub const RULES_DOCUMENT_TYPES: &[(&str, &str)] = &[
    ("pdf", "application/pdf"),
    ("txt", "text/plain"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("doc", "application/msword"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{file_name}: ファイルサイズが大きすぎます（最大: 10MB）")]
    TooLarge { file_name: String, size: u64 },

    #[error("{file_name}: 対応していないファイル形式です")]
    UnsupportedType { file_name: String },

    #[error("アップロードするファイルかテキストを指定してください")]
    EmptyRules,
}

fn lookup_mime(path: &Path, table: &[(&str, &'static str)]) -> Option<&'static str> {
    let ext = path.extension()?.to_string_lossy().to_lowercase();
    table.iter().find(|(e, _)| *e == ext).map(|(_, mime)| *mime)
}

/// 拡張子から画像のMIMEタイプを判定
pub fn image_mime_type(path: &Path) -> Option<&'static str> {
    lookup_mime(path, SUPPORTED_IMAGE_TYPES)
}

/// 拡張子から規程ドキュメントのMIMEタイプを判定
pub fn rules_mime_type(path: &Path) -> Option<&'static str> {
    lookup_mime(path, RULES_DOCUMENT_TYPES)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

/// レシート画像を検証し、MIMEタイプを返す
pub fn validate_receipt_file(path: &Path, size: u64) -> Result<&'static str, ValidationError> {
    let file_name = file_name_of(path);
    if size > MAX_FILE_SIZE {
        return Err(ValidationError::TooLarge { file_name, size });
    }
    image_mime_type(path).ok_or(ValidationError::UnsupportedType { file_name })
}

/// 規程ドキュメントを検証し、MIMEタイプを返す
pub fn validate_rules_file(path: &Path) -> Result<&'static str, ValidationError> {
    rules_mime_type(path).ok_or_else(|| ValidationError::UnsupportedType {
        file_name: file_name_of(path),
    })
}
