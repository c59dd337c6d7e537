//! レシート画像の選択
//!
//! 指定パス（ファイルまたはフォルダ）から画像を集め、ローカル検証を行う。
//! 検証に失敗したファイルはネットワーク層に渡さない。

use crate::error::{AuditError, Result};
use receipt_audit_common::validation::{image_mime_type, validate_receipt_file};
use receipt_audit_common::{SourceFile, ValidationError};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 選択結果
#[derive(Debug, Default)]
pub struct Selection {
    pub accepted: Vec<SourceFile>,
    pub rejected: Vec<ValidationError>,
}

/// ファイル1件を検証
pub fn select_file(path: &Path) -> Result<std::result::Result<SourceFile, ValidationError>> {
    if !path.is_file() {
        return Err(AuditError::FileNotFound(path.display().to_string()));
    }
    let size = std::fs::metadata(path)?.len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(validate_receipt_file(path, size).map(|mime| SourceFile {
        path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
        file_name,
        size,
        mime_type: mime.to_string(),
    }))
}

/// フォルダ直下の画像ファイル（ファイル名順）
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(AuditError::FileNotFound(folder.display().to_string()));
    }

    let mut images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)  // 直下のみ（再帰しない）
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|p| p.is_file() && image_mime_type(p).is_some())
        .collect();

    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// 指定パスから画像を選択
///
/// フォルダは直下の画像のみ対象。明示指定されたファイルは形式に関わらず検証する
pub fn select(paths: &[PathBuf]) -> Result<Selection> {
    let mut selection = Selection::default();

    for path in paths {
        let files = if path.is_dir() {
            scan_folder(path)?
        } else {
            vec![path.clone()]
        };

        for file in files {
            match select_file(&file)? {
                Ok(source) => selection.accepted.push(source),
                Err(rejected) => selection.rejected.push(rejected),
            }
        }
    }

    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use tempfile::tempdir;

    #[test]
    fn test_select_file_not_found() {
        let result = select_file(Path::new("/nonexistent/receipt.jpg"));
        assert!(matches!(result, Err(AuditError::FileNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("c.jpg"), b"dummy").unwrap();
        fs::write(dir.path().join("a.PNG"), b"dummy").unwrap();
        fs::write(dir.path().join("b.webp"), b"dummy").unwrap();
        fs::write(dir.path().join("notes.txt"), b"text").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("d.jpg"), b"dummy").unwrap();

        let images = scan_folder(dir.path()).unwrap();
        let names: Vec<_> = images
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.webp", "c.jpg"]);
    }

    #[test]
    fn test_select_rejects_large_and_unsupported() {
        let dir = tempdir().unwrap();
        let ok = dir.path().join("ok.jpg");
        fs::write(&ok, b"dummy").unwrap();
        let big = dir.path().join("big.jpg");
        File::create(&big).unwrap().set_len(12 * 1024 * 1024).unwrap();
        let gif = dir.path().join("anim.gif");
        fs::write(&gif, b"GIF89a").unwrap();

        let selection = select(&[ok, big, gif]).unwrap();
        assert_eq!(selection.accepted.len(), 1);
        assert_eq!(selection.accepted[0].file_name, "ok.jpg");
        assert_eq!(selection.accepted[0].mime_type, "image/jpeg");
        assert_eq!(selection.rejected.len(), 2);
        assert!(matches!(selection.rejected[0], ValidationError::TooLarge { .. }));
        assert!(matches!(selection.rejected[1], ValidationError::UnsupportedType { .. }));
    }
}
