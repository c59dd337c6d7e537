//! プレビュー（サムネイル）生成
//!
//! ファイルごとに独立したタスクで生成し、完了時に1回だけレコードを更新する。
//! 完了順は不定。

use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{DynamicImage, ImageFormat};
use receipt_audit_common::RecordId;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 画像を縮小し、JPEGのData URIを返す
pub fn generate_preview(path: &Path, max_size: u32) -> Result<String, String> {
    let img = image::open(path).map_err(|e| format!("画像読み込みエラー: {}", e))?;
    let thumb = if img.width() > max_size || img.height() > max_size {
        img.thumbnail(max_size, max_size)
    } else {
        img
    };

    // JPEGはアルファなし
    let rgb = DynamicImage::ImageRgb8(thumb.to_rgb8());
    let mut buf = Vec::new();
    rgb.write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
        .map_err(|e| format!("JPEGエンコードエラー: {}", e))?;

    Ok(format!("data:image/jpeg;base64,{}", STANDARD.encode(&buf)))
}

/// プレビュー生成をバックグラウンドで開始
///
/// 生成に成功した場合のみ `deliver` を1回呼ぶ
pub fn spawn_preview<F>(id: RecordId, path: PathBuf, max_size: u32, deliver: F) -> JoinHandle<()>
where
    F: FnOnce(RecordId, String) + Send + 'static,
{
    tokio::spawn(async move {
        let target = path.clone();
        let result = tokio::task::spawn_blocking(move || generate_preview(&target, max_size)).await;
        match result {
            Ok(Ok(data_uri)) => {
                debug!(record = %id, bytes = data_uri.len(), "プレビュー生成完了");
                deliver(id, data_uri);
            }
            Ok(Err(e)) => warn!(record = %id, path = %path.display(), error = %e, "プレビュー生成失敗"),
            Err(e) => warn!(record = %id, error = %e, "プレビュータスク異常終了"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use tempfile::tempdir;

    fn write_png(path: &Path, w: u32, h: u32) {
        let img = RgbaImage::from_pixel(w, h, Rgba([200, 10, 10, 255]));
        img.save(path).unwrap();
    }

    #[test]
    fn test_generate_preview_downsizes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("receipt.png");
        write_png(&path, 800, 400);

        let uri = generate_preview(&path, 320).unwrap();
        assert!(uri.starts_with("data:image/jpeg;base64,"));

        let encoded = uri.trim_start_matches("data:image/jpeg;base64,");
        let bytes = STANDARD.decode(encoded).unwrap();
        let decoded = image::load_from_memory(&bytes).unwrap();
        assert_eq!(decoded.width(), 320);
        assert_eq!(decoded.height(), 160);
    }

    #[test]
    fn test_generate_preview_invalid_image() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image").unwrap();
        assert!(generate_preview(&path, 320).is_err());
    }

    #[tokio::test]
    async fn test_spawn_preview_delivers_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small.png");
        write_png(&path, 40, 20);

        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let handle = spawn_preview(RecordId::from("r1"), path, 320, move |id, uri| {
            let _ = tx.send((id, uri));
        });
        handle.await.unwrap();

        let (id, uri) = rx.recv().await.unwrap();
        assert_eq!(id.as_str(), "r1");
        assert!(uri.starts_with("data:image/jpeg"));
        assert!(rx.recv().await.is_none());
    }
}
