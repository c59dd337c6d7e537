//! PDFレポートのダウンロード
//!
//! confirm / batch-confirm のBase64 PDFをデコードし、ファイルとして保存する

use crate::api::ApiError;
use crate::error::{AuditError, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use receipt_audit_common::{ConfirmResponse, ReportInfo};
use regex::Regex;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const BATCH_REPORT_NAME: &str = "batch_audit_report.pdf";

/// デコード済みレポート
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportArtifact {
    pub filename: String,
    pub pdf_url: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    pub fn info(&self) -> ReportInfo {
        ReportInfo {
            filename: self.filename.clone(),
            pdf_url: self.pdf_url.clone(),
        }
    }

    /// 出力ディレクトリに保存し、保存先パスを返す
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(&self.filename);
        std::fs::write(&path, &self.bytes)?;
        info!(path = %path.display(), bytes = self.bytes.len(), "レポート保存");
        Ok(path)
    }
}

/// 複数レポートの保存結果
#[derive(Debug, Default)]
pub struct SaveOutcome {
    pub saved: Vec<PathBuf>,
    /// 保存できなかったファイル名とエラー
    pub failed: Vec<(String, AuditError)>,
}

/// すべてのレポートを保存する
///
/// 1件失敗しても残りの保存を続ける
pub fn save_all(artifacts: &[ReportArtifact], output_dir: &Path) -> SaveOutcome {
    let mut outcome = SaveOutcome::default();
    for artifact in artifacts {
        match artifact.save(output_dir) {
            Ok(path) => outcome.saved.push(path),
            Err(e) => {
                warn!(file = %artifact.filename, error = %e, "レポート保存失敗");
                outcome.failed.push((artifact.filename.clone(), e));
            }
        }
    }
    outcome
}

/// 単票レポートの既定ファイル名
pub fn single_report_name(receipt_id: &str) -> String {
    format!("audit_report_{}.pdf", receipt_id)
}

/// ファイル名に使えない文字を置換
pub fn sanitize_filename(name: &str) -> String {
    lazy_static::lazy_static! {
        static ref UNSAFE_RE: Regex = Regex::new(r#"[\\/:*?"<>|\x00-\x1f]"#).unwrap();
    }

    let cleaned = UNSAFE_RE.replace_all(name.trim(), "_");
    let cleaned = cleaned.trim_matches('.');
    if cleaned.is_empty() {
        return "audit_report.pdf".to_string();
    }
    if cleaned.to_lowercase().ends_with(".pdf") {
        cleaned.to_string()
    } else {
        format!("{}.pdf", cleaned)
    }
}

/// Base64 をデコード
pub fn decode_pdf(data: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(data.trim())
        .map_err(|e| AuditError::ReportDecode(e.to_string()))
}

/// confirm レスポンスからレポートを取り出す
///
/// status が success 以外、または PDF データがない場合はバックエンドエラー
pub fn decode_report(response: &ConfirmResponse, fallback_name: &str) -> Result<ReportArtifact> {
    let data = match (&response.pdf_data, response.is_success()) {
        (Some(data), true) => data,
        _ => {
            let message = response
                .message
                .clone()
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| "PDFレポートの生成に失敗しました".to_string());
            return Err(ApiError::backend(message).into());
        }
    };

    let name = response
        .filename
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .unwrap_or(fallback_name);

    Ok(ReportArtifact {
        filename: sanitize_filename(name),
        pdf_url: response.pdf_url.clone(),
        bytes: decode_pdf(data)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn response(pdf: &[u8], filename: Option<&str>) -> ConfirmResponse {
        ConfirmResponse {
            status: "success".into(),
            pdf_url: "data/reports/DEMO-002.pdf".into(),
            pdf_data: Some(STANDARD.encode(pdf)),
            filename: filename.map(str::to_string),
            message: None,
        }
    }

    #[test]
    fn test_base64_round_trip() {
        let original: Vec<u8> = b"%PDF-1.4\n".iter().copied().chain(0u8..=255).collect();
        let artifact = decode_report(&response(&original, None), "x.pdf").unwrap();
        assert_eq!(artifact.bytes, original);
    }

    #[test]
    fn test_filename_from_response_or_fallback() {
        let artifact = decode_report(&response(b"%PDF", Some("report.pdf")), "fallback.pdf").unwrap();
        assert_eq!(artifact.filename, "report.pdf");

        let artifact = decode_report(&response(b"%PDF", None), &single_report_name("DEMO-002")).unwrap();
        assert_eq!(artifact.filename, "audit_report_DEMO-002.pdf");

        let artifact = decode_report(&response(b"%PDF", Some("  ")), BATCH_REPORT_NAME).unwrap();
        assert_eq!(artifact.filename, "batch_audit_report.pdf");
    }

    #[test]
    fn test_error_status_is_backend_error() {
        let resp = ConfirmResponse {
            status: "error".into(),
            message: Some("No receipts provided for batch confirmation.".into()),
            ..Default::default()
        };
        let err = decode_report(&resp, BATCH_REPORT_NAME).unwrap_err();
        assert_eq!(err.to_string(), "No receipts provided for batch confirmation.");

        let resp = ConfirmResponse {
            status: "success".into(),
            ..Default::default()
        };
        assert!(matches!(
            decode_report(&resp, BATCH_REPORT_NAME),
            Err(AuditError::Api(ApiError::Backend { .. }))
        ));
    }

    #[test]
    fn test_invalid_base64() {
        let resp = ConfirmResponse {
            status: "success".into(),
            pdf_data: Some("***".into()),
            ..Default::default()
        };
        assert!(matches!(
            decode_report(&resp, BATCH_REPORT_NAME),
            Err(AuditError::ReportDecode(_))
        ));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd.pdf");
        assert_eq!(sanitize_filename("a:b?.pdf"), "a_b_.pdf");
        assert_eq!(sanitize_filename("report"), "report.pdf");
        assert_eq!(sanitize_filename("..."), "audit_report.pdf");
    }

    #[test]
    fn test_save_writes_bytes() {
        let dir = tempdir().unwrap();
        let artifact = decode_report(&response(b"%PDF-1.7", None), "out.pdf").unwrap();
        let path = artifact.save(&dir.path().join("reports")).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.7");
    }

    #[test]
    fn test_save_all_continues_after_failure() {
        let dir = tempdir().unwrap();
        // 同名のディレクトリがあると書き込めない
        std::fs::create_dir(dir.path().join("b.pdf")).unwrap();

        let artifacts: Vec<_> = ["a.pdf", "b.pdf", "c.pdf"]
            .iter()
            .map(|name| decode_report(&response(b"%PDF", Some(*name)), "x.pdf").unwrap())
            .collect();
        let outcome = save_all(&artifacts, dir.path());

        assert_eq!(outcome.saved, vec![dir.path().join("a.pdf"), dir.path().join("c.pdf")]);
        assert_eq!(outcome.failed.len(), 1);
        assert_eq!(outcome.failed[0].0, "b.pdf");
        assert!(matches!(outcome.failed[0].1, AuditError::Io(_)));
        assert_eq!(std::fs::read(dir.path().join("c.pdf")).unwrap(), b"%PDF");
    }
}
