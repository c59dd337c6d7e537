//! 監査規程の管理
//!
//! 変更後は必ず一覧を取り直す（クライアント側でマージしない）

use crate::api::{ApiError, AuditBackend, RulesUpload};
use crate::error::{AuditError, Result};
use receipt_audit_common::validation::validate_rules_file;
use receipt_audit_common::{AckResponse, RulesResponse, ValidationError};
use tracing::info;

pub struct RulesPanel<'a, B> {
    backend: &'a B,
    cached: Option<RulesResponse>,
}

impl<'a, B: AuditBackend> RulesPanel<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self { backend, cached: None }
    }

    /// 最後に取得した一覧
    pub fn cached(&self) -> Option<&RulesResponse> {
        self.cached.as_ref()
    }

    /// 一覧を取得してキャッシュする
    pub async fn refresh(&mut self) -> Result<&RulesResponse> {
        let rules = self.backend.list_rules().await?;
        info!(mode = ?rules.mode, count = rules.rules.len(), "規程一覧取得");
        Ok(&*self.cached.insert(rules))
    }

    pub async fn create(&mut self, upload: RulesUpload) -> Result<AckResponse> {
        if upload.is_empty() {
            return Err(ValidationError::EmptyRules.into());
        }
        if let Some(path) = &upload.file {
            if !path.exists() {
                return Err(AuditError::FileNotFound(path.display().to_string()));
            }
            validate_rules_file(path)?;
        }

        let ack = check_ack(self.backend.upload_rules(&upload).await?)?;
        self.refresh().await?;
        Ok(ack)
    }

    pub async fn update(&mut self, id: &str, content: &str) -> Result<AckResponse> {
        self.require_editable(id).await?;
        let ack = check_ack(self.backend.update_rule(id, content).await?)?;
        self.refresh().await?;
        Ok(ack)
    }

    pub async fn delete(&mut self, id: &str) -> Result<AckResponse> {
        self.require_editable(id).await?;
        let ack = check_ack(self.backend.delete_rule(id).await?)?;
        self.refresh().await?;
        Ok(ack)
    }

    async fn require_editable(&mut self, id: &str) -> Result<()> {
        if self.cached.is_none() {
            self.refresh().await?;
        }
        let editable = self
            .cached
            .as_ref()
            .and_then(|rules| rules.find(id).map(|entry| rules.is_editable(entry)))
            .unwrap_or(false);
        if editable {
            Ok(())
        } else {
            Err(AuditError::RuleNotEditable(id.to_string()))
        }
    }
}

/// status が error の応答はバックエンドエラーとして扱う
fn check_ack(ack: AckResponse) -> Result<AckResponse> {
    if ack.is_success() {
        Ok(ack)
    } else {
        Err(ApiError::backend(ack.message).into())
    }
}
