//! Receipt Audit Common Library
//!
//! CLIとクライアントライブラリで共有される型と状態管理

pub mod types;
pub mod record;
pub mod store;
pub mod state;
pub mod editor;
pub mod validation;
pub mod scenario;
pub mod error;

pub use types::{
    AckResponse, ApiErrorBody, AuditDecision, AuditResult, BatchConfirmRequest, ConfirmPayload,
    ConfirmResponse, HealthResponse, ReceiptData, ReceiptItem, RiskLevel, RuleUpdateRequest,
    RulesEntry, RulesMode, RulesResponse, Violation,
};
pub use record::{ReceiptRecord, ReceiptStatus, RecordId, RecordPatch, ReportInfo, SourceFile};
pub use store::ReceiptStore;
pub use state::{Session, WorkflowState, WorkflowStep};
pub use editor::{ItemEdit, ReceiptEdit};
pub use validation::ValidationError;
pub use scenario::{find_scenario, DemoScenario, SCENARIOS};
pub use error::{Error, Result};
