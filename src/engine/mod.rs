// ==========================================
// 合同录入引擎 - 引擎层
// ==========================================
// 职责: 配额生成、章节向导、经济条款、保存协调
// 红线: Engine 不拼 SQL，数据访问经 CatalogSource / ContractStore 接口
// ==========================================

pub mod catalog_loader;
pub mod commit_plan;
pub mod draft_session;
pub mod draft_transitions;
pub mod economic_terms;
pub mod error;
pub mod persistence_coordinator;
pub mod quota_scheduler;
pub mod section_wizard;

// 重导出核心引擎
pub use catalog_loader::{load_catalog, CatalogSource};
pub use commit_plan::CommitPlan;
pub use draft_session::{DispatchOutcome, DraftEvent, DraftSession};
pub use draft_transitions::QuotaEdit;
pub use error::{DraftValidationError, EngineError, EngineResult};
pub use persistence_coordinator::{
    CommitError, CommitReceipt, CommitStep, ContractStore, ContractWriter, PersistenceCoordinator,
};
pub use quota_scheduler::{generate_quotas, generate_quotas_with, quotas_match_window};
pub use section_wizard::{SectionStatus, SectionWizard, Transition};
