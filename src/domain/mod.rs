// ==========================================
// 合同录入引擎 - 领域模型层
// ==========================================
// 职责: 定义草稿聚合、经济条款、参考目录、模板与持久化记录
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod catalog;
pub mod contract;
pub mod records;
pub mod template;
pub mod terms;
pub mod types;

// 重导出核心类型
pub use catalog::{
    CatalogEntry, EconomicTermCatalog, FormulaDefinition, MarketIndex, PayableFormula,
    NOT_APPLICABLE_FORMULA,
};
pub use contract::{ContractDraft, DeliveryWindow, Quota};
pub use records::{
    ContractDetail, ContractHeader, ContractPayableRecord, ContractPenaltyRecord,
    ContractQualitySpecRecord, ContractQuotaRecord, ContractRefiningExpenseRecord,
    NewContractRecord, StoredContract,
};
pub use template::{ContractTemplate, TemplateBundle, TemplatePayable, TemplatePenalty};
pub use terms::{
    EconomicTerm, PayableTerm, PenaltyTerm, QualitySpecTerm, RefiningExpenseTerm, TermId,
};
pub use types::{ContractStatus, ContractType, SectionId, SpecType, TermKind};
