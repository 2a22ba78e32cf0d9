// ==========================================
// 合同录入引擎 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 矿产购销合同分章节录入与一次性保存
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "es");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 草稿、条款、目录与记录
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 配额、向导、条款、保存协调
pub mod engine;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ContractStatus, ContractType, SectionId, SpecType, TermKind};

// 领域实体
pub use domain::{ContractDraft, EconomicTerm, EconomicTermCatalog, Quota, TemplateBundle, TermId};

// 引擎
pub use engine::{
    CommitPlan, CommitReceipt, DraftEvent, DraftSession, PersistenceCoordinator, SectionWizard,
};

// API
pub use api::{ApiError, ApiResult, ContractApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "合同录入引擎";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
