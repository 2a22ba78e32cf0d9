// ==========================================
// 合同录入引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod contract_repo;
pub mod error;

// 重导出核心仓储
pub use catalog_repo::CatalogRepository;
pub use contract_repo::{ContractRepository, SqlContractWriter};
pub use error::{RepositoryError, RepositoryResult};
