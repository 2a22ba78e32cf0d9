// ==========================================
// 合同录入引擎 - API 层
// ==========================================
// 职责: 提供合同录入业务接口,供前端/命令行调用
// ==========================================

pub mod contract_api;
pub mod error;

// 重导出核心类型
pub use contract_api::{ContractApi, SectionOverview};
pub use error::{step_label, ApiError, ApiResult};
