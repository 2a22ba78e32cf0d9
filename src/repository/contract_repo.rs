// ==========================================
// 合同录入引擎 - 合同数据仓储
// ==========================================
// 写入表: contract / contract_quota / contract_payable / contract_penalty /
//         contract_quality_spec / contract_refining_expense
// 红线: Repository 不含业务逻辑，步骤顺序由 PersistenceCoordinator 决定
// ==========================================

mod core;
mod queries;
mod writer;

#[cfg(test)]
mod tests;

pub use core::ContractRepository;
pub use writer::SqlContractWriter;
