// ==========================================
// 合同录入引擎 - 引擎层错误类型
// ==========================================
// 分类:
// - EngineError: 目录配置错误 / 条款不存在 / 配额约束
// - DraftValidationError: 保存前校验失败（不产生任何写入）
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

use crate::domain::terms::TermId;
use crate::domain::types::TermKind;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 目录配置错误（需管理员修复目录数据，不属于普通校验失败）
    #[error("目录配置错误 (table={table}): {message}")]
    CatalogMisconfiguration { table: String, message: String },

    #[error("条款不存在: kind={kind}, id={id}")]
    UnknownTerm { kind: TermKind, id: TermId },

    #[error("配额不存在: index={index}, total={total}")]
    QuotaIndexOutOfRange { index: usize, total: usize },

    #[error("配额约束违反 (month={month}): 干吨 {tms} 大于湿吨 {tmh}")]
    DryExceedsWet { month: String, tms: f64, tmh: f64 },
}

/// 草稿校验失败
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DraftValidationError {
    #[error("基本信息未完成: 缺少 {}", .missing.join(", "))]
    BasicInfoIncomplete { missing: Vec<&'static str> },

    #[error("贸易术语未完成: 缺少 {}", .missing.join(", "))]
    IncotermIncomplete { missing: Vec<&'static str> },

    #[error("条款未选择公式: kind={kind}, id={id}")]
    TermWithoutFormula { kind: TermKind, id: TermId },
}

pub type EngineResult<T> = Result<T, EngineError>;
