// ==========================================
// 合同录入引擎 - API层错误类型
// ==========================================
// 职责: 汇总仓储/引擎/保存错误，提供本地化的用户提示
// 约束: 目录配置错误与普通校验失败分开报告
// ==========================================

use crate::engine::error::{DraftValidationError, EngineError};
use crate::engine::persistence_coordinator::{CommitError, CommitStep};
use crate::i18n::{t, t_with_args};
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    /// 草稿编辑被拒绝（条款不存在、配额越界或约束违反）
    #[error("草稿编辑被拒绝: {0}")]
    DraftEditRejected(EngineError),

    /// 保存前校验失败（零写入）
    #[error("数据验证失败: {0}")]
    ValidationError(DraftValidationError),

    // ==========================================
    // 目录与保存
    // ==========================================
    #[error("目录配置错误 (table={table}): {message}")]
    CatalogMisconfiguration { table: String, message: String },

    #[error("保存失败 (step={step}): {reason}")]
    SaveFailed {
        step: CommitStep,
        contract_id: Option<String>,
        committed_steps: Vec<CommitStep>,
        rolled_back: bool,
        reason: String,
    },

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseTransactionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }
            RepositoryError::FieldValueError { field, message } => {
                ApiError::InvalidInput(format!("字段{}错误: {}", field, message))
            }
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从引擎错误转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::CatalogMisconfiguration { table, message } => {
                ApiError::CatalogMisconfiguration { table, message }
            }
            other => ApiError::DraftEditRejected(other),
        }
    }
}

impl From<DraftValidationError> for ApiError {
    fn from(err: DraftValidationError) -> Self {
        ApiError::ValidationError(err)
    }
}

impl From<CommitError> for ApiError {
    fn from(err: CommitError) -> Self {
        match err {
            CommitError::Validation(e) => ApiError::ValidationError(e),
            CommitError::Persistence {
                failed_step,
                contract_id,
                committed_steps,
                rolled_back,
                source,
            } => ApiError::SaveFailed {
                step: failed_step,
                contract_id,
                committed_steps,
                rolled_back,
                reason: source.to_string(),
            },
        }
    }
}

// ==========================================
// 用户提示
// ==========================================
impl ApiError {
    /// 本地化的用户提示（随当前 locale）
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ValidationError(e) => validation_message(e),
            ApiError::DraftEditRejected(e) => engine_message(e),
            ApiError::CatalogMisconfiguration { table, .. } => {
                t_with_args("error.catalog_misconfiguration", &[("table", table.as_str())])
            }
            ApiError::SaveFailed {
                step,
                contract_id: Some(contract_id),
                rolled_back: false,
                ..
            } => t_with_args(
                "error.save_partial",
                &[("step", step_label(*step).as_str()), ("contract_id", contract_id.as_str())],
            ),
            ApiError::SaveFailed { step, .. } => {
                t_with_args("error.save_failed", &[("step", step_label(*step).as_str())])
            }
            ApiError::NotFound(what) => t_with_args("error.not_found", &[("what", what.as_str())]),
            ApiError::InvalidInput(reason) | ApiError::BusinessRuleViolation(reason) => {
                t_with_args("error.invalid_input", &[("reason", reason.as_str())])
            }
            ApiError::DatabaseError(_)
            | ApiError::DatabaseConnectionError(_)
            | ApiError::DatabaseTransactionError(_) => t("error.database"),
            ApiError::ConfigError(_) | ApiError::InternalError(_) | ApiError::Other(_) => {
                t("error.internal")
            }
        }
    }
}

/// 保存步骤的本地化名称
pub fn step_label(step: CommitStep) -> String {
    t(&format!("step.{}", step.as_str()))
}

fn validation_message(err: &DraftValidationError) -> String {
    match err {
        DraftValidationError::BasicInfoIncomplete { missing } => {
            t_with_args("error.validation.basic_info", &[("fields", missing.join(", ").as_str())])
        }
        DraftValidationError::IncotermIncomplete { missing } => {
            t_with_args("error.validation.incoterm", &[("fields", missing.join(", ").as_str())])
        }
        DraftValidationError::TermWithoutFormula { kind, id } => t_with_args(
            "error.validation.term_without_formula",
            &[("kind", kind.to_string().as_str()), ("term", id.to_string().as_str())],
        ),
    }
}

fn engine_message(err: &EngineError) -> String {
    match err {
        EngineError::CatalogMisconfiguration { table, .. } => {
            t_with_args("error.catalog_misconfiguration", &[("table", table.as_str())])
        }
        EngineError::UnknownTerm { kind, id } => t_with_args(
            "error.unknown_term",
            &[("kind", kind.to_string().as_str()), ("term", id.to_string().as_str())],
        ),
        EngineError::QuotaIndexOutOfRange { index, total } => t_with_args(
            "error.quota_index",
            &[("index", index.to_string().as_str()), ("total", total.to_string().as_str())],
        ),
        EngineError::DryExceedsWet { month, tms, tmh } => t_with_args(
            "error.dry_exceeds_wet",
            &[
                ("month", month.as_str()),
                ("tms", tms.to_string().as_str()),
                ("tmh", tmh.to_string().as_str()),
            ],
        ),
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::terms::TermId;
    use crate::domain::types::TermKind;

    #[test]
    fn test_catalog_misconfiguration_is_not_validation() {
        let err: ApiError = EngineError::CatalogMisconfiguration {
            table: "payable_formula".to_string(),
            message: "missing".to_string(),
        }
        .into();
        assert!(matches!(err, ApiError::CatalogMisconfiguration { .. }));

        let err: ApiError = EngineError::UnknownTerm {
            kind: TermKind::Penalty,
            id: TermId(4),
        }
        .into();
        assert!(matches!(err, ApiError::DraftEditRejected(_)));
    }

    #[test]
    fn test_commit_error_conversion_keeps_step() {
        let err: ApiError = CommitError::Persistence {
            failed_step: CommitStep::InsertPenalties,
            contract_id: Some("C-1".to_string()),
            committed_steps: vec![CommitStep::CreateContract, CommitStep::InsertQuotas],
            rolled_back: false,
            source: RepositoryError::ForeignKeyViolation("FOREIGN KEY constraint failed".to_string()),
        }
        .into();

        match err {
            ApiError::SaveFailed {
                step,
                contract_id,
                committed_steps,
                ..
            } => {
                assert_eq!(step, CommitStep::InsertPenalties);
                assert_eq!(contract_id.as_deref(), Some("C-1"));
                assert_eq!(committed_steps.len(), 2);
            }
            other => panic!("Expected SaveFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ApiError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(matches!(err, ApiError::DatabaseConnectionError(_)));

        let err: ApiError = RepositoryError::UniqueConstraintViolation("UNIQUE".to_string()).into();
        assert!(matches!(err, ApiError::BusinessRuleViolation(_)));
    }
}
