// ==========================================
// 合同录入引擎 - 经济条款领域模型
// ==========================================
// 条款: 应付 (Payable) / 罚则 (Penalty) / 质量规格 (QualitySpec) / 精炼费用 (RefiningExpense)
// 红线: 本文件只定义数据，构造默认值与公式文本见 engine::economic_terms
// ==========================================

use crate::domain::types::{SpecType, TermKind};
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// TermId - 会话内临时标识
// ==========================================
// 仅在单个向导会话内唯一，持久化时不落库
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TermId(pub u32);

impl fmt::Display for TermId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tmp-{}", self.0)
    }
}

// ==========================================
// PayableTerm - 应付条款
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayableTerm {
    pub id: TermId,
    pub formula_id: Option<String>,
    pub metal: String,
    pub deduction_value: Option<f64>,
    pub deduction_unit: String,
    pub balance_percentage: Option<f64>,
    pub market_index_id: Option<String>,
}

// ==========================================
// PenaltyTerm - 罚则条款
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PenaltyTerm {
    pub id: TermId,
    pub formula_id: Option<String>,
    pub metal: String,
    pub amount_usd: Option<f64>,
    pub lower_limit: Option<f64>,
    pub lower_limit_unit: String,
    pub upper_limit: Option<f64>,
    pub upper_limit_unit: String,
}

// ==========================================
// QualitySpecTerm - 质量规格
// ==========================================
// 无"不适用"概念
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualitySpecTerm {
    pub id: TermId,
    pub metal: String,
    pub spec_type: SpecType,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: String,
}

// ==========================================
// RefiningExpenseTerm - 精炼费用
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefiningExpenseTerm {
    pub id: TermId,
    pub formula_id: Option<String>,
    pub metal: String,
    pub amount_usd: Option<f64>,
    pub unit: String,
}

// ==========================================
// EconomicTerm - 条款统一视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EconomicTerm {
    Payable(PayableTerm),
    Penalty(PenaltyTerm),
    QualitySpec(QualitySpecTerm),
    RefiningExpense(RefiningExpenseTerm),
}

impl EconomicTerm {
    pub fn id(&self) -> TermId {
        match self {
            EconomicTerm::Payable(t) => t.id,
            EconomicTerm::Penalty(t) => t.id,
            EconomicTerm::QualitySpec(t) => t.id,
            EconomicTerm::RefiningExpense(t) => t.id,
        }
    }

    pub fn kind(&self) -> TermKind {
        match self {
            EconomicTerm::Payable(_) => TermKind::Payable,
            EconomicTerm::Penalty(_) => TermKind::Penalty,
            EconomicTerm::QualitySpec(_) => TermKind::QualitySpec,
            EconomicTerm::RefiningExpense(_) => TermKind::RefiningExpense,
        }
    }

    /// 引用的公式ID（质量规格无公式）
    pub fn formula_id(&self) -> Option<&str> {
        match self {
            EconomicTerm::Payable(t) => t.formula_id.as_deref(),
            EconomicTerm::Penalty(t) => t.formula_id.as_deref(),
            EconomicTerm::QualitySpec(_) => None,
            EconomicTerm::RefiningExpense(t) => t.formula_id.as_deref(),
        }
    }
}

impl From<PayableTerm> for EconomicTerm {
    fn from(term: PayableTerm) -> Self {
        EconomicTerm::Payable(term)
    }
}

impl From<PenaltyTerm> for EconomicTerm {
    fn from(term: PenaltyTerm) -> Self {
        EconomicTerm::Penalty(term)
    }
}

impl From<QualitySpecTerm> for EconomicTerm {
    fn from(term: QualitySpecTerm) -> Self {
        EconomicTerm::QualitySpec(term)
    }
}

impl From<RefiningExpenseTerm> for EconomicTerm {
    fn from(term: RefiningExpenseTerm) -> Self {
        EconomicTerm::RefiningExpense(term)
    }
}
