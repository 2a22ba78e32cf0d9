// ==========================================
// 合同录入引擎 - 合同草稿聚合根
// ==========================================
// 职责: 向导会话内唯一可变状态
// 生命周期: 新建(或由模板预填) → 会话内编辑 → 取消丢弃 / 保存冻结
// 红线: 不含数据访问逻辑,状态迁移见 engine::draft_transitions
// ==========================================

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::terms::{
    PayableTerm, PenaltyTerm, QualitySpecTerm, RefiningExpenseTerm, TermId,
};
use crate::domain::types::ContractType;

// ==========================================
// DeliveryWindow - 交货月份区间
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryWindow {
    pub start_month: Option<NaiveDate>, // 月初
    pub end_month: Option<NaiveDate>,   // 月初
}

impl DeliveryWindow {
    /// 两端均已设置时返回 (start, end)
    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        match (self.start_month, self.end_month) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

// ==========================================
// Quota - 月度交货配额
// ==========================================
// tms <= tmh 不由引擎强制（见 EngineConfig::enforce_dry_le_wet）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quota {
    pub month: NaiveDate,    // 月初
    pub tmh: f64,            // 湿吨
    pub tms: f64,            // 干吨
    pub h2o_percentage: f64, // 水分 %
}

// ==========================================
// ContractDraft - 合同草稿
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContractDraft {
    // ===== 基本信息 =====
    pub contract_type: Option<ContractType>,
    pub vendor_id: Option<String>,
    pub buyer_id: Option<String>,
    pub product_id: Option<String>,
    pub country_id: Option<String>,
    #[serde(default)]
    pub delivery_window: DeliveryWindow,

    // ===== 贸易术语 =====
    pub incoterm_id: Option<String>,
    #[serde(default)]
    pub delivery_location: String,

    // ===== 派生配额 =====
    #[serde(default)]
    pub quotas: Vec<Quota>,

    // ===== 经济条款 =====
    #[serde(default)]
    pub payables: Vec<PayableTerm>,
    #[serde(default)]
    pub penalties: Vec<PenaltyTerm>,
    #[serde(default)]
    pub quality_specs: Vec<QualitySpecTerm>,
    #[serde(default)]
    pub refining_expenses: Vec<RefiningExpenseTerm>,

    // 下一个临时条款序号
    #[serde(default)]
    pub next_term_seq: u32,
}

impl ContractDraft {
    /// 新建空草稿
    pub fn new() -> Self {
        Self::default()
    }

    /// 分配会话内临时条款ID
    pub fn allocate_term_id(&mut self) -> TermId {
        self.next_term_seq += 1;
        TermId(self.next_term_seq)
    }

    /// 条款总数
    pub fn term_count(&self) -> usize {
        self.payables.len()
            + self.penalties.len()
            + self.quality_specs.len()
            + self.refining_expenses.len()
    }
}

/// 规整为当月1日
pub fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// 可选字符串是否已填写（空白视为未填写）
pub fn is_filled(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}
