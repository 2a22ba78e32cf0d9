// ==========================================
// 合同录入引擎 - 经济条款引擎
// ==========================================
// 职责:
// 1. 新建条款: 分配临时ID并填充各类默认值
// 2. "No Aplica" 判定: 引用公式在目录中的名称等于 "No Aplica"
// 3. 公式文本: 由结构化字段生成标准展示文本
// 红线: 渲染从不报错，条件不足返回空串（"公式尚未确定"）
// ==========================================

use crate::domain::catalog::{is_not_applicable_name, EconomicTermCatalog, NOT_APPLICABLE_FORMULA};
use crate::domain::template::{TemplatePayable, TemplatePenalty};
use crate::domain::terms::{
    EconomicTerm, PayableTerm, PenaltyTerm, QualitySpecTerm, RefiningExpenseTerm, TermId,
};
use crate::domain::types::SpecType;
use crate::engine::error::{EngineError, EngineResult};

// ===== 默认值 =====
pub const DEFAULT_PAYABLE_METAL: &str = "Cu";
pub const DEFAULT_DEDUCTION_UNIT: &str = "%";
pub const DEFAULT_PENALTY_METAL: &str = "As";
pub const DEFAULT_LIMIT_UNIT: &str = "%";
pub const DEFAULT_QUALITY_METAL: &str = "Cu";
pub const DEFAULT_QUALITY_UNIT: &str = "%";
pub const DEFAULT_REFINING_METAL: &str = "Cu";
pub const DEFAULT_REFINING_UNIT: &str = "/TMS";

/// 数值展示（最短往返表示: 90.0 → "90", 1.2 → "1.2"）
///
/// 公式文本中的数值经 f64 规整后输出，而非回显用户原始输入（"1.50" → "1.5"）
pub fn format_number(value: f64) -> String {
    value.to_string()
}

/// 规整可空文本字段（空白视为 None）
pub(crate) fn optional_text(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

// ==========================================
// PayableTerm - 应付
// ==========================================
impl PayableTerm {
    /// 新建应付条款
    ///
    /// # 错误
    /// - `EngineError::CatalogMisconfiguration`: 目录中没有 is_deduction 的应付公式
    pub fn new_default(id: TermId, catalog: &EconomicTermCatalog) -> EngineResult<Self> {
        let formula = catalog.deduction_payable_formula().ok_or_else(|| {
            EngineError::CatalogMisconfiguration {
                table: "payable_formula".to_string(),
                message: "缺少 is_deduction=1 的应付公式，无法新建应付条款".to_string(),
            }
        })?;

        Ok(Self {
            id,
            formula_id: Some(formula.id.clone()),
            metal: DEFAULT_PAYABLE_METAL.to_string(),
            deduction_value: None,
            deduction_unit: DEFAULT_DEDUCTION_UNIT.to_string(),
            balance_percentage: None,
            market_index_id: None,
        })
    }

    /// 由模板条款复制
    pub fn from_template(id: TermId, source: &TemplatePayable) -> Self {
        Self {
            id,
            formula_id: Some(source.formula_id.clone()),
            metal: source
                .metal
                .clone()
                .unwrap_or_else(|| DEFAULT_PAYABLE_METAL.to_string()),
            deduction_value: source.deduction_value,
            deduction_unit: source
                .deduction_unit
                .clone()
                .unwrap_or_else(|| DEFAULT_DEDUCTION_UNIT.to_string()),
            balance_percentage: source.balance_percentage,
            market_index_id: source.market_index_id.clone(),
        }
    }

    pub fn is_not_applicable(&self, catalog: &EconomicTermCatalog) -> bool {
        self.formula_id
            .as_deref()
            .and_then(|id| catalog.payable_formula(id))
            .map(|f| is_not_applicable_name(&f.name))
            .unwrap_or(false)
    }

    /// `<公式> - (<金属>): (Ensaye - <扣减><单位>) * <比例>% ==> Índice <指数>`
    pub fn render_formula_text(&self, catalog: &EconomicTermCatalog) -> String {
        let formula = match self.formula_id.as_deref().and_then(|id| catalog.payable_formula(id)) {
            Some(f) => f,
            None => return String::new(),
        };
        if is_not_applicable_name(&formula.name) {
            return NOT_APPLICABLE_FORMULA.to_string();
        }

        let index = self
            .market_index_id
            .as_deref()
            .and_then(|id| catalog.market_index(id));

        match (self.deduction_value, self.balance_percentage, index) {
            (Some(deduction), Some(balance), Some(index)) => format!(
                "{} - ({}): (Ensaye - {}{}) * {}% ==> Índice {}",
                formula.name,
                self.metal,
                format_number(deduction),
                self.deduction_unit,
                format_number(balance),
                index.name
            ),
            _ => String::new(),
        }
    }
}

// ==========================================
// PenaltyTerm - 罚则
// ==========================================
impl PenaltyTerm {
    pub fn new_default(id: TermId) -> Self {
        Self {
            id,
            formula_id: None,
            metal: DEFAULT_PENALTY_METAL.to_string(),
            amount_usd: None,
            lower_limit: None,
            lower_limit_unit: DEFAULT_LIMIT_UNIT.to_string(),
            upper_limit: None,
            upper_limit_unit: DEFAULT_LIMIT_UNIT.to_string(),
        }
    }

    pub fn from_template(id: TermId, source: &TemplatePenalty) -> Self {
        Self {
            id,
            formula_id: Some(source.formula_id.clone()),
            metal: source
                .metal
                .clone()
                .unwrap_or_else(|| DEFAULT_PENALTY_METAL.to_string()),
            amount_usd: source.amount_usd,
            lower_limit: source.lower_limit,
            lower_limit_unit: source
                .lower_limit_unit
                .clone()
                .unwrap_or_else(|| DEFAULT_LIMIT_UNIT.to_string()),
            upper_limit: source.upper_limit,
            upper_limit_unit: source
                .upper_limit_unit
                .clone()
                .unwrap_or_else(|| DEFAULT_LIMIT_UNIT.to_string()),
        }
    }

    pub fn is_not_applicable(&self, catalog: &EconomicTermCatalog) -> bool {
        self.formula_id
            .as_deref()
            .and_then(|id| catalog.penalty_formula(id))
            .map(|f| is_not_applicable_name(&f.name))
            .unwrap_or(false)
    }

    /// `<公式> - (<金属>): $<金额> por TMS por cada <下限><单位> por encima de <上限><单位>`
    pub fn render_formula_text(&self, catalog: &EconomicTermCatalog) -> String {
        let formula = match self.formula_id.as_deref().and_then(|id| catalog.penalty_formula(id)) {
            Some(f) => f,
            None => return String::new(),
        };
        if is_not_applicable_name(&formula.name) {
            return NOT_APPLICABLE_FORMULA.to_string();
        }

        match (self.amount_usd, self.lower_limit, self.upper_limit) {
            (Some(amount), Some(lower), Some(upper)) => format!(
                "{} - ({}): ${} por TMS por cada {}{} por encima de {}{}",
                formula.name,
                self.metal,
                format_number(amount),
                format_number(lower),
                self.lower_limit_unit,
                format_number(upper),
                self.upper_limit_unit
            ),
            _ => String::new(),
        }
    }
}

// ==========================================
// QualitySpecTerm - 质量规格
// ==========================================
impl QualitySpecTerm {
    pub fn new_default(id: TermId) -> Self {
        Self {
            id,
            metal: DEFAULT_QUALITY_METAL.to_string(),
            spec_type: SpecType::Range,
            min_value: None,
            max_value: None,
            unit: DEFAULT_QUALITY_UNIT.to_string(),
        }
    }

    /// 与 spec_type 不匹配的取值被忽略（不是输入错误）
    pub fn render_formula_text(&self) -> String {
        match self.spec_type {
            SpecType::Range => match (self.min_value, self.max_value) {
                (Some(min), Some(max)) => format!(
                    "{}: {} - {} {}",
                    self.metal,
                    format_number(min),
                    format_number(max),
                    self.unit
                ),
                _ => String::new(),
            },
            SpecType::Minimum => match self.min_value {
                Some(min) => format!("{}: >={} {}", self.metal, format_number(min), self.unit),
                None => String::new(),
            },
            SpecType::Maximum => match self.max_value {
                Some(max) => format!("{}: <{} {}", self.metal, format_number(max), self.unit),
                None => String::new(),
            },
        }
    }
}

// ==========================================
// RefiningExpenseTerm - 精炼费用
// ==========================================
impl RefiningExpenseTerm {
    pub fn new_default(id: TermId) -> Self {
        Self {
            id,
            formula_id: None,
            metal: DEFAULT_REFINING_METAL.to_string(),
            amount_usd: None,
            unit: DEFAULT_REFINING_UNIT.to_string(),
        }
    }

    pub fn is_not_applicable(&self, catalog: &EconomicTermCatalog) -> bool {
        self.formula_id
            .as_deref()
            .and_then(|id| catalog.refining_expense_formula(id))
            .map(|f| is_not_applicable_name(&f.name))
            .unwrap_or(false)
    }

    /// `(<金属>): $<金额><单位>`
    pub fn render_formula_text(&self, catalog: &EconomicTermCatalog) -> String {
        let formula = match self
            .formula_id
            .as_deref()
            .and_then(|id| catalog.refining_expense_formula(id))
        {
            Some(f) => f,
            None => return String::new(),
        };
        if is_not_applicable_name(&formula.name) {
            return NOT_APPLICABLE_FORMULA.to_string();
        }

        match self.amount_usd {
            Some(amount) => format!("({}): ${}{}", self.metal, format_number(amount), self.unit),
            None => String::new(),
        }
    }
}

// ==========================================
// EconomicTerm - 统一分派
// ==========================================
impl EconomicTerm {
    pub fn is_not_applicable(&self, catalog: &EconomicTermCatalog) -> bool {
        match self {
            EconomicTerm::Payable(t) => t.is_not_applicable(catalog),
            EconomicTerm::Penalty(t) => t.is_not_applicable(catalog),
            EconomicTerm::QualitySpec(_) => false,
            EconomicTerm::RefiningExpense(t) => t.is_not_applicable(catalog),
        }
    }

    pub fn render_formula_text(&self, catalog: &EconomicTermCatalog) -> String {
        match self {
            EconomicTerm::Payable(t) => t.render_formula_text(catalog),
            EconomicTerm::Penalty(t) => t.render_formula_text(catalog),
            EconomicTerm::QualitySpec(t) => t.render_formula_text(),
            EconomicTerm::RefiningExpense(t) => t.render_formula_text(catalog),
        }
    }
}
