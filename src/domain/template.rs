// ==========================================
// 合同录入引擎 - 合同模板 (只读外部协作方)
// ==========================================
// 从模板复制: 合同类型、贸易术语、应付条款、罚则条款
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::types::ContractType;

/// 合同模板
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractTemplate {
    pub template_id: String,
    pub name: String,
    pub contract_type: Option<ContractType>,
    pub incoterm_id: Option<String>,
}

/// 模板应付条款
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePayable {
    pub formula_id: String,
    pub metal: Option<String>,
    pub deduction_value: Option<f64>,
    pub deduction_unit: Option<String>,
    pub balance_percentage: Option<f64>,
    pub market_index_id: Option<String>,
}

/// 模板罚则条款
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplatePenalty {
    pub formula_id: String,
    pub metal: Option<String>,
    pub amount_usd: Option<f64>,
    pub lower_limit: Option<f64>,
    pub lower_limit_unit: Option<String>,
    pub upper_limit: Option<f64>,
    pub upper_limit_unit: Option<String>,
}

/// 模板及其条款集合
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateBundle {
    pub template: ContractTemplate,
    pub payables: Vec<TemplatePayable>,
    pub penalties: Vec<TemplatePenalty>,
}
