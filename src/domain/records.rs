// ==========================================
// 合同录入引擎 - 持久化记录形态
// ==========================================
// 对应表: contract / contract_quota / contract_payable / contract_penalty /
//         contract_quality_spec / contract_refining_expense
// 说明: 子表记录不含 contract_id，由写入方在插入时绑定父合同
// ==========================================

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{ContractStatus, ContractType, SpecType};

/// 合同主记录（写入前）
///
/// contract_number 与 status 由写入方生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContractRecord {
    pub contract_type: ContractType,
    pub vendor_id: String,
    pub buyer_id: String,
    pub product_id: String,
    pub country_id: String,
    pub start_month: NaiveDate,
    pub end_month: NaiveDate,
    pub incoterm_id: String,
    pub delivery_location: String,
}

/// 合同主记录写入结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractHeader {
    pub contract_id: String,
    pub contract_number: String,
    pub status: ContractStatus,
}

/// 已落库的合同
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredContract {
    pub header: ContractHeader,
    pub record: NewContractRecord,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractQuotaRecord {
    pub month: NaiveDate,
    pub tmh: f64,
    pub tms: f64,
    pub h2o_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractPayableRecord {
    pub formula_id: String,
    pub metal: Option<String>,
    pub deduction_value: Option<f64>,
    pub deduction_unit: Option<String>,
    pub balance_percentage: Option<f64>,
    pub market_index_id: Option<String>,
    pub formula_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractPenaltyRecord {
    pub formula_id: String,
    pub metal: Option<String>,
    pub amount_usd: Option<f64>,
    pub lower_limit: Option<f64>,
    pub lower_limit_unit: Option<String>,
    pub upper_limit: Option<f64>,
    pub upper_limit_unit: Option<String>,
    pub penalty_formula: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractQualitySpecRecord {
    pub metal: String,
    pub spec_type: SpecType,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub unit: String,
    pub formula_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractRefiningExpenseRecord {
    pub formula_id: String,
    pub metal: Option<String>,
    pub amount_usd: Option<f64>,
    pub unit: Option<String>,
    pub formula_text: String,
}

/// 合同及全部子记录（只读展示）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContractDetail {
    pub contract: StoredContract,
    pub quotas: Vec<ContractQuotaRecord>,
    pub payables: Vec<ContractPayableRecord>,
    pub penalties: Vec<ContractPenaltyRecord>,
    pub quality_specs: Vec<ContractQualitySpecRecord>,
    pub refining_expenses: Vec<ContractRefiningExpenseRecord>,
}
