// ==========================================
// 合同录入引擎 - 领域类型定义
// ==========================================
// 职责: 合同类型、合同状态、质量规格类型、条款类别、向导章节
// 序列化格式: 与数据库存储值一致
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 合同类型 (Contract Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractType {
    Purchase, // 采购
    Sale,     // 销售
}

impl ContractType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractType::Purchase => "purchase",
            ContractType::Sale => "sale",
        }
    }

    pub fn parse(s: &str) -> Option<ContractType> {
        match s.trim().to_lowercase().as_str() {
            "purchase" => Some(ContractType::Purchase),
            "sale" => Some(ContractType::Sale),
            _ => None,
        }
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 合同状态 (Contract Status)
// ==========================================
// 录入引擎只会写入 draft，其余状态由下游审批流程维护
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Active,
    Closed,
    Cancelled,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Active => "active",
            ContractStatus::Closed => "closed",
            ContractStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> ContractStatus {
        match s.trim().to_lowercase().as_str() {
            "active" => ContractStatus::Active,
            "closed" => ContractStatus::Closed,
            "cancelled" => ContractStatus::Cancelled,
            _ => ContractStatus::Draft,
        }
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 质量规格类型 (Spec Type)
// ==========================================
// range: 需要 min 与 max; minimum: 只看 min; maximum: 只看 max
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecType {
    Range,
    Minimum,
    Maximum,
}

impl SpecType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpecType::Range => "range",
            SpecType::Minimum => "minimum",
            SpecType::Maximum => "maximum",
        }
    }

    pub fn parse(s: &str) -> SpecType {
        match s.trim().to_lowercase().as_str() {
            "minimum" => SpecType::Minimum,
            "maximum" => SpecType::Maximum,
            _ => SpecType::Range,
        }
    }
}

impl fmt::Display for SpecType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 经济条款类别 (Term Kind)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TermKind {
    Payable,
    Penalty,
    QualitySpec,
    RefiningExpense,
}

impl fmt::Display for TermKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TermKind::Payable => write!(f, "PAYABLE"),
            TermKind::Penalty => write!(f, "PENALTY"),
            TermKind::QualitySpec => write!(f, "QUALITY_SPEC"),
            TermKind::RefiningExpense => write!(f, "REFINING_EXPENSE"),
        }
    }
}

// ==========================================
// 向导章节 (Section)
// ==========================================
// 顺序固定，与合同条款分类一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SectionId {
    BasicInfo,
    Incoterm,
    Rollback,
    Quality,
    Payables,
    Processing,
    ProcessingEscalator,
    Refining,
    RefiningEscalator,
    Penalties,
    Payments,
    QuotationPeriod,
    WeightSampling,
    AssaySampling,
    Waste,
}

impl SectionId {
    /// 全部章节（向导顺序）
    pub const ALL: [SectionId; 15] = [
        SectionId::BasicInfo,
        SectionId::Incoterm,
        SectionId::Rollback,
        SectionId::Quality,
        SectionId::Payables,
        SectionId::Processing,
        SectionId::ProcessingEscalator,
        SectionId::Refining,
        SectionId::RefiningEscalator,
        SectionId::Penalties,
        SectionId::Payments,
        SectionId::QuotationPeriod,
        SectionId::WeightSampling,
        SectionId::AssaySampling,
        SectionId::Waste,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionId::BasicInfo => "basic-info",
            SectionId::Incoterm => "incoterm",
            SectionId::Rollback => "rollback",
            SectionId::Quality => "quality",
            SectionId::Payables => "payables",
            SectionId::Processing => "processing",
            SectionId::ProcessingEscalator => "processing-escalator",
            SectionId::Refining => "refining",
            SectionId::RefiningEscalator => "refining-escalator",
            SectionId::Penalties => "penalties",
            SectionId::Payments => "payments",
            SectionId::QuotationPeriod => "quotation-period",
            SectionId::WeightSampling => "weight-sampling",
            SectionId::AssaySampling => "assay-sampling",
            SectionId::Waste => "waste",
        }
    }

    pub fn parse(s: &str) -> Option<SectionId> {
        let key = s.trim();
        SectionId::ALL.iter().copied().find(|id| id.as_str() == key)
    }

    /// 在向导顺序中的位置
    pub fn position(&self) -> usize {
        SectionId::ALL
            .iter()
            .position(|id| id == self)
            .unwrap_or_default()
    }
}

impl fmt::Display for SectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_order_and_parse() {
        assert_eq!(SectionId::ALL[0], SectionId::BasicInfo);
        assert_eq!(SectionId::ALL[14], SectionId::Waste);
        assert_eq!(SectionId::Penalties.position(), 9);

        for id in SectionId::ALL {
            assert_eq!(SectionId::parse(id.as_str()), Some(id));
        }
        assert_eq!(SectionId::parse("summary"), None);
    }

    #[test]
    fn test_contract_type_parse() {
        assert_eq!(ContractType::parse("SALE"), Some(ContractType::Sale));
        assert_eq!(ContractType::parse(" purchase "), Some(ContractType::Purchase));
        assert_eq!(ContractType::parse("swap"), None);
    }

    #[test]
    fn test_serde_uses_storage_names() {
        let json = serde_json::to_string(&SectionId::ProcessingEscalator).unwrap();
        assert_eq!(json, "\"processing-escalator\"");
        let json = serde_json::to_string(&SpecType::Minimum).unwrap();
        assert_eq!(json, "\"minimum\"");
    }
}
