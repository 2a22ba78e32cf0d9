// ==========================================
// 合同录入引擎 - 经济条款目录 (只读参考数据)
// ==========================================
// 职责: 供应商/买方/产品/国家/贸易术语/公式/市场指数
// 红线: 会话内只读，不可修改
// ==========================================

use serde::{Deserialize, Serialize};

/// 目录中代表"不适用"的公式名称
pub const NOT_APPLICABLE_FORMULA: &str = "No Aplica";

/// 通用参考数据条目（供应商、买方、产品、国家、贸易术语）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub name: String,
}

/// 应付公式（带扣减标志）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayableFormula {
    pub id: String,
    pub name: String,
    pub is_deduction: bool,
}

/// 罚则公式 / 精炼费用公式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormulaDefinition {
    pub id: String,
    pub name: String,
}

/// 市场指数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketIndex {
    pub id: String,
    pub name: String,
}

/// 经济条款目录
///
/// 每个向导会话加载一次；所有表读取完成前会话不可用
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomicTermCatalog {
    pub vendors: Vec<CatalogEntry>,
    pub buyers: Vec<CatalogEntry>,
    pub products: Vec<CatalogEntry>,
    pub countries: Vec<CatalogEntry>,
    pub incoterms: Vec<CatalogEntry>,
    pub payable_formulas: Vec<PayableFormula>,
    pub penalty_formulas: Vec<FormulaDefinition>,
    pub refining_expense_formulas: Vec<FormulaDefinition>,
    pub market_indices: Vec<MarketIndex>,
}

impl EconomicTermCatalog {
    pub fn payable_formula(&self, id: &str) -> Option<&PayableFormula> {
        self.payable_formulas.iter().find(|f| f.id == id)
    }

    pub fn penalty_formula(&self, id: &str) -> Option<&FormulaDefinition> {
        self.penalty_formulas.iter().find(|f| f.id == id)
    }

    pub fn refining_expense_formula(&self, id: &str) -> Option<&FormulaDefinition> {
        self.refining_expense_formulas.iter().find(|f| f.id == id)
    }

    pub fn market_index(&self, id: &str) -> Option<&MarketIndex> {
        self.market_indices.iter().find(|m| m.id == id)
    }

    pub fn incoterm(&self, id: &str) -> Option<&CatalogEntry> {
        self.incoterms.iter().find(|e| e.id == id)
    }

    /// 新建应付条款时使用的扣减公式
    ///
    /// 优先选择非"No Aplica"的扣减公式
    pub fn deduction_payable_formula(&self) -> Option<&PayableFormula> {
        self.payable_formulas
            .iter()
            .filter(|f| f.is_deduction)
            .find(|f| !is_not_applicable_name(&f.name))
            .or_else(|| self.payable_formulas.iter().find(|f| f.is_deduction))
    }

    /// 各表条目数（日志用）
    pub fn table_sizes(&self) -> [(&'static str, usize); 9] {
        [
            ("vendor", self.vendors.len()),
            ("buyer", self.buyers.len()),
            ("product", self.products.len()),
            ("country", self.countries.len()),
            ("incoterm", self.incoterms.len()),
            ("payable_formula", self.payable_formulas.len()),
            ("penalty_formula", self.penalty_formulas.len()),
            ("refining_expense_formula", self.refining_expense_formulas.len()),
            ("market_index", self.market_indices.len()),
        ]
    }
}

/// 公式名称是否为"不适用"哨兵
pub fn is_not_applicable_name(name: &str) -> bool {
    name == NOT_APPLICABLE_FORMULA
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formula(id: &str, name: &str, is_deduction: bool) -> PayableFormula {
        PayableFormula {
            id: id.to_string(),
            name: name.to_string(),
            is_deduction,
        }
    }

    #[test]
    fn test_deduction_formula_prefers_applicable_entry() {
        let catalog = EconomicTermCatalog {
            payable_formulas: vec![
                formula("PF-NA", NOT_APPLICABLE_FORMULA, true),
                formula("PF-FIX", "Pago Fijo", false),
                formula("PF-DED", "Deducción Porcentual", true),
            ],
            ..Default::default()
        };

        assert_eq!(catalog.deduction_payable_formula().unwrap().id, "PF-DED");
    }

    #[test]
    fn test_deduction_formula_missing() {
        let catalog = EconomicTermCatalog {
            payable_formulas: vec![formula("PF-FIX", "Pago Fijo", false)],
            ..Default::default()
        };

        assert!(catalog.deduction_payable_formula().is_none());
    }

    #[test]
    fn test_not_applicable_name_is_exact() {
        assert!(is_not_applicable_name("No Aplica"));
        assert!(!is_not_applicable_name("no aplica"));
        assert!(!is_not_applicable_name("No Aplica "));
    }
}
