// ==========================================
// 合同录入引擎 - 保存计划
// ==========================================
// 职责: 校验草稿并冻结为待写入记录（主记录 + 五类子记录）
// 规则:
// - basic-info / incoterm 未完成: 拒绝，不产生任何写入
// - 应付 / 罚则 / 精炼费用条款须已选择公式
// - "No Aplica" 条款: 除公式ID与公式文本外的可空字段一律置空
// - 每条子记录附带渲染后的公式文本
// ==========================================

use serde::Serialize;

use crate::domain::catalog::EconomicTermCatalog;
use crate::domain::contract::ContractDraft;
use crate::domain::records::{
    ContractPayableRecord, ContractPenaltyRecord, ContractQualitySpecRecord, ContractQuotaRecord,
    ContractRefiningExpenseRecord, NewContractRecord,
};
use crate::domain::terms::{PayableTerm, PenaltyTerm, RefiningExpenseTerm, TermId};
use crate::domain::types::TermKind;
use crate::engine::economic_terms::optional_text;
use crate::engine::error::DraftValidationError;
use crate::engine::section_wizard::{missing_basic_fields, missing_incoterm_fields};

/// 冻结后的待写入记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitPlan {
    pub contract: NewContractRecord,
    pub quotas: Vec<ContractQuotaRecord>,
    pub payables: Vec<ContractPayableRecord>,
    pub penalties: Vec<ContractPenaltyRecord>,
    pub quality_specs: Vec<ContractQualitySpecRecord>,
    pub refining_expenses: Vec<ContractRefiningExpenseRecord>,
}

impl CommitPlan {
    /// 由草稿构建保存计划
    ///
    /// # 错误
    /// - `BasicInfoIncomplete` / `IncotermIncomplete`: 保存门控未满足
    /// - `TermWithoutFormula`: 条款未选择公式
    pub fn build(
        draft: &ContractDraft,
        catalog: &EconomicTermCatalog,
    ) -> Result<CommitPlan, DraftValidationError> {
        let contract = contract_record(draft)?;

        let quotas = draft
            .quotas
            .iter()
            .map(|q| ContractQuotaRecord {
                month: q.month,
                tmh: q.tmh,
                tms: q.tms,
                h2o_percentage: q.h2o_percentage,
            })
            .collect();

        let payables = draft
            .payables
            .iter()
            .map(|t| payable_record(t, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let penalties = draft
            .penalties
            .iter()
            .map(|t| penalty_record(t, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        let quality_specs = draft
            .quality_specs
            .iter()
            .map(|t| ContractQualitySpecRecord {
                metal: t.metal.clone(),
                spec_type: t.spec_type,
                min_value: t.min_value,
                max_value: t.max_value,
                unit: t.unit.clone(),
                formula_text: t.render_formula_text(),
            })
            .collect();

        let refining_expenses = draft
            .refining_expenses
            .iter()
            .map(|t| refining_expense_record(t, catalog))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CommitPlan {
            contract,
            quotas,
            payables,
            penalties,
            quality_specs,
            refining_expenses,
        })
    }

    /// 子记录总数
    pub fn dependent_record_count(&self) -> usize {
        self.quotas.len()
            + self.payables.len()
            + self.penalties.len()
            + self.quality_specs.len()
            + self.refining_expenses.len()
    }
}

fn filled(value: &Option<String>) -> Option<String> {
    value.as_deref().and_then(optional_text)
}

fn contract_record(draft: &ContractDraft) -> Result<NewContractRecord, DraftValidationError> {
    let basic = (
        draft.contract_type,
        filled(&draft.vendor_id),
        filled(&draft.buyer_id),
        filled(&draft.product_id),
        filled(&draft.country_id),
        draft.delivery_window.bounds(),
    );
    let (contract_type, vendor_id, buyer_id, product_id, country_id, (start_month, end_month)) =
        match basic {
            (Some(ct), Some(v), Some(b), Some(p), Some(c), Some(bounds))
                if missing_basic_fields(draft).is_empty() =>
            {
                (ct, v, b, p, c, bounds)
            }
            _ => {
                return Err(DraftValidationError::BasicInfoIncomplete {
                    missing: missing_basic_fields(draft),
                })
            }
        };

    let (incoterm_id, delivery_location) =
        match (filled(&draft.incoterm_id), optional_text(&draft.delivery_location)) {
            (Some(incoterm), Some(location)) => (incoterm, location),
            _ => {
                return Err(DraftValidationError::IncotermIncomplete {
                    missing: missing_incoterm_fields(draft),
                })
            }
        };

    Ok(NewContractRecord {
        contract_type,
        vendor_id,
        buyer_id,
        product_id,
        country_id,
        start_month,
        end_month,
        incoterm_id,
        delivery_location,
    })
}

fn require_formula(
    formula_id: &Option<String>,
    kind: TermKind,
    id: TermId,
) -> Result<String, DraftValidationError> {
    filled(formula_id).ok_or(DraftValidationError::TermWithoutFormula { kind, id })
}

fn payable_record(
    term: &PayableTerm,
    catalog: &EconomicTermCatalog,
) -> Result<ContractPayableRecord, DraftValidationError> {
    let formula_id = require_formula(&term.formula_id, TermKind::Payable, term.id)?;
    let formula_text = term.render_formula_text(catalog);

    if term.is_not_applicable(catalog) {
        return Ok(ContractPayableRecord {
            formula_id,
            metal: None,
            deduction_value: None,
            deduction_unit: None,
            balance_percentage: None,
            market_index_id: None,
            formula_text,
        });
    }

    Ok(ContractPayableRecord {
        formula_id,
        metal: optional_text(&term.metal),
        deduction_value: term.deduction_value,
        deduction_unit: optional_text(&term.deduction_unit),
        balance_percentage: term.balance_percentage,
        market_index_id: filled(&term.market_index_id),
        formula_text,
    })
}

fn penalty_record(
    term: &PenaltyTerm,
    catalog: &EconomicTermCatalog,
) -> Result<ContractPenaltyRecord, DraftValidationError> {
    let formula_id = require_formula(&term.formula_id, TermKind::Penalty, term.id)?;
    let penalty_formula = term.render_formula_text(catalog);

    if term.is_not_applicable(catalog) {
        return Ok(ContractPenaltyRecord {
            formula_id,
            metal: None,
            amount_usd: None,
            lower_limit: None,
            lower_limit_unit: None,
            upper_limit: None,
            upper_limit_unit: None,
            penalty_formula,
        });
    }

    Ok(ContractPenaltyRecord {
        formula_id,
        metal: optional_text(&term.metal),
        amount_usd: term.amount_usd,
        lower_limit: term.lower_limit,
        lower_limit_unit: optional_text(&term.lower_limit_unit),
        upper_limit: term.upper_limit,
        upper_limit_unit: optional_text(&term.upper_limit_unit),
        penalty_formula,
    })
}

fn refining_expense_record(
    term: &RefiningExpenseTerm,
    catalog: &EconomicTermCatalog,
) -> Result<ContractRefiningExpenseRecord, DraftValidationError> {
    let formula_id = require_formula(&term.formula_id, TermKind::RefiningExpense, term.id)?;
    let formula_text = term.render_formula_text(catalog);

    if term.is_not_applicable(catalog) {
        return Ok(ContractRefiningExpenseRecord {
            formula_id,
            metal: None,
            amount_usd: None,
            unit: None,
            formula_text,
        });
    }

    Ok(ContractRefiningExpenseRecord {
        formula_id,
        metal: optional_text(&term.metal),
        amount_usd: term.amount_usd,
        unit: optional_text(&term.unit),
        formula_text,
    })
}
