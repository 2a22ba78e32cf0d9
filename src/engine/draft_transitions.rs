// ==========================================
// 合同录入引擎 - 草稿状态迁移函数
// ==========================================
// 形式: 接收草稿、返回新草稿；不做隐式重算
// 配额: 交货区间任一端变化且两端齐全时整表重建（替换，不合并手工修改）
// ==========================================

use chrono::NaiveDate;

use crate::config::engine_config::QuotaDefaults;
use crate::domain::catalog::EconomicTermCatalog;
use crate::domain::contract::{first_of_month, ContractDraft};
use crate::domain::template::TemplateBundle;
use crate::domain::terms::{
    EconomicTerm, PayableTerm, PenaltyTerm, QualitySpecTerm, RefiningExpenseTerm, TermId,
};
use crate::domain::types::{ContractType, TermKind};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::quota_scheduler::{generate_quotas_with, quotas_match_window};

/// 单月配额手工修改
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuotaEdit {
    pub tmh: f64,
    pub tms: f64,
    pub h2o_percentage: f64,
}

// ==========================================
// 基本信息
// ==========================================

pub fn set_contract_type(mut draft: ContractDraft, value: Option<ContractType>) -> ContractDraft {
    draft.contract_type = value;
    draft
}

pub fn set_vendor(mut draft: ContractDraft, value: Option<String>) -> ContractDraft {
    draft.vendor_id = value;
    draft
}

pub fn set_buyer(mut draft: ContractDraft, value: Option<String>) -> ContractDraft {
    draft.buyer_id = value;
    draft
}

pub fn set_product(mut draft: ContractDraft, value: Option<String>) -> ContractDraft {
    draft.product_id = value;
    draft
}

pub fn set_country(mut draft: ContractDraft, value: Option<String>) -> ContractDraft {
    draft.country_id = value;
    draft
}

/// 设置起始月份（变化时按需重建配额）
pub fn set_start_month(
    mut draft: ContractDraft,
    value: Option<NaiveDate>,
    defaults: &QuotaDefaults,
) -> ContractDraft {
    let value = value.map(first_of_month);
    if draft.delivery_window.start_month == value {
        return draft;
    }
    draft.delivery_window.start_month = value;
    regenerate_quotas(draft, defaults)
}

/// 设置结束月份（变化时按需重建配额）
pub fn set_end_month(
    mut draft: ContractDraft,
    value: Option<NaiveDate>,
    defaults: &QuotaDefaults,
) -> ContractDraft {
    let value = value.map(first_of_month);
    if draft.delivery_window.end_month == value {
        return draft;
    }
    draft.delivery_window.end_month = value;
    regenerate_quotas(draft, defaults)
}

fn regenerate_quotas(mut draft: ContractDraft, defaults: &QuotaDefaults) -> ContractDraft {
    let (start, end) = match draft.delivery_window.bounds() {
        Some(bounds) => bounds,
        None => return draft,
    };

    let edited = draft
        .quotas
        .iter()
        .filter(|q| {
            q.tmh != defaults.tmh || q.tms != defaults.tms || q.h2o_percentage != defaults.h2o_percentage
        })
        .count();
    if edited > 0 {
        tracing::warn!("交货区间变更，重建配额将丢弃 {} 条手工修改", edited);
    }

    draft.quotas = generate_quotas_with(start, end, defaults);
    if draft.quotas.is_empty() {
        tracing::debug!("交货区间逆序 ({} > {})，配额为空", start, end);
    }
    draft
}

/// 规整外部载入的草稿
///
/// 区间两端取月初；配额与区间不一致时按区间重建，区间不完整时清空配额。
/// 与区间一致的配额原样保留（含手工修改）
pub fn normalize_loaded_draft(mut draft: ContractDraft, defaults: &QuotaDefaults) -> ContractDraft {
    let window = &mut draft.delivery_window;
    window.start_month = window.start_month.map(first_of_month);
    window.end_month = window.end_month.map(first_of_month);

    match draft.delivery_window.bounds() {
        Some((start, end)) => {
            if quotas_match_window(&draft.quotas, start, end) {
                return draft;
            }
            tracing::warn!(
                "载入草稿的配额({}条)与交货区间 {} ~ {} 不一致，按区间重建",
                draft.quotas.len(),
                start,
                end
            );
            regenerate_quotas(draft, defaults)
        }
        None => {
            if !draft.quotas.is_empty() {
                tracing::warn!("载入草稿的交货区间不完整，丢弃 {} 条配额", draft.quotas.len());
                draft.quotas.clear();
            }
            draft
        }
    }
}

/// 手工修改单月配额
///
/// # 错误
/// - `QuotaIndexOutOfRange`: 下标越界
/// - `DryExceedsWet`: 启用 tms <= tmh 校验且违反
pub fn edit_quota(
    mut draft: ContractDraft,
    index: usize,
    edit: QuotaEdit,
    enforce_dry_le_wet: bool,
) -> EngineResult<ContractDraft> {
    let total = draft.quotas.len();
    let quota = draft
        .quotas
        .get_mut(index)
        .ok_or(EngineError::QuotaIndexOutOfRange { index, total })?;

    if enforce_dry_le_wet && edit.tms > edit.tmh {
        return Err(EngineError::DryExceedsWet {
            month: quota.month.format("%Y-%m").to_string(),
            tms: edit.tms,
            tmh: edit.tmh,
        });
    }

    quota.tmh = edit.tmh;
    quota.tms = edit.tms;
    quota.h2o_percentage = edit.h2o_percentage;
    Ok(draft)
}

// ==========================================
// 贸易术语
// ==========================================

pub fn set_incoterm(mut draft: ContractDraft, value: Option<String>) -> ContractDraft {
    draft.incoterm_id = value;
    draft
}

pub fn set_delivery_location(mut draft: ContractDraft, value: String) -> ContractDraft {
    draft.delivery_location = value;
    draft
}

// ==========================================
// 经济条款
// ==========================================

/// 新增条款（按类别填充默认值）
///
/// # 错误
/// - `CatalogMisconfiguration`: 新增应付条款时目录缺少扣减公式（草稿不变）
pub fn add_term(
    mut draft: ContractDraft,
    kind: TermKind,
    catalog: &EconomicTermCatalog,
) -> EngineResult<(ContractDraft, TermId)> {
    // 先校验再分配ID，失败时不消耗序号
    if kind == TermKind::Payable && catalog.deduction_payable_formula().is_none() {
        return Err(EngineError::CatalogMisconfiguration {
            table: "payable_formula".to_string(),
            message: "缺少 is_deduction=1 的应付公式，无法新建应付条款".to_string(),
        });
    }

    let id = draft.allocate_term_id();
    match kind {
        TermKind::Payable => draft.payables.push(PayableTerm::new_default(id, catalog)?),
        TermKind::Penalty => draft.penalties.push(PenaltyTerm::new_default(id)),
        TermKind::QualitySpec => draft.quality_specs.push(QualitySpecTerm::new_default(id)),
        TermKind::RefiningExpense => {
            draft.refining_expenses.push(RefiningExpenseTerm::new_default(id))
        }
    }
    Ok((draft, id))
}

/// 以同ID条款整体替换
pub fn replace_term(mut draft: ContractDraft, term: EconomicTerm) -> EngineResult<ContractDraft> {
    let kind = term.kind();
    let id = term.id();
    let slot_found = match term {
        EconomicTerm::Payable(t) => replace_in(&mut draft.payables, t, |x| x.id),
        EconomicTerm::Penalty(t) => replace_in(&mut draft.penalties, t, |x| x.id),
        EconomicTerm::QualitySpec(t) => replace_in(&mut draft.quality_specs, t, |x| x.id),
        EconomicTerm::RefiningExpense(t) => replace_in(&mut draft.refining_expenses, t, |x| x.id),
    };

    if slot_found {
        Ok(draft)
    } else {
        Err(EngineError::UnknownTerm { kind, id })
    }
}

fn replace_in<T>(items: &mut [T], term: T, id_of: impl Fn(&T) -> TermId) -> bool {
    let id = id_of(&term);
    match items.iter_mut().find(|x| id_of(x) == id) {
        Some(slot) => {
            *slot = term;
            true
        }
        None => false,
    }
}

/// 删除条款
pub fn remove_term(mut draft: ContractDraft, kind: TermKind, id: TermId) -> EngineResult<ContractDraft> {
    let removed = match kind {
        TermKind::Payable => remove_from(&mut draft.payables, id, |x| x.id),
        TermKind::Penalty => remove_from(&mut draft.penalties, id, |x| x.id),
        TermKind::QualitySpec => remove_from(&mut draft.quality_specs, id, |x| x.id),
        TermKind::RefiningExpense => remove_from(&mut draft.refining_expenses, id, |x| x.id),
    };

    if removed {
        Ok(draft)
    } else {
        Err(EngineError::UnknownTerm { kind, id })
    }
}

fn remove_from<T>(items: &mut Vec<T>, id: TermId, id_of: impl Fn(&T) -> TermId) -> bool {
    let before = items.len();
    items.retain(|x| id_of(x) != id);
    items.len() != before
}

// ==========================================
// 模板预填
// ==========================================

/// 由模板创建草稿（复制合同类型、贸易术语、应付条款、罚则条款）
pub fn draft_from_template(bundle: &TemplateBundle) -> ContractDraft {
    let mut draft = ContractDraft::new();
    draft.contract_type = bundle.template.contract_type;
    draft.incoterm_id = bundle.template.incoterm_id.clone();

    for source in &bundle.payables {
        let id = draft.allocate_term_id();
        draft.payables.push(PayableTerm::from_template(id, source));
    }
    for source in &bundle.penalties {
        let id = draft.allocate_term_id();
        draft.penalties.push(PenaltyTerm::from_template(id, source));
    }

    tracing::debug!(
        "模板 {} 预填: payables={}, penalties={}",
        bundle.template.template_id,
        draft.payables.len(),
        draft.penalties.len()
    );
    draft
}
