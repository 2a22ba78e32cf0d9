// ==========================================
// 合同录入引擎 - 向导会话
// ==========================================
// 职责: 持有目录快照、草稿与向导位置，按事件分派到纯迁移函数
// 并发: 单会话单所有者，无共享可变状态
// 失败语义: 事件处理失败时草稿保持原样
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::config::engine_config::EngineConfig;
use crate::domain::catalog::EconomicTermCatalog;
use crate::domain::contract::ContractDraft;
use crate::domain::template::TemplateBundle;
use crate::domain::terms::{EconomicTerm, TermId};
use crate::domain::types::{ContractType, SectionId, TermKind};
use crate::engine::draft_transitions::{self as tx, QuotaEdit};
use crate::engine::error::EngineResult;
use crate::engine::section_wizard::{self, SectionStatus, SectionWizard, Transition};

/// 会话事件
#[derive(Debug, Clone, PartialEq)]
pub enum DraftEvent {
    // ===== 基本信息 =====
    SetContractType(Option<ContractType>),
    SetVendor(Option<String>),
    SetBuyer(Option<String>),
    SetProduct(Option<String>),
    SetCountry(Option<String>),
    SetStartMonth(Option<NaiveDate>),
    SetEndMonth(Option<NaiveDate>),
    EditQuota { index: usize, edit: QuotaEdit },

    // ===== 贸易术语 =====
    SetIncoterm(Option<String>),
    SetDeliveryLocation(String),

    // ===== 经济条款 =====
    AddTerm(TermKind),
    ReplaceTerm(EconomicTerm),
    RemoveTerm { kind: TermKind, id: TermId },

    // ===== 导航 =====
    Next,
    Previous,
    GoTo(SectionId),
}

/// 事件处理结果
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Updated,
    TermAdded(TermId),
    Navigated(Transition),
}

// ==========================================
// DraftSession - 向导会话
// ==========================================
pub struct DraftSession {
    catalog: Arc<EconomicTermCatalog>,
    config: EngineConfig,
    draft: ContractDraft,
    wizard: SectionWizard,
}

impl DraftSession {
    /// 新建空白会话（目录须已完整加载）
    pub fn new(catalog: Arc<EconomicTermCatalog>, config: EngineConfig) -> Self {
        Self::with_draft(catalog, config, ContractDraft::new())
    }

    /// 由模板预填
    pub fn from_template(
        catalog: Arc<EconomicTermCatalog>,
        config: EngineConfig,
        bundle: &TemplateBundle,
    ) -> Self {
        Self::with_draft(catalog, config, tx::draft_from_template(bundle))
    }

    /// 以已有草稿开启会话
    ///
    /// 外部载入的草稿可能带有高于序号计数的条款ID，此处对齐计数避免重复分配；
    /// 交货区间与配额按向导同样的规则规整
    pub fn with_draft(
        catalog: Arc<EconomicTermCatalog>,
        config: EngineConfig,
        draft: ContractDraft,
    ) -> Self {
        let mut draft = tx::normalize_loaded_draft(draft, &config.quota_defaults);
        let max_id = draft
            .payables
            .iter()
            .map(|t| t.id.0)
            .chain(draft.penalties.iter().map(|t| t.id.0))
            .chain(draft.quality_specs.iter().map(|t| t.id.0))
            .chain(draft.refining_expenses.iter().map(|t| t.id.0))
            .max()
            .unwrap_or(0);
        draft.next_term_seq = draft.next_term_seq.max(max_id);

        Self {
            catalog,
            config,
            draft,
            wizard: SectionWizard::new(),
        }
    }

    pub fn draft(&self) -> &ContractDraft {
        &self.draft
    }

    pub fn catalog(&self) -> &EconomicTermCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn current_section(&self) -> SectionId {
        self.wizard.current()
    }

    pub fn can_save(&self) -> bool {
        section_wizard::can_save(&self.draft)
    }

    pub fn section_statuses(&self) -> Vec<(SectionId, SectionStatus)> {
        section_wizard::section_statuses(&self.draft)
    }

    /// 分派事件
    ///
    /// # 错误
    /// - `EngineError`: 条款不存在、配额下标越界、目录配置错误等；草稿不变
    pub fn dispatch(&mut self, event: DraftEvent) -> EngineResult<DispatchOutcome> {
        let defaults = self.config.quota_defaults;
        let current = self.draft.clone();

        let (next, outcome) = match event {
            DraftEvent::SetContractType(v) => (tx::set_contract_type(current, v), DispatchOutcome::Updated),
            DraftEvent::SetVendor(v) => (tx::set_vendor(current, v), DispatchOutcome::Updated),
            DraftEvent::SetBuyer(v) => (tx::set_buyer(current, v), DispatchOutcome::Updated),
            DraftEvent::SetProduct(v) => (tx::set_product(current, v), DispatchOutcome::Updated),
            DraftEvent::SetCountry(v) => (tx::set_country(current, v), DispatchOutcome::Updated),
            DraftEvent::SetStartMonth(v) => {
                (tx::set_start_month(current, v, &defaults), DispatchOutcome::Updated)
            }
            DraftEvent::SetEndMonth(v) => {
                (tx::set_end_month(current, v, &defaults), DispatchOutcome::Updated)
            }
            DraftEvent::EditQuota { index, edit } => (
                tx::edit_quota(current, index, edit, self.config.enforce_dry_le_wet)?,
                DispatchOutcome::Updated,
            ),
            DraftEvent::SetIncoterm(v) => (tx::set_incoterm(current, v), DispatchOutcome::Updated),
            DraftEvent::SetDeliveryLocation(v) => {
                (tx::set_delivery_location(current, v), DispatchOutcome::Updated)
            }
            DraftEvent::AddTerm(kind) => {
                let (draft, id) = tx::add_term(current, kind, &self.catalog)?;
                (draft, DispatchOutcome::TermAdded(id))
            }
            DraftEvent::ReplaceTerm(term) => (tx::replace_term(current, term)?, DispatchOutcome::Updated),
            DraftEvent::RemoveTerm { kind, id } => {
                (tx::remove_term(current, kind, id)?, DispatchOutcome::Updated)
            }
            DraftEvent::Next => {
                let transition = self.wizard.go_to_next(&current);
                (current, DispatchOutcome::Navigated(transition))
            }
            DraftEvent::Previous => {
                let transition = self.wizard.go_to_previous();
                (current, DispatchOutcome::Navigated(transition))
            }
            DraftEvent::GoTo(section) => {
                let transition = self.wizard.go_to_section(section);
                (current, DispatchOutcome::Navigated(transition))
            }
        };

        self.draft = next;
        Ok(outcome)
    }
}
