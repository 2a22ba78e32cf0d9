// ==========================================
// 合同录入引擎 - 章节向导状态机
// ==========================================
// 状态: 当前章节；初始为第一个章节；无终态
// 迁移:
// - 下一步: 当前章节有效且存在下一章节
// - 上一步: 无条件（不重新校验）
// - 跳转:   无条件（线性流程的显式出口）
// 校验: 只有 basic-info 与 incoterm 有实际完成条件，其余章节恒为有效
// 保存门控: 与当前位置无关，basic-info 与 incoterm 同时完成才可保存
// ==========================================

use serde::{Deserialize, Serialize};

use crate::domain::contract::{first_of_month, is_filled, ContractDraft};
use crate::domain::types::SectionId;
use crate::engine::quota_scheduler::quotas_match_window;

/// 章节展示状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SectionStatus {
    Complete,
    Incomplete,
}

/// 导航结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Transition {
    Moved { from: SectionId, to: SectionId },
    /// 当前章节未完成，拒绝前进（附未满足条件）
    Blocked { section: SectionId, reasons: Vec<&'static str> },
    /// 已在首/末章节
    AtBoundary { section: SectionId },
}

impl Transition {
    pub fn is_moved(&self) -> bool {
        matches!(self, Transition::Moved { .. })
    }
}

// ==========================================
// 章节完成条件
// ==========================================

/// basic-info 未满足的条件
pub fn missing_basic_fields(draft: &ContractDraft) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if draft.contract_type.is_none() {
        missing.push("contract_type");
    }
    if !is_filled(&draft.vendor_id) {
        missing.push("vendor_id");
    }
    if !is_filled(&draft.buyer_id) {
        missing.push("buyer_id");
    }
    if !is_filled(&draft.product_id) {
        missing.push("product_id");
    }
    if !is_filled(&draft.country_id) {
        missing.push("country_id");
    }
    if draft.delivery_window.start_month.is_none() {
        missing.push("start_month");
    }
    if draft.delivery_window.end_month.is_none() {
        missing.push("end_month");
    }

    // 区间两端须为月初且不逆序；配额须逐月覆盖该区间
    let valid_window = match draft.delivery_window.bounds() {
        Some((start, end))
            if start <= end && start == first_of_month(start) && end == first_of_month(end) =>
        {
            Some((start, end))
        }
        Some(_) => {
            missing.push("delivery_window");
            None
        }
        None => None,
    };
    let quotas_ok = match valid_window {
        Some((start, end)) => quotas_match_window(&draft.quotas, start, end),
        None => !draft.quotas.is_empty(),
    };
    if !quotas_ok {
        missing.push("quotas");
    }
    missing
}

/// incoterm 未满足的条件
pub fn missing_incoterm_fields(draft: &ContractDraft) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if !is_filled(&draft.incoterm_id) {
        missing.push("incoterm_id");
    }
    if draft.delivery_location.trim().is_empty() {
        missing.push("delivery_location");
    }
    missing
}

pub fn basic_info_complete(draft: &ContractDraft) -> bool {
    missing_basic_fields(draft).is_empty()
}

pub fn incoterm_complete(draft: &ContractDraft) -> bool {
    missing_incoterm_fields(draft).is_empty()
}

/// 章节是否允许前进
pub fn is_section_valid(section: SectionId, draft: &ContractDraft) -> bool {
    match section {
        SectionId::BasicInfo => basic_info_complete(draft),
        SectionId::Incoterm => incoterm_complete(draft),
        _ => true,
    }
}

/// 章节展示状态（无完成条件的章节始终显示为未完成，但不阻断导航）
pub fn section_status(section: SectionId, draft: &ContractDraft) -> SectionStatus {
    let complete = match section {
        SectionId::BasicInfo => basic_info_complete(draft),
        SectionId::Incoterm => incoterm_complete(draft),
        _ => false,
    };
    if complete {
        SectionStatus::Complete
    } else {
        SectionStatus::Incomplete
    }
}

pub fn section_statuses(draft: &ContractDraft) -> Vec<(SectionId, SectionStatus)> {
    SectionId::ALL
        .iter()
        .map(|&section| (section, section_status(section, draft)))
        .collect()
}

/// 保存门控
pub fn can_save(draft: &ContractDraft) -> bool {
    basic_info_complete(draft) && incoterm_complete(draft)
}

// ==========================================
// SectionWizard - 向导状态机
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionWizard {
    current: usize,
}

impl Default for SectionWizard {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionWizard {
    pub fn new() -> Self {
        Self { current: 0 }
    }

    pub fn current(&self) -> SectionId {
        SectionId::ALL[self.current]
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current + 1 == SectionId::ALL.len()
    }

    /// 前进（需当前章节有效）
    pub fn go_to_next(&mut self, draft: &ContractDraft) -> Transition {
        let from = self.current();
        if self.is_last() {
            return Transition::AtBoundary { section: from };
        }

        if !is_section_valid(from, draft) {
            let reasons = match from {
                SectionId::BasicInfo => missing_basic_fields(draft),
                SectionId::Incoterm => missing_incoterm_fields(draft),
                _ => Vec::new(),
            };
            tracing::debug!("章节 {} 未完成，拒绝前进: {:?}", from, reasons);
            return Transition::Blocked { section: from, reasons };
        }

        self.current += 1;
        Transition::Moved { from, to: self.current() }
    }

    /// 后退（无条件）
    pub fn go_to_previous(&mut self) -> Transition {
        let from = self.current();
        if self.is_first() {
            return Transition::AtBoundary { section: from };
        }
        self.current -= 1;
        Transition::Moved { from, to: self.current() }
    }

    /// 跳转到任意章节（无条件）
    pub fn go_to_section(&mut self, target: SectionId) -> Transition {
        let from = self.current();
        self.current = target.position();
        Transition::Moved { from, to: target }
    }
}
