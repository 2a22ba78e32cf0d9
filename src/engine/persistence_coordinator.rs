// ==========================================
// 合同录入引擎 - 持久化协调器
// ==========================================
// 步骤（严格顺序，后一步依赖前一步）:
// 1. 创建合同主记录 → contract_id
// 2. 写入月度配额
// 3. 写入应付 / 罚则 / 质量规格 / 精炼费用（集合为空则跳过）
// 失败语义:
// - TRANSACTIONAL: 1-3 同一事务，失败整体回滚
// - SEQUENTIAL: 逐步提交，失败时已完成步骤保留并报告孤立合同ID
// 红线: 校验失败不产生任何写入
// ==========================================

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::config::engine_config::CommitMode;
use crate::domain::catalog::EconomicTermCatalog;
use crate::domain::contract::ContractDraft;
use crate::domain::records::{
    ContractHeader, ContractPayableRecord, ContractPenaltyRecord, ContractQualitySpecRecord,
    ContractQuotaRecord, ContractRefiningExpenseRecord, NewContractRecord,
};
use crate::domain::types::ContractStatus;
use crate::engine::commit_plan::CommitPlan;
use crate::engine::error::DraftValidationError;
use crate::repository::error::{RepositoryError, RepositoryResult};

// ==========================================
// 写入接口
// ==========================================

/// 单次保存内的写入操作
pub trait ContractWriter {
    /// 创建合同主记录（生成合同编号，状态为 draft）
    fn create_contract(&mut self, record: &NewContractRecord) -> RepositoryResult<ContractHeader>;

    fn insert_quotas(&mut self, contract_id: &str, quotas: &[ContractQuotaRecord]) -> RepositoryResult<usize>;

    fn insert_payables(
        &mut self,
        contract_id: &str,
        payables: &[ContractPayableRecord],
    ) -> RepositoryResult<usize>;

    fn insert_penalties(
        &mut self,
        contract_id: &str,
        penalties: &[ContractPenaltyRecord],
    ) -> RepositoryResult<usize>;

    fn insert_quality_specs(
        &mut self,
        contract_id: &str,
        specs: &[ContractQualitySpecRecord],
    ) -> RepositoryResult<usize>;

    fn insert_refining_expenses(
        &mut self,
        contract_id: &str,
        expenses: &[ContractRefiningExpenseRecord],
    ) -> RepositoryResult<usize>;
}

/// 合同存储
///
/// `run` 以 atomic 指定是否将整个 work 包在一个事务内；
/// work 返回错误时 atomic 模式必须回滚全部写入
pub trait ContractStore: Send + Sync {
    fn supports_transactions(&self) -> bool;

    fn run(
        &self,
        atomic: bool,
        work: &mut dyn FnMut(&mut dyn ContractWriter) -> RepositoryResult<()>,
    ) -> RepositoryResult<()>;
}

// ==========================================
// 步骤与结果
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitStep {
    /// 事务开启或提交
    Transaction,
    CreateContract,
    InsertQuotas,
    InsertPayables,
    InsertPenalties,
    InsertQualitySpecs,
    InsertRefiningExpenses,
}

impl CommitStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitStep::Transaction => "transaction",
            CommitStep::CreateContract => "create_contract",
            CommitStep::InsertQuotas => "insert_quotas",
            CommitStep::InsertPayables => "insert_payables",
            CommitStep::InsertPenalties => "insert_penalties",
            CommitStep::InsertQualitySpecs => "insert_quality_specs",
            CommitStep::InsertRefiningExpenses => "insert_refining_expenses",
        }
    }
}

impl fmt::Display for CommitStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 保存成功回执
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommitReceipt {
    pub contract_id: String,
    pub contract_number: String,
    pub status: ContractStatus,
    pub mode: CommitMode,
    pub quota_count: usize,
    pub payable_count: usize,
    pub penalty_count: usize,
    pub quality_spec_count: usize,
    pub refining_expense_count: usize,
}

/// 保存失败
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("保存前校验失败: {0}")]
    Validation(#[from] DraftValidationError),

    /// contract_id / committed_steps 仅在未回滚时非空（需人工对账）
    #[error("保存失败 (step={failed_step}, rolled_back={rolled_back}): {source}")]
    Persistence {
        failed_step: CommitStep,
        contract_id: Option<String>,
        committed_steps: Vec<CommitStep>,
        rolled_back: bool,
        source: RepositoryError,
    },
}

impl CommitError {
    /// 是否留下了部分写入的合同
    pub fn is_partial(&self) -> bool {
        matches!(self, CommitError::Persistence { contract_id: Some(_), rolled_back: false, .. })
    }
}

// 执行进度（闭包外可见，用于失败定位）
#[derive(Default)]
struct CommitProgress {
    current: Option<CommitStep>,
    completed: Vec<CommitStep>,
    header: Option<ContractHeader>,
    counts: [usize; 5],
}

impl CommitProgress {
    fn begin(&mut self, step: CommitStep) {
        self.current = Some(step);
    }

    fn finish(&mut self) {
        if let Some(step) = self.current.take() {
            self.completed.push(step);
        }
    }
}

// ==========================================
// PersistenceCoordinator
// ==========================================
pub struct PersistenceCoordinator {
    store: Arc<dyn ContractStore>,
    mode: CommitMode,
}

impl PersistenceCoordinator {
    pub fn new(store: Arc<dyn ContractStore>, mode: CommitMode) -> Self {
        Self { store, mode }
    }

    /// 实际生效的保存模式（存储不支持事务时退化为逐步提交）
    pub fn effective_mode(&self) -> CommitMode {
        match self.mode {
            CommitMode::Transactional if !self.store.supports_transactions() => CommitMode::Sequential,
            mode => mode,
        }
    }

    /// 保存草稿
    ///
    /// # 错误
    /// - `CommitError::Validation`: 保存门控未满足或条款未选公式（零写入）
    /// - `CommitError::Persistence`: 某一步写入失败，附失败步骤与已完成步骤
    pub fn commit(
        &self,
        draft: &ContractDraft,
        catalog: &EconomicTermCatalog,
    ) -> Result<CommitReceipt, CommitError> {
        tracing::debug!(
            "校验草稿: quotas={}, terms={}",
            draft.quotas.len(),
            draft.term_count()
        );
        let plan = CommitPlan::build(draft, catalog)?;
        self.commit_plan(&plan)
    }

    /// 按已冻结的保存计划写入
    pub fn commit_plan(&self, plan: &CommitPlan) -> Result<CommitReceipt, CommitError> {
        let mode = self.effective_mode();
        if mode != self.mode {
            tracing::warn!("存储不支持事务，保存模式退化为 SEQUENTIAL");
        }
        let atomic = mode == CommitMode::Transactional;

        tracing::info!(
            "开始保存合同: type={}, records={}, mode={}",
            plan.contract.contract_type,
            plan.dependent_record_count(),
            mode.as_str()
        );

        let mut progress = CommitProgress::default();
        let result = self
            .store
            .run(atomic, &mut |writer: &mut dyn ContractWriter| {
                run_steps(writer, plan, &mut progress)
            });

        match result {
            Ok(()) => match progress.header {
                Some(header) => {
                    tracing::info!(
                        "合同保存成功: contract_id={}, number={}",
                        header.contract_id,
                        header.contract_number
                    );
                    Ok(CommitReceipt {
                        contract_id: header.contract_id,
                        contract_number: header.contract_number,
                        status: header.status,
                        mode,
                        quota_count: progress.counts[0],
                        payable_count: progress.counts[1],
                        penalty_count: progress.counts[2],
                        quality_spec_count: progress.counts[3],
                        refining_expense_count: progress.counts[4],
                    })
                }
                None => Err(CommitError::Persistence {
                    failed_step: CommitStep::CreateContract,
                    contract_id: None,
                    committed_steps: progress.completed,
                    rolled_back: atomic,
                    source: RepositoryError::InternalError("写入完成但未返回合同主记录".to_string()),
                }),
            },
            Err(source) => {
                let failed_step = progress.current.unwrap_or(CommitStep::Transaction);
                let (contract_id, committed_steps) = if atomic {
                    (None, Vec::new())
                } else {
                    (progress.header.map(|h| h.contract_id), progress.completed)
                };

                if atomic {
                    tracing::error!("合同保存失败，已回滚: step={}, error={}", failed_step, source);
                } else {
                    tracing::warn!(
                        "合同部分保存: step={} 失败, contract_id={:?}, 已完成步骤={:?}",
                        failed_step,
                        contract_id,
                        committed_steps
                    );
                }

                Err(CommitError::Persistence {
                    failed_step,
                    contract_id,
                    committed_steps,
                    rolled_back: atomic,
                    source,
                })
            }
        }
    }
}

fn run_steps(
    writer: &mut dyn ContractWriter,
    plan: &CommitPlan,
    progress: &mut CommitProgress,
) -> RepositoryResult<()> {
    progress.begin(CommitStep::CreateContract);
    let header = writer.create_contract(&plan.contract)?;
    let contract_id = header.contract_id.clone();
    progress.header = Some(header);
    progress.finish();

    progress.begin(CommitStep::InsertQuotas);
    progress.counts[0] = writer.insert_quotas(&contract_id, &plan.quotas)?;
    progress.finish();

    if !plan.payables.is_empty() {
        progress.begin(CommitStep::InsertPayables);
        progress.counts[1] = writer.insert_payables(&contract_id, &plan.payables)?;
        progress.finish();
    }

    if !plan.penalties.is_empty() {
        progress.begin(CommitStep::InsertPenalties);
        progress.counts[2] = writer.insert_penalties(&contract_id, &plan.penalties)?;
        progress.finish();
    }

    if !plan.quality_specs.is_empty() {
        progress.begin(CommitStep::InsertQualitySpecs);
        progress.counts[3] = writer.insert_quality_specs(&contract_id, &plan.quality_specs)?;
        progress.finish();
    }

    if !plan.refining_expenses.is_empty() {
        progress.begin(CommitStep::InsertRefiningExpenses);
        progress.counts[4] = writer.insert_refining_expenses(&contract_id, &plan.refining_expenses)?;
        progress.finish();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{FormulaDefinition, PayableFormula};
    use crate::domain::contract::DeliveryWindow;
    use crate::domain::terms::{PayableTerm, PenaltyTerm, QualitySpecTerm, RefiningExpenseTerm};
    use crate::domain::types::ContractType;
    use crate::engine::quota_scheduler::generate_quotas;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    // ===== 内存存储 =====

    #[derive(Default, Clone)]
    struct MemoryState {
        contracts: Vec<ContractHeader>,
        quotas: Vec<String>,
        payables: Vec<String>,
        penalties: Vec<String>,
        quality_specs: Vec<String>,
        refining_expenses: Vec<String>,
    }

    impl MemoryState {
        fn total_writes(&self) -> usize {
            self.contracts.len()
                + self.quotas.len()
                + self.payables.len()
                + self.penalties.len()
                + self.quality_specs.len()
                + self.refining_expenses.len()
        }
    }

    struct MemoryStore {
        state: Mutex<MemoryState>,
        fail_at: Option<CommitStep>,
        transactional: bool,
    }

    impl MemoryStore {
        fn new(fail_at: Option<CommitStep>) -> Self {
            Self {
                state: Mutex::new(MemoryState::default()),
                fail_at,
                transactional: true,
            }
        }

        fn snapshot(&self) -> MemoryState {
            self.state.lock().unwrap().clone()
        }
    }

    struct MemoryWriter<'a> {
        state: &'a mut MemoryState,
        fail_at: Option<CommitStep>,
    }

    impl MemoryWriter<'_> {
        fn check(&self, step: CommitStep) -> RepositoryResult<()> {
            if self.fail_at == Some(step) {
                return Err(RepositoryError::ForeignKeyViolation(format!("injected at {}", step)));
            }
            Ok(())
        }
    }

    impl ContractWriter for MemoryWriter<'_> {
        fn create_contract(&mut self, _record: &NewContractRecord) -> RepositoryResult<ContractHeader> {
            self.check(CommitStep::CreateContract)?;
            let header = ContractHeader {
                contract_id: format!("C-{}", self.state.contracts.len() + 1),
                contract_number: format!("CV-2026-{:04}", self.state.contracts.len() + 1),
                status: ContractStatus::Draft,
            };
            self.state.contracts.push(header.clone());
            Ok(header)
        }

        fn insert_quotas(&mut self, contract_id: &str, quotas: &[ContractQuotaRecord]) -> RepositoryResult<usize> {
            self.check(CommitStep::InsertQuotas)?;
            self.state.quotas.extend(quotas.iter().map(|_| contract_id.to_string()));
            Ok(quotas.len())
        }

        fn insert_payables(&mut self, contract_id: &str, items: &[ContractPayableRecord]) -> RepositoryResult<usize> {
            self.check(CommitStep::InsertPayables)?;
            self.state.payables.extend(items.iter().map(|_| contract_id.to_string()));
            Ok(items.len())
        }

        fn insert_penalties(&mut self, contract_id: &str, items: &[ContractPenaltyRecord]) -> RepositoryResult<usize> {
            self.check(CommitStep::InsertPenalties)?;
            self.state.penalties.extend(items.iter().map(|_| contract_id.to_string()));
            Ok(items.len())
        }

        fn insert_quality_specs(
            &mut self,
            contract_id: &str,
            items: &[ContractQualitySpecRecord],
        ) -> RepositoryResult<usize> {
            self.check(CommitStep::InsertQualitySpecs)?;
            self.state.quality_specs.extend(items.iter().map(|_| contract_id.to_string()));
            Ok(items.len())
        }

        fn insert_refining_expenses(
            &mut self,
            contract_id: &str,
            items: &[ContractRefiningExpenseRecord],
        ) -> RepositoryResult<usize> {
            self.check(CommitStep::InsertRefiningExpenses)?;
            self.state.refining_expenses.extend(items.iter().map(|_| contract_id.to_string()));
            Ok(items.len())
        }
    }

    impl ContractStore for MemoryStore {
        fn supports_transactions(&self) -> bool {
            self.transactional
        }

        fn run(
            &self,
            atomic: bool,
            work: &mut dyn FnMut(&mut dyn ContractWriter) -> RepositoryResult<()>,
        ) -> RepositoryResult<()> {
            let mut guard = self.state.lock().unwrap();
            if atomic {
                let mut working = guard.clone();
                let mut writer = MemoryWriter {
                    state: &mut working,
                    fail_at: self.fail_at,
                };
                work(&mut writer)?;
                *guard = working;
                Ok(())
            } else {
                let mut writer = MemoryWriter {
                    state: &mut guard,
                    fail_at: self.fail_at,
                };
                work(&mut writer)
            }
        }
    }

    // ===== 测试数据 =====

    fn catalog() -> EconomicTermCatalog {
        EconomicTermCatalog {
            payable_formulas: vec![PayableFormula {
                id: "PF-DED".to_string(),
                name: "Deducción Porcentual".to_string(),
                is_deduction: true,
            }],
            penalty_formulas: vec![FormulaDefinition {
                id: "PN-STD".to_string(),
                name: "Penalidad Estándar".to_string(),
            }],
            refining_expense_formulas: vec![FormulaDefinition {
                id: "RE-FIX".to_string(),
                name: "Tarifa Fija".to_string(),
            }],
            ..Default::default()
        }
    }

    fn full_draft() -> ContractDraft {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut draft = ContractDraft {
            contract_type: Some(ContractType::Sale),
            vendor_id: Some("V-01".to_string()),
            buyer_id: Some("B-01".to_string()),
            product_id: Some("P-01".to_string()),
            country_id: Some("PE".to_string()),
            delivery_window: DeliveryWindow {
                start_month: Some(start),
                end_month: Some(end),
            },
            incoterm_id: Some("FOB".to_string()),
            delivery_location: "Callao".to_string(),
            quotas: generate_quotas(start, end),
            ..Default::default()
        };

        let catalog = catalog();
        let id = draft.allocate_term_id();
        draft.payables.push(PayableTerm::new_default(id, &catalog).unwrap());

        let mut penalty = PenaltyTerm::new_default(draft.allocate_term_id());
        penalty.formula_id = Some("PN-STD".to_string());
        draft.penalties.push(penalty);

        for _ in 0..2 {
            let id = draft.allocate_term_id();
            draft.quality_specs.push(QualitySpecTerm::new_default(id));
        }

        let mut refining = RefiningExpenseTerm::new_default(draft.allocate_term_id());
        refining.formula_id = Some("RE-FIX".to_string());
        draft.refining_expenses.push(refining);
        draft
    }

    // ===== 测试 =====

    #[test]
    fn test_commit_writes_everything_keyed_to_one_contract() {
        let store = Arc::new(MemoryStore::new(None));
        let coordinator = PersistenceCoordinator::new(store.clone(), CommitMode::Transactional);

        let receipt = coordinator.commit(&full_draft(), &catalog()).unwrap();
        assert_eq!(receipt.status, ContractStatus::Draft);
        assert_eq!(receipt.quota_count, 3);
        assert_eq!(receipt.quality_spec_count, 2);

        let state = store.snapshot();
        assert_eq!(state.contracts.len(), 1);
        assert_eq!(state.quotas.len(), 3);
        assert_eq!(state.payables.len(), 1);
        assert_eq!(state.penalties.len(), 1);
        assert_eq!(state.quality_specs.len(), 2);
        assert_eq!(state.refining_expenses.len(), 1);

        let all_children = state
            .quotas
            .iter()
            .chain(&state.payables)
            .chain(&state.penalties)
            .chain(&state.quality_specs)
            .chain(&state.refining_expenses);
        for contract_id in all_children {
            assert_eq!(contract_id, &receipt.contract_id);
        }
    }

    #[test]
    fn test_invalid_draft_writes_nothing() {
        let store = Arc::new(MemoryStore::new(None));
        let coordinator = PersistenceCoordinator::new(store.clone(), CommitMode::Sequential);

        let mut draft = full_draft();
        draft.incoterm_id = None;

        let err = coordinator.commit(&draft, &catalog()).unwrap_err();
        assert!(matches!(err, CommitError::Validation(DraftValidationError::IncotermIncomplete { .. })));
        assert_eq!(store.snapshot().total_writes(), 0);
    }

    #[test]
    fn test_empty_collections_are_skipped() {
        let store = Arc::new(MemoryStore::new(Some(CommitStep::InsertPayables)));
        let coordinator = PersistenceCoordinator::new(store.clone(), CommitMode::Transactional);

        let mut draft = full_draft();
        draft.payables.clear();

        let receipt = coordinator.commit(&draft, &catalog()).unwrap();
        assert_eq!(receipt.payable_count, 0);
    }

    #[test]
    fn test_transactional_failure_rolls_back() {
        let store = Arc::new(MemoryStore::new(Some(CommitStep::InsertQualitySpecs)));
        let coordinator = PersistenceCoordinator::new(store.clone(), CommitMode::Transactional);

        match coordinator.commit(&full_draft(), &catalog()) {
            Err(err @ CommitError::Persistence { .. }) => {
                assert!(!err.is_partial());
                if let CommitError::Persistence {
                    failed_step,
                    contract_id,
                    rolled_back,
                    ..
                } = err
                {
                    assert_eq!(failed_step, CommitStep::InsertQualitySpecs);
                    assert!(contract_id.is_none());
                    assert!(rolled_back);
                }
            }
            other => panic!("Expected Persistence error, got {:?}", other),
        }
        assert_eq!(store.snapshot().total_writes(), 0);
    }

    #[test]
    fn test_sequential_failure_reports_partial_contract() {
        let store = Arc::new(MemoryStore::new(Some(CommitStep::InsertPenalties)));
        let coordinator = PersistenceCoordinator::new(store.clone(), CommitMode::Sequential);

        let err = coordinator.commit(&full_draft(), &catalog()).unwrap_err();
        assert!(err.is_partial());
        match err {
            CommitError::Persistence {
                failed_step,
                contract_id,
                committed_steps,
                rolled_back,
                ..
            } => {
                assert_eq!(failed_step, CommitStep::InsertPenalties);
                assert_eq!(contract_id.as_deref(), Some("C-1"));
                assert_eq!(
                    committed_steps,
                    vec![
                        CommitStep::CreateContract,
                        CommitStep::InsertQuotas,
                        CommitStep::InsertPayables
                    ]
                );
                assert!(!rolled_back);
            }
            other => panic!("Expected Persistence error, got {:?}", other),
        }

        let state = store.snapshot();
        assert_eq!(state.contracts.len(), 1);
        assert_eq!(state.quotas.len(), 3);
        assert!(state.penalties.is_empty());
        assert!(state.refining_expenses.is_empty());
    }

    #[test]
    fn test_falls_back_to_sequential_without_transactions() {
        let mut store = MemoryStore::new(None);
        store.transactional = false;
        let coordinator = PersistenceCoordinator::new(Arc::new(store), CommitMode::Transactional);

        assert_eq!(coordinator.effective_mode(), CommitMode::Sequential);
        let receipt = coordinator.commit(&full_draft(), &catalog()).unwrap();
        assert_eq!(receipt.mode, CommitMode::Sequential);
    }
}
