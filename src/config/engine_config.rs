use serde::{Deserialize, Serialize};

use crate::domain::types::ContractType;

/// 月度配额默认值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuotaDefaults {
    pub tmh: f64,
    pub tms: f64,
    pub h2o_percentage: f64,
}

impl Default for QuotaDefaults {
    fn default() -> Self {
        Self {
            tmh: 330.0,
            tms: 300.0,
            h2o_percentage: 10.0,
        }
    }
}

/// 保存模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommitMode {
    /// 步骤1-4在同一事务内，失败整体回滚
    Transactional,
    /// 逐步自动提交，失败时已写入部分保留（需人工对账）
    Sequential,
}

impl CommitMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommitMode::Transactional => "TRANSACTIONAL",
            CommitMode::Sequential => "SEQUENTIAL",
        }
    }

    pub fn parse(s: &str) -> Option<CommitMode> {
        match s.trim().to_uppercase().as_str() {
            "TRANSACTIONAL" => Some(CommitMode::Transactional),
            "SEQUENTIAL" => Some(CommitMode::Sequential),
            _ => None,
        }
    }
}

/// 合同编号前缀
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractNumbering {
    pub purchase_prefix: String,
    pub sale_prefix: String,
}

impl ContractNumbering {
    pub fn prefix_for(&self, contract_type: ContractType) -> &str {
        match contract_type {
            ContractType::Purchase => &self.purchase_prefix,
            ContractType::Sale => &self.sale_prefix,
        }
    }
}

impl Default for ContractNumbering {
    fn default() -> Self {
        Self {
            purchase_prefix: "CC".to_string(),
            sale_prefix: "CV".to_string(),
        }
    }
}

/// 录入引擎配置（可序列化为快照）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub quota_defaults: QuotaDefaults,

    /// 手工编辑配额时是否校验 tms <= tmh
    #[serde(default)]
    pub enforce_dry_le_wet: bool,

    #[serde(default = "default_commit_mode")]
    pub commit_mode: CommitMode,

    #[serde(default)]
    pub numbering: ContractNumbering,
}

fn default_commit_mode() -> CommitMode {
    CommitMode::Transactional
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            quota_defaults: QuotaDefaults::default(),
            enforce_dry_le_wet: false,
            commit_mode: default_commit_mode(),
            numbering: ContractNumbering::default(),
        }
    }
}
