// ==========================================
// 合同录入引擎 - 合同录入 API
// ==========================================
// 职责:
// 1. 加载参考目录并开启向导会话（空白 / 模板 / 已有草稿）
// 2. 保存会话草稿（委托 PersistenceCoordinator）
// 3. 回读已保存合同
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;
use serde::Serialize;

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, EngineConfig};
use crate::domain::catalog::EconomicTermCatalog;
use crate::domain::contract::ContractDraft;
use crate::domain::records::ContractDetail;
use crate::domain::template::ContractTemplate;
use crate::domain::types::SectionId;
use crate::engine::catalog_loader::{load_catalog, CatalogSource};
use crate::engine::draft_session::DraftSession;
use crate::engine::persistence_coordinator::{CommitReceipt, PersistenceCoordinator};
use crate::engine::section_wizard::SectionStatus;
use crate::i18n::{section_label, t_with_args};
use crate::repository::{CatalogRepository, ContractRepository};

/// 章节概览（展示用）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionOverview {
    pub section: SectionId,
    pub label: String,
    pub status: SectionStatus,
    pub is_current: bool,
}

// ==========================================
// ContractApi
// ==========================================
pub struct ContractApi {
    catalog_repo: Arc<CatalogRepository>,
    contract_repo: Arc<ContractRepository>,
    config_manager: Arc<ConfigManager>,
}

impl ContractApi {
    pub fn new(
        catalog_repo: Arc<CatalogRepository>,
        contract_repo: Arc<ContractRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            catalog_repo,
            contract_repo,
            config_manager,
        }
    }

    /// 打开数据库（幂等建表）并组装各仓储，共享同一连接
    pub fn open(db_path: &str) -> ApiResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("{}: {}", db_path, e)))?;
        crate::db::init_schema(&conn).map_err(|e| ApiError::DatabaseError(e.to_string()))?;
        Self::from_connection(Arc::new(Mutex::new(conn)))
    }

    /// 从已有连接组装（合同编号前缀取自配置）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ApiResult<Self> {
        let config_manager =
            ConfigManager::from_connection(conn.clone()).map_err(|e| ApiError::ConfigError(e.to_string()))?;
        let config = config_manager
            .load_engine_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))?;

        let contract_repo =
            ContractRepository::from_connection(conn.clone()).with_numbering(config.numbering);

        Ok(Self::new(
            Arc::new(CatalogRepository::from_connection(conn)),
            Arc::new(contract_repo),
            Arc::new(config_manager),
        ))
    }

    pub fn engine_config(&self) -> ApiResult<EngineConfig> {
        self.config_manager
            .load_engine_config()
            .map_err(|e| ApiError::ConfigError(e.to_string()))
    }

    pub fn config_manager(&self) -> &ConfigManager {
        &self.config_manager
    }

    // ==========================================
    // 会话
    // ==========================================

    /// 加载完整参考目录
    pub async fn load_catalog(&self) -> ApiResult<Arc<EconomicTermCatalog>> {
        let catalog = load_catalog(self.catalog_repo.as_ref()).await?;
        Ok(Arc::new(catalog))
    }

    /// 开启空白会话
    pub async fn open_session(&self) -> ApiResult<DraftSession> {
        let catalog = self.load_catalog().await?;
        Ok(DraftSession::new(catalog, self.engine_config()?))
    }

    /// 由模板开启会话
    pub async fn open_session_from_template(&self, template_id: &str) -> ApiResult<DraftSession> {
        if template_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("模板ID不能为空".to_string()));
        }

        let bundle = self
            .catalog_repo
            .template_bundle(template_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("合同模板(id={})", template_id)))?;
        let catalog = self.load_catalog().await?;

        Ok(DraftSession::from_template(catalog, self.engine_config()?, &bundle))
    }

    /// 以外部载入的草稿开启会话
    pub async fn open_session_with_draft(&self, draft: ContractDraft) -> ApiResult<DraftSession> {
        let catalog = self.load_catalog().await?;
        Ok(DraftSession::with_draft(catalog, self.engine_config()?, draft))
    }

    pub fn list_templates(&self) -> ApiResult<Vec<ContractTemplate>> {
        Ok(self.catalog_repo.list_templates()?)
    }

    /// 章节概览
    pub fn section_overview(&self, session: &DraftSession) -> Vec<SectionOverview> {
        let current = session.current_section();
        session
            .section_statuses()
            .into_iter()
            .map(|(section, status)| SectionOverview {
                section,
                label: section_label(section),
                status,
                is_current: section == current,
            })
            .collect()
    }

    // ==========================================
    // 保存与回读
    // ==========================================

    /// 保存会话草稿
    ///
    /// # 错误
    /// - `ApiError::ValidationError`: 保存门控未满足（零写入）
    /// - `ApiError::SaveFailed`: 写入失败，附失败步骤
    pub fn save(&self, session: &DraftSession) -> ApiResult<CommitReceipt> {
        let coordinator =
            PersistenceCoordinator::new(self.contract_repo.clone(), session.config().commit_mode);
        let receipt = coordinator.commit(session.draft(), session.catalog())?;

        tracing::info!(
            "{}",
            t_with_args("notification.contract_saved", &[("number", receipt.contract_number.as_str())])
        );
        Ok(receipt)
    }

    /// 读取已保存合同及全部子记录
    pub fn get_contract(&self, contract_id: &str) -> ApiResult<ContractDetail> {
        if contract_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("合同ID不能为空".to_string()));
        }

        self.contract_repo
            .find_detail(contract_id)?
            .ok_or_else(|| ApiError::NotFound(format!("合同(id={})", contract_id)))
    }
}
