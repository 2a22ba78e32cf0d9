use super::writer::SqlContractWriter;
use crate::config::engine_config::ContractNumbering;
use crate::engine::persistence_coordinator::{ContractStore, ContractWriter};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

// ==========================================
// ContractRepository - 合同仓储
// ==========================================
pub struct ContractRepository {
    conn: Arc<Mutex<Connection>>,
    numbering: ContractNumbering,
}

impl ContractRepository {
    /// 打开数据库文件创建仓储
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            conn,
            numbering: ContractNumbering::default(),
        }
    }

    /// 指定合同编号前缀
    pub fn with_numbering(mut self, numbering: ContractNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    pub fn numbering(&self) -> &ContractNumbering {
        &self.numbering
    }

    /// 获取数据库连接
    pub(super) fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl ContractStore for ContractRepository {
    fn supports_transactions(&self) -> bool {
        true
    }

    fn run(
        &self,
        atomic: bool,
        work: &mut dyn FnMut(&mut dyn ContractWriter) -> RepositoryResult<()>,
    ) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        if !atomic {
            let mut writer = SqlContractWriter::new(&conn, &self.numbering);
            return work(&mut writer);
        }

        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        {
            let mut writer = SqlContractWriter::new(&tx, &self.numbering);
            // 出错时 tx 随作用域结束自动回滚
            work(&mut writer)?;
        }
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }
}
