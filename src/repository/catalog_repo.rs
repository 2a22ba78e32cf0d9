// ==========================================
// 合同录入引擎 - 参考目录仓储
// ==========================================
// 职责: 只读访问参考表与合同模板
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::catalog::{CatalogEntry, FormulaDefinition, MarketIndex, PayableFormula};
use crate::domain::template::{ContractTemplate, TemplateBundle, TemplatePayable, TemplatePenalty};
use crate::domain::types::ContractType;
use crate::engine::catalog_loader::CatalogSource;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

/// 可按 id/name 读取的简单参考表
const ENTRY_TABLES: [&str; 5] = ["vendor", "buyer", "product", "country", "incoterm"];

// ==========================================
// CatalogRepository
// ==========================================
pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 id/name 参考表（按 name 排序）
    pub fn list_entries(&self, table: &str) -> RepositoryResult<Vec<CatalogEntry>> {
        // 表名不能参数化，限定白名单
        if !ENTRY_TABLES.contains(&table) {
            return Err(RepositoryError::FieldValueError {
                field: "table".to_string(),
                message: format!("不支持的参考表: {}", table),
            });
        }

        let conn = self.get_conn()?;
        let sql = format!("SELECT id, name FROM {} ORDER BY name ASC, id ASC", table);
        let mut stmt = conn.prepare(&sql)?;
        let entries = stmt
            .query_map([], |row| {
                Ok(CatalogEntry {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(entries)
    }

    pub fn list_payable_formulas(&self) -> RepositoryResult<Vec<PayableFormula>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT id, name, is_deduction FROM payable_formula ORDER BY name ASC, id ASC")?;
        let formulas = stmt
            .query_map([], |row| {
                Ok(PayableFormula {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    is_deduction: row.get::<_, i64>(2)? != 0,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(formulas)
    }

    /// 读取公式定义表（penalty_formula / refining_expense_formula）
    fn list_formula_definitions(&self, table: &str) -> RepositoryResult<Vec<FormulaDefinition>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT id, name FROM {} ORDER BY name ASC, id ASC", table);
        let mut stmt = conn.prepare(&sql)?;
        let formulas = stmt
            .query_map([], |row| {
                Ok(FormulaDefinition {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(formulas)
    }

    pub fn list_penalty_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>> {
        self.list_formula_definitions("penalty_formula")
    }

    pub fn list_refining_expense_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>> {
        self.list_formula_definitions("refining_expense_formula")
    }

    pub fn list_market_indices(&self) -> RepositoryResult<Vec<MarketIndex>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM market_index ORDER BY name ASC, id ASC")?;
        let indices = stmt
            .query_map([], |row| {
                Ok(MarketIndex {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(indices)
    }

    // ===== 模板 =====

    pub fn list_templates(&self) -> RepositoryResult<Vec<ContractTemplate>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT template_id, name, contract_type, incoterm_id
            FROM contract_template
            ORDER BY name ASC
            "#,
        )?;
        let templates = stmt
            .query_map([], map_template_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(templates)
    }

    /// 读取模板及其应付/罚则条款
    ///
    /// # 返回
    /// - Ok(Some(TemplateBundle)): 找到模板
    /// - Ok(None): 模板不存在
    pub fn find_template_bundle(&self, template_id: &str) -> RepositoryResult<Option<TemplateBundle>> {
        let conn = self.get_conn()?;

        let template = conn
            .query_row(
                r#"
                SELECT template_id, name, contract_type, incoterm_id
                FROM contract_template
                WHERE template_id = ?1
                "#,
                params![template_id],
                map_template_row,
            )
            .optional()?;

        let template = match template {
            Some(t) => t,
            None => return Ok(None),
        };

        let mut stmt = conn.prepare(
            r#"
            SELECT formula_id, metal, deduction_value, deduction_unit, balance_percentage, market_index_id
            FROM contract_template_payable
            WHERE template_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let payables = stmt
            .query_map(params![template_id], |row| {
                Ok(TemplatePayable {
                    formula_id: row.get(0)?,
                    metal: row.get(1)?,
                    deduction_value: row.get(2)?,
                    deduction_unit: row.get(3)?,
                    balance_percentage: row.get(4)?,
                    market_index_id: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            r#"
            SELECT formula_id, metal, amount_usd, lower_limit, lower_limit_unit, upper_limit, upper_limit_unit
            FROM contract_template_penalty
            WHERE template_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let penalties = stmt
            .query_map(params![template_id], |row| {
                Ok(TemplatePenalty {
                    formula_id: row.get(0)?,
                    metal: row.get(1)?,
                    amount_usd: row.get(2)?,
                    lower_limit: row.get(3)?,
                    lower_limit_unit: row.get(4)?,
                    upper_limit: row.get(5)?,
                    upper_limit_unit: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;

        Ok(Some(TemplateBundle {
            template,
            payables,
            penalties,
        }))
    }
}

fn map_template_row(row: &rusqlite::Row<'_>) -> SqliteResult<ContractTemplate> {
    Ok(ContractTemplate {
        template_id: row.get(0)?,
        name: row.get(1)?,
        contract_type: row
            .get::<_, Option<String>>(2)?
            .and_then(|s| ContractType::parse(&s)),
        incoterm_id: row.get(3)?,
    })
}

// ==========================================
// CatalogSource 实现
// ==========================================
#[async_trait]
impl CatalogSource for CatalogRepository {
    async fn vendors(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        self.list_entries("vendor")
    }

    async fn buyers(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        self.list_entries("buyer")
    }

    async fn products(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        self.list_entries("product")
    }

    async fn countries(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        self.list_entries("country")
    }

    async fn incoterms(&self) -> RepositoryResult<Vec<CatalogEntry>> {
        self.list_entries("incoterm")
    }

    async fn payable_formulas(&self) -> RepositoryResult<Vec<PayableFormula>> {
        self.list_payable_formulas()
    }

    async fn penalty_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>> {
        self.list_penalty_formulas()
    }

    async fn refining_expense_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>> {
        self.list_refining_expense_formulas()
    }

    async fn market_indices(&self) -> RepositoryResult<Vec<MarketIndex>> {
        self.list_market_indices()
    }

    async fn template_bundle(&self, template_id: &str) -> RepositoryResult<Option<TemplateBundle>> {
        self.find_template_bundle(template_id)
    }
}
