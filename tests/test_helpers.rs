// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、参考目录种子数据、草稿构造
// ==========================================

#![allow(dead_code)]

use std::error::Error;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use contract_authoring::api::ContractApi;
use contract_authoring::db::{init_schema, open_sqlite_connection};
use contract_authoring::domain::{ContractDraft, ContractType};
use contract_authoring::engine::{generate_quotas, DraftEvent, DraftSession};
use rusqlite::{params, Connection};
use tempfile::NamedTempFile;

/// 测试环境（临时文件需与环境同生命周期）
pub struct TestEnv {
    pub _temp_file: NamedTempFile,
    pub db_path: String,
    pub conn: Arc<Mutex<Connection>>,
    pub api: ContractApi,
}

impl TestEnv {
    /// 创建临时数据库、建表、写入参考目录
    pub fn new() -> Result<Self, Box<dyn Error>> {
        contract_authoring::logging::init_test();
        let (temp_file, db_path) = create_test_db()?;
        let conn = Arc::new(Mutex::new(open_sqlite_connection(&db_path)?));
        let api = ContractApi::from_connection(conn.clone())?;

        Ok(Self {
            _temp_file: temp_file,
            db_path,
            conn,
            api,
        })
    }

    /// 写入全局配置后重建 API（编号前缀在构造时读取）
    pub fn with_config(entries: &[(&str, &str)]) -> Result<Self, Box<dyn Error>> {
        let env = Self::new()?;
        {
            let conn = env.conn.lock().map_err(|e| e.to_string())?;
            for (key, value) in entries {
                conn.execute(
                    "INSERT OR REPLACE INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)",
                    params![key, value],
                )?;
            }
        }
        let api = ContractApi::from_connection(env.conn.clone())?;
        Ok(Self { api, ..env })
    }

    /// 表行数
    pub fn count(&self, table: &str) -> i64 {
        self.conn
            .lock()
            .unwrap()
            .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
            .unwrap()
    }

    /// 子表中 contract_id 的去重集合
    pub fn distinct_contract_ids(&self, table: &str) -> Vec<String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(&format!("SELECT DISTINCT contract_id FROM {} ORDER BY contract_id", table))
            .unwrap();
        stmt.query_map([], |row| row.get(0))
            .unwrap()
            .collect::<rusqlite::Result<Vec<String>>>()
            .unwrap()
    }
}

/// 创建临时测试数据库并初始化 schema 与参考目录
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    seed_catalog(&conn)?;

    Ok((temp_file, db_path))
}

/// 写入参考目录与模板
pub fn seed_catalog(conn: &Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(
        r#"
        INSERT INTO vendor (id, name) VALUES ('V-01', 'Minera Andina');
        INSERT INTO buyer (id, name) VALUES ('B-01', 'Fundición Norte');
        INSERT INTO product (id, name) VALUES ('P-01', 'Concentrado de Cobre');
        INSERT INTO country (id, name) VALUES ('PE', 'Perú');
        INSERT INTO incoterm (id, name) VALUES ('FOB', 'Free On Board');

        INSERT INTO payable_formula (id, name, is_deduction) VALUES
            ('PF-DED', 'Deducción Porcentual', 1),
            ('PF-NA', 'No Aplica', 0);
        INSERT INTO penalty_formula (id, name) VALUES
            ('PN-STD', 'Penalidad Estándar'),
            ('PN-NA', 'No Aplica');
        INSERT INTO refining_expense_formula (id, name) VALUES
            ('RE-FIX', 'Tarifa Fija'),
            ('RE-NA', 'No Aplica');
        INSERT INTO market_index (id, name) VALUES ('MI-LME-CU', 'LME Cu');

        INSERT INTO contract_template (template_id, name, contract_type, incoterm_id)
            VALUES ('TPL-1', 'Compra Concentrado Cu', 'purchase', 'FOB');
        INSERT INTO contract_template_payable
            (template_id, formula_id, metal, deduction_value, deduction_unit, balance_percentage, market_index_id)
            VALUES ('TPL-1', 'PF-DED', 'Cu', 1.0, '%', 96.5, 'MI-LME-CU');
        INSERT INTO contract_template_penalty
            (template_id, formula_id, metal, amount_usd, lower_limit, lower_limit_unit, upper_limit, upper_limit_unit)
            VALUES ('TPL-1', 'PN-STD', 'As', 2.5, 0.2, '%', 0.5, '%');
        "#,
    )?;
    Ok(())
}

pub fn month(year: i32, month: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

/// 填写完整基本信息与贸易术语（2026-01 ~ 2026-03，3个配额）
pub fn fill_required_sections(session: &mut DraftSession, contract_type: ContractType) {
    let events = [
        DraftEvent::SetContractType(Some(contract_type)),
        DraftEvent::SetVendor(Some("V-01".to_string())),
        DraftEvent::SetBuyer(Some("B-01".to_string())),
        DraftEvent::SetProduct(Some("P-01".to_string())),
        DraftEvent::SetCountry(Some("PE".to_string())),
        DraftEvent::SetStartMonth(Some(month(2026, 1))),
        DraftEvent::SetEndMonth(Some(month(2026, 3))),
        DraftEvent::SetIncoterm(Some("FOB".to_string())),
        DraftEvent::SetDeliveryLocation("Callao".to_string()),
    ];
    for event in events {
        session.dispatch(event).expect("事件处理失败");
    }
}

/// 直接构造的可保存草稿（2个配额，无条款）
pub fn complete_draft() -> ContractDraft {
    let mut draft = ContractDraft::new();
    draft.contract_type = Some(ContractType::Purchase);
    draft.vendor_id = Some("V-01".to_string());
    draft.buyer_id = Some("B-01".to_string());
    draft.product_id = Some("P-01".to_string());
    draft.country_id = Some("PE".to_string());
    draft.delivery_window.start_month = Some(month(2026, 1));
    draft.delivery_window.end_month = Some(month(2026, 2));
    draft.quotas = generate_quotas(month(2026, 1), month(2026, 2));
    draft.incoterm_id = Some("FOB".to_string());
    draft.delivery_location = "Callao".to_string();
    draft
}
