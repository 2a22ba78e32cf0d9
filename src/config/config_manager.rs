// ==========================================
// 合同录入引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、快照
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::engine_config::{CommitMode, ContractNumbering, EngineConfig, QuotaDefaults};
use crate::db::open_sqlite_connection;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::HashMap;
use std::error::Error;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )?;
        Ok(())
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    fn get_f64_or(&self, key: &str, default: f64) -> Result<f64, Box<dyn Error>> {
        let value = self.get_config_or_default(key, &default.to_string())?;
        match value.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 0.0 => Ok(v),
            _ => {
                tracing::warn!("配置 {} 取值无效({})，使用默认值 {}", key, value, default);
                Ok(default)
            }
        }
    }

    fn get_bool_or(&self, key: &str, default: bool) -> Result<bool, Box<dyn Error>> {
        let value = self.get_config_or_default(key, if default { "1" } else { "0" })?;
        Ok(match value.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        })
    }

    /// 获取所有配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: HashMap<String, String> = HashMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 录入引擎配置 =====

    /// 加载录入引擎配置
    ///
    /// 缺失或格式错误的键回退到默认值
    pub fn load_engine_config(&self) -> Result<EngineConfig, Box<dyn Error>> {
        let base = QuotaDefaults::default();
        let quota_defaults = QuotaDefaults {
            tmh: self.get_f64_or(config_keys::QUOTA_DEFAULT_TMH, base.tmh)?,
            tms: self.get_f64_or(config_keys::QUOTA_DEFAULT_TMS, base.tms)?,
            h2o_percentage: self.get_f64_or(config_keys::QUOTA_DEFAULT_H2O_PCT, base.h2o_percentage)?,
        };

        let enforce_dry_le_wet = self.get_bool_or(config_keys::QUOTA_ENFORCE_DRY_LE_WET, false)?;

        let mode_raw = self.get_config_or_default(config_keys::COMMIT_MODE, "TRANSACTIONAL")?;
        let commit_mode = CommitMode::parse(&mode_raw).unwrap_or_else(|| {
            tracing::warn!("未知的保存模式 {}，使用 TRANSACTIONAL", mode_raw);
            CommitMode::Transactional
        });

        let default_numbering = ContractNumbering::default();
        let numbering = ContractNumbering {
            purchase_prefix: self.get_config_or_default(
                config_keys::CONTRACT_NUMBER_PREFIX_PURCHASE,
                &default_numbering.purchase_prefix,
            )?,
            sale_prefix: self.get_config_or_default(
                config_keys::CONTRACT_NUMBER_PREFIX_SALE,
                &default_numbering.sale_prefix,
            )?,
        };

        Ok(EngineConfig {
            quota_defaults,
            enforce_dry_le_wet,
            commit_mode,
            numbering,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 月度配额默认值
    pub const QUOTA_DEFAULT_TMH: &str = "quota_default_tmh";
    pub const QUOTA_DEFAULT_TMS: &str = "quota_default_tms";
    pub const QUOTA_DEFAULT_H2O_PCT: &str = "quota_default_h2o_pct";
    pub const QUOTA_ENFORCE_DRY_LE_WET: &str = "quota_enforce_dry_le_wet";

    // 保存
    pub const COMMIT_MODE: &str = "commit_mode";

    // 合同编号
    pub const CONTRACT_NUMBER_PREFIX_PURCHASE: &str = "contract_number_prefix_purchase";
    pub const CONTRACT_NUMBER_PREFIX_SALE: &str = "contract_number_prefix_sale";
}
