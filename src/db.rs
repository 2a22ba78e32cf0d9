// ==========================================
// 合同录入引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键约束必须逐连接开启）
// - 统一 busy_timeout
// - 幂等建表: 参考目录 / 模板 / 合同及子表 / config_kv
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

/// 幂等初始化全部表结构
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    match read_schema_version(conn)? {
        Some(v) if v > CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                "数据库 schema_version={} 高于代码期望版本 {}",
                v,
                CURRENT_SCHEMA_VERSION
            );
        }
        _ => {}
    }
    Ok(())
}

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id TEXT NOT NULL,
    key TEXT NOT NULL,
    value TEXT NOT NULL,
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

-- ===== 参考目录 =====
CREATE TABLE IF NOT EXISTS vendor (id TEXT PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS buyer (id TEXT PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS product (id TEXT PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS country (id TEXT PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS incoterm (id TEXT PRIMARY KEY, name TEXT NOT NULL);

CREATE TABLE IF NOT EXISTS payable_formula (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    is_deduction INTEGER NOT NULL DEFAULT 0
);
CREATE TABLE IF NOT EXISTS penalty_formula (id TEXT PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS refining_expense_formula (id TEXT PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE IF NOT EXISTS market_index (id TEXT PRIMARY KEY, name TEXT NOT NULL);

-- ===== 合同模板 =====
CREATE TABLE IF NOT EXISTS contract_template (
    template_id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    contract_type TEXT CHECK(contract_type IN ('purchase', 'sale')),
    incoterm_id TEXT REFERENCES incoterm(id)
);

CREATE TABLE IF NOT EXISTS contract_template_payable (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id TEXT NOT NULL REFERENCES contract_template(template_id) ON DELETE CASCADE,
    formula_id TEXT NOT NULL REFERENCES payable_formula(id),
    metal TEXT,
    deduction_value REAL,
    deduction_unit TEXT,
    balance_percentage REAL,
    market_index_id TEXT REFERENCES market_index(id)
);

CREATE TABLE IF NOT EXISTS contract_template_penalty (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    template_id TEXT NOT NULL REFERENCES contract_template(template_id) ON DELETE CASCADE,
    formula_id TEXT NOT NULL REFERENCES penalty_formula(id),
    metal TEXT,
    amount_usd REAL,
    lower_limit REAL,
    lower_limit_unit TEXT,
    upper_limit REAL,
    upper_limit_unit TEXT
);

-- ===== 合同及子表 =====
CREATE TABLE IF NOT EXISTS contract (
    contract_id TEXT PRIMARY KEY,
    contract_number TEXT NOT NULL UNIQUE,
    number_prefix TEXT NOT NULL,
    number_year INTEGER NOT NULL,
    number_seq INTEGER NOT NULL,
    contract_type TEXT NOT NULL CHECK(contract_type IN ('purchase', 'sale')),
    vendor_id TEXT NOT NULL REFERENCES vendor(id),
    buyer_id TEXT NOT NULL REFERENCES buyer(id),
    product_id TEXT NOT NULL REFERENCES product(id),
    country_id TEXT NOT NULL REFERENCES country(id),
    start_month TEXT NOT NULL,
    end_month TEXT NOT NULL,
    incoterm_id TEXT NOT NULL REFERENCES incoterm(id),
    delivery_location TEXT NOT NULL,
    status TEXT NOT NULL CHECK(status IN ('draft', 'active', 'closed', 'cancelled')),
    created_at TEXT NOT NULL DEFAULT (datetime('now', 'localtime')),
    UNIQUE(number_prefix, number_year, number_seq)
);

CREATE TABLE IF NOT EXISTS contract_quota (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id TEXT NOT NULL REFERENCES contract(contract_id) ON DELETE CASCADE,
    month TEXT NOT NULL,
    tmh REAL NOT NULL,
    tms REAL NOT NULL,
    h2o_percentage REAL NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_payable (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id TEXT NOT NULL REFERENCES contract(contract_id) ON DELETE CASCADE,
    formula_id TEXT NOT NULL REFERENCES payable_formula(id),
    metal TEXT,
    deduction_value REAL,
    deduction_unit TEXT,
    balance_percentage REAL,
    market_index_id TEXT REFERENCES market_index(id),
    formula_text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_penalty (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id TEXT NOT NULL REFERENCES contract(contract_id) ON DELETE CASCADE,
    formula_id TEXT NOT NULL REFERENCES penalty_formula(id),
    metal TEXT,
    amount_usd REAL,
    lower_limit REAL,
    lower_limit_unit TEXT,
    upper_limit REAL,
    upper_limit_unit TEXT,
    penalty_formula TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_quality_spec (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id TEXT NOT NULL REFERENCES contract(contract_id) ON DELETE CASCADE,
    metal TEXT NOT NULL,
    spec_type TEXT NOT NULL CHECK(spec_type IN ('range', 'minimum', 'maximum')),
    min_value REAL,
    max_value REAL,
    unit TEXT NOT NULL,
    formula_text TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS contract_refining_expense (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    contract_id TEXT NOT NULL REFERENCES contract(contract_id) ON DELETE CASCADE,
    formula_id TEXT NOT NULL REFERENCES refining_expense_formula(id),
    metal TEXT,
    amount_usd REAL,
    unit TEXT,
    formula_text TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_contract_quota_contract ON contract_quota(contract_id);
CREATE INDEX IF NOT EXISTS idx_contract_payable_contract ON contract_payable(contract_id);
CREATE INDEX IF NOT EXISTS idx_contract_penalty_contract ON contract_penalty(contract_id);
CREATE INDEX IF NOT EXISTS idx_contract_quality_spec_contract ON contract_quality_spec(contract_id);
CREATE INDEX IF NOT EXISTS idx_contract_refining_expense_contract ON contract_refining_expense(contract_id);
"#;
