use crate::config::engine_config::ContractNumbering;
use crate::domain::records::{
    ContractHeader, ContractPayableRecord, ContractPenaltyRecord, ContractQualitySpecRecord,
    ContractQuotaRecord, ContractRefiningExpenseRecord, NewContractRecord,
};
use crate::domain::types::ContractStatus;
use crate::engine::persistence_coordinator::ContractWriter;
use crate::repository::error::RepositoryResult;
use chrono::Datelike;
use rusqlite::{params, Connection};
use uuid::Uuid;

// ==========================================
// SqlContractWriter - 单次保存内的 SQL 写入
// ==========================================
// 连接可以是普通连接（逐步自动提交）或事务（经 Deref 传入）
pub struct SqlContractWriter<'c> {
    conn: &'c Connection,
    numbering: &'c ContractNumbering,
}

impl<'c> SqlContractWriter<'c> {
    pub fn new(conn: &'c Connection, numbering: &'c ContractNumbering) -> Self {
        Self { conn, numbering }
    }

    /// 同前缀同年份的下一个序号（与插入在同一连接内）
    fn next_sequence(&self, prefix: &str, year: i32) -> RepositoryResult<i64> {
        let seq: i64 = self.conn.query_row(
            r#"
            SELECT COALESCE(MAX(number_seq), 0) + 1
            FROM contract
            WHERE number_prefix = ?1 AND number_year = ?2
            "#,
            params![prefix, year],
            |row| row.get(0),
        )?;
        Ok(seq)
    }
}

/// 合同编号: `<前缀>-<年份>-<序号:04>`
pub fn format_contract_number(prefix: &str, year: i32, seq: i64) -> String {
    format!("{}-{}-{:04}", prefix, year, seq)
}

impl ContractWriter for SqlContractWriter<'_> {
    fn create_contract(&mut self, record: &NewContractRecord) -> RepositoryResult<ContractHeader> {
        let contract_id = Uuid::new_v4().to_string();
        let prefix = self.numbering.prefix_for(record.contract_type).to_string();
        let year = chrono::Local::now().year();
        let seq = self.next_sequence(&prefix, year)?;
        let contract_number = format_contract_number(&prefix, year, seq);
        let status = ContractStatus::Draft;

        self.conn.execute(
            r#"
            INSERT INTO contract (
                contract_id, contract_number, number_prefix, number_year, number_seq,
                contract_type, vendor_id, buyer_id, product_id, country_id,
                start_month, end_month, incoterm_id, delivery_location, status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                contract_id,
                contract_number,
                prefix,
                year,
                seq,
                record.contract_type.as_str(),
                record.vendor_id,
                record.buyer_id,
                record.product_id,
                record.country_id,
                record.start_month.format("%Y-%m-%d").to_string(),
                record.end_month.format("%Y-%m-%d").to_string(),
                record.incoterm_id,
                record.delivery_location,
                status.as_str(),
            ],
        )?;

        tracing::debug!("contract 写入: id={}, number={}", contract_id, contract_number);
        Ok(ContractHeader {
            contract_id,
            contract_number,
            status,
        })
    }

    fn insert_quotas(&mut self, contract_id: &str, quotas: &[ContractQuotaRecord]) -> RepositoryResult<usize> {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO contract_quota (contract_id, month, tmh, tms, h2o_percentage)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )?;

        let mut count = 0;
        for quota in quotas {
            stmt.execute(params![
                contract_id,
                quota.month.format("%Y-%m-%d").to_string(),
                quota.tmh,
                quota.tms,
                quota.h2o_percentage,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_payables(
        &mut self,
        contract_id: &str,
        payables: &[ContractPayableRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO contract_payable (
                contract_id, formula_id, metal, deduction_value, deduction_unit,
                balance_percentage, market_index_id, formula_text
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )?;

        let mut count = 0;
        for p in payables {
            stmt.execute(params![
                contract_id,
                p.formula_id,
                p.metal,
                p.deduction_value,
                p.deduction_unit,
                p.balance_percentage,
                p.market_index_id,
                p.formula_text,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_penalties(
        &mut self,
        contract_id: &str,
        penalties: &[ContractPenaltyRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO contract_penalty (
                contract_id, formula_id, metal, amount_usd,
                lower_limit, lower_limit_unit, upper_limit, upper_limit_unit, penalty_formula
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )?;

        let mut count = 0;
        for p in penalties {
            stmt.execute(params![
                contract_id,
                p.formula_id,
                p.metal,
                p.amount_usd,
                p.lower_limit,
                p.lower_limit_unit,
                p.upper_limit,
                p.upper_limit_unit,
                p.penalty_formula,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_quality_specs(
        &mut self,
        contract_id: &str,
        specs: &[ContractQualitySpecRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO contract_quality_spec (
                contract_id, metal, spec_type, min_value, max_value, unit, formula_text
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )?;

        let mut count = 0;
        for s in specs {
            stmt.execute(params![
                contract_id,
                s.metal,
                s.spec_type.as_str(),
                s.min_value,
                s.max_value,
                s.unit,
                s.formula_text,
            ])?;
            count += 1;
        }
        Ok(count)
    }

    fn insert_refining_expenses(
        &mut self,
        contract_id: &str,
        expenses: &[ContractRefiningExpenseRecord],
    ) -> RepositoryResult<usize> {
        let mut stmt = self.conn.prepare(
            r#"
            INSERT INTO contract_refining_expense (
                contract_id, formula_id, metal, amount_usd, unit, formula_text
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )?;

        let mut count = 0;
        for e in expenses {
            stmt.execute(params![
                contract_id,
                e.formula_id,
                e.metal,
                e.amount_usd,
                e.unit,
                e.formula_text,
            ])?;
            count += 1;
        }
        Ok(count)
    }
}
