use super::core::ContractRepository;
use crate::domain::records::{
    ContractDetail, ContractHeader, ContractPayableRecord, ContractPenaltyRecord,
    ContractQualitySpecRecord, ContractQuotaRecord, ContractRefiningExpenseRecord,
    NewContractRecord, StoredContract,
};
use crate::domain::types::{ContractStatus, ContractType, SpecType};
use crate::repository::error::RepositoryResult;
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Result as SqliteResult, Row};

impl ContractRepository {
    // ==========================================
    // 查询操作（写入结果回读）
    // ==========================================

    /// 按 contract_id 查询合同主记录
    pub fn find_contract(&self, contract_id: &str) -> RepositoryResult<Option<StoredContract>> {
        let conn = self.get_conn()?;
        let contract = conn
            .query_row(
                r#"
                SELECT contract_id, contract_number, status,
                       contract_type, vendor_id, buyer_id, product_id, country_id,
                       start_month, end_month, incoterm_id, delivery_location, created_at
                FROM contract
                WHERE contract_id = ?1
                "#,
                params![contract_id],
                map_contract_row,
            )
            .optional()?;
        Ok(contract)
    }

    /// 按合同编号查询
    pub fn find_by_number(&self, contract_number: &str) -> RepositoryResult<Option<StoredContract>> {
        let conn = self.get_conn()?;
        let contract = conn
            .query_row(
                r#"
                SELECT contract_id, contract_number, status,
                       contract_type, vendor_id, buyer_id, product_id, country_id,
                       start_month, end_month, incoterm_id, delivery_location, created_at
                FROM contract
                WHERE contract_number = ?1
                "#,
                params![contract_number],
                map_contract_row,
            )
            .optional()?;
        Ok(contract)
    }

    /// 全部合同概要（按编号排序）
    pub fn list_headers(&self) -> RepositoryResult<Vec<ContractHeader>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT contract_id, contract_number, status
            FROM contract
            ORDER BY number_prefix ASC, number_year ASC, number_seq ASC
            "#,
        )?;
        let headers = stmt
            .query_map([], |row| {
                Ok(ContractHeader {
                    contract_id: row.get(0)?,
                    contract_number: row.get(1)?,
                    status: ContractStatus::parse(&row.get::<_, String>(2)?),
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(headers)
    }

    pub fn list_quotas(&self, contract_id: &str) -> RepositoryResult<Vec<ContractQuotaRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT month, tmh, tms, h2o_percentage
            FROM contract_quota
            WHERE contract_id = ?1
            ORDER BY month ASC, id ASC
            "#,
        )?;
        let quotas = stmt
            .query_map(params![contract_id], |row| {
                Ok(ContractQuotaRecord {
                    month: parse_date(row, 0)?,
                    tmh: row.get(1)?,
                    tms: row.get(2)?,
                    h2o_percentage: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(quotas)
    }

    pub fn list_payables(&self, contract_id: &str) -> RepositoryResult<Vec<ContractPayableRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT formula_id, metal, deduction_value, deduction_unit,
                   balance_percentage, market_index_id, formula_text
            FROM contract_payable
            WHERE contract_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let payables = stmt
            .query_map(params![contract_id], |row| {
                Ok(ContractPayableRecord {
                    formula_id: row.get(0)?,
                    metal: row.get(1)?,
                    deduction_value: row.get(2)?,
                    deduction_unit: row.get(3)?,
                    balance_percentage: row.get(4)?,
                    market_index_id: row.get(5)?,
                    formula_text: row.get(6)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(payables)
    }

    pub fn list_penalties(&self, contract_id: &str) -> RepositoryResult<Vec<ContractPenaltyRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT formula_id, metal, amount_usd, lower_limit, lower_limit_unit,
                   upper_limit, upper_limit_unit, penalty_formula
            FROM contract_penalty
            WHERE contract_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let penalties = stmt
            .query_map(params![contract_id], |row| {
                Ok(ContractPenaltyRecord {
                    formula_id: row.get(0)?,
                    metal: row.get(1)?,
                    amount_usd: row.get(2)?,
                    lower_limit: row.get(3)?,
                    lower_limit_unit: row.get(4)?,
                    upper_limit: row.get(5)?,
                    upper_limit_unit: row.get(6)?,
                    penalty_formula: row.get(7)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(penalties)
    }

    pub fn list_quality_specs(&self, contract_id: &str) -> RepositoryResult<Vec<ContractQualitySpecRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT metal, spec_type, min_value, max_value, unit, formula_text
            FROM contract_quality_spec
            WHERE contract_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let specs = stmt
            .query_map(params![contract_id], |row| {
                Ok(ContractQualitySpecRecord {
                    metal: row.get(0)?,
                    spec_type: SpecType::parse(&row.get::<_, String>(1)?),
                    min_value: row.get(2)?,
                    max_value: row.get(3)?,
                    unit: row.get(4)?,
                    formula_text: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(specs)
    }

    pub fn list_refining_expenses(
        &self,
        contract_id: &str,
    ) -> RepositoryResult<Vec<ContractRefiningExpenseRecord>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT formula_id, metal, amount_usd, unit, formula_text
            FROM contract_refining_expense
            WHERE contract_id = ?1
            ORDER BY id ASC
            "#,
        )?;
        let expenses = stmt
            .query_map(params![contract_id], |row| {
                Ok(ContractRefiningExpenseRecord {
                    formula_id: row.get(0)?,
                    metal: row.get(1)?,
                    amount_usd: row.get(2)?,
                    unit: row.get(3)?,
                    formula_text: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(expenses)
    }

    /// 合同及全部子记录
    pub fn find_detail(&self, contract_id: &str) -> RepositoryResult<Option<ContractDetail>> {
        let contract = match self.find_contract(contract_id)? {
            Some(c) => c,
            None => return Ok(None),
        };

        Ok(Some(ContractDetail {
            contract,
            quotas: self.list_quotas(contract_id)?,
            payables: self.list_payables(contract_id)?,
            penalties: self.list_penalties(contract_id)?,
            quality_specs: self.list_quality_specs(contract_id)?,
            refining_expenses: self.list_refining_expenses(contract_id)?,
        }))
    }
}

// ==========================================
// 行映射
// ==========================================

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn parse_date(row: &Row<'_>, idx: usize) -> SqliteResult<NaiveDate> {
    let raw: String = row.get(idx)?;
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|e| conversion_error(idx, format!("日期格式错误 {}: {}", raw, e)))
}

fn parse_datetime(row: &Row<'_>, idx: usize) -> SqliteResult<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%d %H:%M:%S")
        .map_err(|e| conversion_error(idx, format!("时间格式错误 {}: {}", raw, e)))
}

fn map_contract_row(row: &Row<'_>) -> SqliteResult<StoredContract> {
    let raw_type: String = row.get(3)?;
    let contract_type = ContractType::parse(&raw_type)
        .ok_or_else(|| conversion_error(3, format!("未知的合同类型: {}", raw_type)))?;

    Ok(StoredContract {
        header: ContractHeader {
            contract_id: row.get(0)?,
            contract_number: row.get(1)?,
            status: ContractStatus::parse(&row.get::<_, String>(2)?),
        },
        record: NewContractRecord {
            contract_type,
            vendor_id: row.get(4)?,
            buyer_id: row.get(5)?,
            product_id: row.get(6)?,
            country_id: row.get(7)?,
            start_month: parse_date(row, 8)?,
            end_month: parse_date(row, 9)?,
            incoterm_id: row.get(10)?,
            delivery_location: row.get(11)?,
        },
        created_at: parse_datetime(row, 12)?,
    })
}
