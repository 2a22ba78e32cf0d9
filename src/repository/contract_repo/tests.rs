use super::ContractRepository;
use crate::config::engine_config::ContractNumbering;
use crate::domain::records::{ContractPayableRecord, ContractQuotaRecord, NewContractRecord};
use crate::domain::types::{ContractStatus, ContractType};
use crate::engine::persistence_coordinator::{ContractStore, ContractWriter};
use crate::repository::error::RepositoryError;
use chrono::{Datelike, NaiveDate};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

fn setup_test_db() -> Arc<Mutex<Connection>> {
    let conn = Connection::open_in_memory().unwrap();
    crate::db::configure_sqlite_connection(&conn).unwrap();
    crate::db::init_schema(&conn).unwrap();
    conn.execute_batch(
        r#"
        INSERT INTO vendor (id, name) VALUES ('V-01', 'Minera Andina');
        INSERT INTO buyer (id, name) VALUES ('B-01', 'Fundición Norte');
        INSERT INTO product (id, name) VALUES ('P-01', 'Concentrado de Cobre');
        INSERT INTO country (id, name) VALUES ('PE', 'Perú');
        INSERT INTO incoterm (id, name) VALUES ('FOB', 'Free On Board');
        INSERT INTO payable_formula (id, name, is_deduction) VALUES ('PF-DED', 'Deducción Porcentual', 1);
        "#,
    )
    .unwrap();
    Arc::new(Mutex::new(conn))
}

fn record(contract_type: ContractType) -> NewContractRecord {
    NewContractRecord {
        contract_type,
        vendor_id: "V-01".to_string(),
        buyer_id: "B-01".to_string(),
        product_id: "P-01".to_string(),
        country_id: "PE".to_string(),
        start_month: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        end_month: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
        incoterm_id: "FOB".to_string(),
        delivery_location: "Callao".to_string(),
    }
}

fn create(repo: &ContractRepository, contract_type: ContractType) -> String {
    let mut number = String::new();
    repo.run(true, &mut |writer: &mut dyn ContractWriter| {
        number = writer.create_contract(&record(contract_type))?.contract_number;
        Ok(())
    })
    .unwrap();
    number
}

fn count(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    conn.lock()
        .unwrap()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))
        .unwrap()
}

#[test]
fn test_contract_numbers_are_sequential_per_prefix() {
    let repo = ContractRepository::from_connection(setup_test_db());
    let year = chrono::Local::now().year();

    assert_eq!(create(&repo, ContractType::Purchase), format!("CC-{}-0001", year));
    assert_eq!(create(&repo, ContractType::Purchase), format!("CC-{}-0002", year));
    assert_eq!(create(&repo, ContractType::Sale), format!("CV-{}-0001", year));
    assert_eq!(repo.list_headers().unwrap().len(), 3);
}

#[test]
fn test_custom_prefix() {
    let repo = ContractRepository::from_connection(setup_test_db()).with_numbering(ContractNumbering {
        purchase_prefix: "CP".to_string(),
        sale_prefix: "VT".to_string(),
    });
    assert!(create(&repo, ContractType::Sale).starts_with("VT-"));
}

#[test]
fn test_atomic_run_rolls_back_on_error() {
    let conn = setup_test_db();
    let repo = ContractRepository::from_connection(conn.clone());

    let result = repo.run(true, &mut |writer: &mut dyn ContractWriter| {
        let header = writer.create_contract(&record(ContractType::Sale))?;
        writer.insert_quotas(
            &header.contract_id,
            &[ContractQuotaRecord {
                month: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                tmh: 330.0,
                tms: 300.0,
                h2o_percentage: 10.0,
            }],
        )?;
        Err(RepositoryError::InternalError("abort".to_string()))
    });

    assert!(result.is_err());
    assert_eq!(count(&conn, "contract"), 0);
    assert_eq!(count(&conn, "contract_quota"), 0);
}

#[test]
fn test_sequential_run_keeps_completed_writes() {
    let conn = setup_test_db();
    let repo = ContractRepository::from_connection(conn.clone());

    let result = repo.run(false, &mut |writer: &mut dyn ContractWriter| {
        let header = writer.create_contract(&record(ContractType::Purchase))?;
        // 未知公式触发外键失败
        writer.insert_payables(
            &header.contract_id,
            &[ContractPayableRecord {
                formula_id: "PF-UNKNOWN".to_string(),
                metal: Some("Cu".to_string()),
                deduction_value: None,
                deduction_unit: Some("%".to_string()),
                balance_percentage: None,
                market_index_id: None,
                formula_text: String::new(),
            }],
        )?;
        Ok(())
    });

    assert!(matches!(result, Err(RepositoryError::ForeignKeyViolation(_))));
    assert_eq!(count(&conn, "contract"), 1);
    assert_eq!(count(&conn, "contract_payable"), 0);
}

#[test]
fn test_find_detail_reads_back_written_rows() {
    let repo = ContractRepository::from_connection(setup_test_db());

    let mut contract_id = String::new();
    repo.run(true, &mut |writer: &mut dyn ContractWriter| {
        let header = writer.create_contract(&record(ContractType::Sale))?;
        writer.insert_quotas(
            &header.contract_id,
            &[
                ContractQuotaRecord {
                    month: NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                    tmh: 330.0,
                    tms: 300.0,
                    h2o_percentage: 10.0,
                },
                ContractQuotaRecord {
                    month: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                    tmh: 500.0,
                    tms: 450.0,
                    h2o_percentage: 10.0,
                },
            ],
        )?;
        contract_id = header.contract_id;
        Ok(())
    })
    .unwrap();

    let detail = repo.find_detail(&contract_id).unwrap().unwrap();
    assert_eq!(detail.contract.header.status, ContractStatus::Draft);
    assert_eq!(detail.contract.record.delivery_location, "Callao");
    assert_eq!(detail.quotas.len(), 2);
    assert_eq!(detail.quotas[0].tmh, 500.0);
    assert!(detail.payables.is_empty());

    let by_number = repo
        .find_by_number(&detail.contract.header.contract_number)
        .unwrap()
        .unwrap();
    assert_eq!(by_number.header.contract_id, contract_id);

    assert!(repo.find_detail("missing").unwrap().is_none());
}
