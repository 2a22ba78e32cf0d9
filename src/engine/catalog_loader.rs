// ==========================================
// 合同录入引擎 - 参考目录加载
// ==========================================
// 职责: 会话开始前读取九张参考表，组装只读目录快照
// 规则: 任一读取失败则整体失败；会话只能由完整目录构造
// 并发: 九个读取经 try_join! 同时发起；CatalogRepository 共用一个
//       Mutex<Connection>，实际逐表串行执行
// ==========================================

use async_trait::async_trait;

use crate::domain::catalog::{
    CatalogEntry, EconomicTermCatalog, FormulaDefinition, MarketIndex, PayableFormula,
};
use crate::domain::template::TemplateBundle;
use crate::repository::error::RepositoryResult;

// ==========================================
// CatalogSource Trait
// ==========================================
// 实现者: CatalogRepository（rusqlite）
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn vendors(&self) -> RepositoryResult<Vec<CatalogEntry>>;

    async fn buyers(&self) -> RepositoryResult<Vec<CatalogEntry>>;

    async fn products(&self) -> RepositoryResult<Vec<CatalogEntry>>;

    async fn countries(&self) -> RepositoryResult<Vec<CatalogEntry>>;

    async fn incoterms(&self) -> RepositoryResult<Vec<CatalogEntry>>;

    async fn payable_formulas(&self) -> RepositoryResult<Vec<PayableFormula>>;

    async fn penalty_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>>;

    async fn refining_expense_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>>;

    async fn market_indices(&self) -> RepositoryResult<Vec<MarketIndex>>;

    /// 读取模板及其条款（不存在返回 None）
    async fn template_bundle(&self, template_id: &str) -> RepositoryResult<Option<TemplateBundle>>;
}

/// 加载完整目录（任一表失败即返回错误）
pub async fn load_catalog(source: &dyn CatalogSource) -> RepositoryResult<EconomicTermCatalog> {
    let (
        vendors,
        buyers,
        products,
        countries,
        incoterms,
        payable_formulas,
        penalty_formulas,
        refining_expense_formulas,
        market_indices,
    ) = futures::try_join!(
        source.vendors(),
        source.buyers(),
        source.products(),
        source.countries(),
        source.incoterms(),
        source.payable_formulas(),
        source.penalty_formulas(),
        source.refining_expense_formulas(),
        source.market_indices(),
    )?;

    let catalog = EconomicTermCatalog {
        vendors,
        buyers,
        products,
        countries,
        incoterms,
        payable_formulas,
        penalty_formulas,
        refining_expense_formulas,
        market_indices,
    };

    tracing::info!("参考目录加载完成: {:?}", catalog.table_sizes());
    if catalog.deduction_payable_formula().is_none() {
        // 不阻断加载；新增应付条款时再报目录配置错误
        tracing::warn!("payable_formula 缺少 is_deduction=1 的记录，应付条款将无法新建");
    }

    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::error::RepositoryError;

    struct StaticSource {
        fail_market_indices: bool,
    }

    fn entries(prefix: &str) -> Vec<CatalogEntry> {
        vec![CatalogEntry {
            id: format!("{}-01", prefix),
            name: format!("{} uno", prefix),
        }]
    }

    #[async_trait]
    impl CatalogSource for StaticSource {
        async fn vendors(&self) -> RepositoryResult<Vec<CatalogEntry>> {
            Ok(entries("V"))
        }
        async fn buyers(&self) -> RepositoryResult<Vec<CatalogEntry>> {
            Ok(entries("B"))
        }
        async fn products(&self) -> RepositoryResult<Vec<CatalogEntry>> {
            Ok(entries("P"))
        }
        async fn countries(&self) -> RepositoryResult<Vec<CatalogEntry>> {
            Ok(entries("PE"))
        }
        async fn incoterms(&self) -> RepositoryResult<Vec<CatalogEntry>> {
            Ok(entries("FOB"))
        }
        async fn payable_formulas(&self) -> RepositoryResult<Vec<PayableFormula>> {
            Ok(vec![PayableFormula {
                id: "PF-DED".to_string(),
                name: "Deducción Porcentual".to_string(),
                is_deduction: true,
            }])
        }
        async fn penalty_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>> {
            Ok(Vec::new())
        }
        async fn refining_expense_formulas(&self) -> RepositoryResult<Vec<FormulaDefinition>> {
            Ok(Vec::new())
        }
        async fn market_indices(&self) -> RepositoryResult<Vec<MarketIndex>> {
            if self.fail_market_indices {
                return Err(RepositoryError::DatabaseQueryError("no such table: market_index".to_string()));
            }
            Ok(vec![MarketIndex {
                id: "MI-LME-CU".to_string(),
                name: "LME Cu".to_string(),
            }])
        }
        async fn template_bundle(&self, _template_id: &str) -> RepositoryResult<Option<TemplateBundle>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_load_catalog_assembles_all_tables() {
        let source = StaticSource {
            fail_market_indices: false,
        };
        let catalog = load_catalog(&source).await.unwrap();
        assert_eq!(catalog.vendors[0].id, "V-01");
        assert_eq!(catalog.market_indices.len(), 1);
        assert!(catalog.deduction_payable_formula().is_some());
    }

    #[tokio::test]
    async fn test_any_failed_read_fails_the_load() {
        let source = StaticSource {
            fail_market_indices: true,
        };
        assert!(load_catalog(&source).await.is_err());
    }
}
