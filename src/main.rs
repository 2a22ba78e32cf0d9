// ==========================================
// 合同录入引擎 - 命令行入口
// ==========================================
// 用法:
//   contract-authoring commit <draft.json>       保存草稿，输出回执(JSON)
//   contract-authoring from-template <template_id> 输出模板预填草稿(JSON)
//   contract-authoring show <contract_id>         输出已保存合同(JSON)
//   contract-authoring templates                  列出合同模板
//   contract-authoring config                     输出配置快照
// 环境变量:
//   CONTRACT_AUTHORING_DB_PATH  数据库路径
//   CONTRACT_AUTHORING_LOCALE   提示语言（es / en）
//   CONTRACT_AUTHORING_LOG_FORMAT  日志格式（text / json，默认 text）
// ==========================================

use std::path::PathBuf;

use anyhow::{bail, Context};
use contract_authoring::api::{ApiError, ContractApi};
use contract_authoring::domain::ContractDraft;
use contract_authoring::{i18n, logging};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match std::env::var("CONTRACT_AUTHORING_LOG_FORMAT") {
        Ok(format) if format.trim().eq_ignore_ascii_case("json") => logging::init_json(),
        _ => logging::init(),
    }

    if let Ok(locale) = std::env::var("CONTRACT_AUTHORING_LOCALE") {
        i18n::set_locale(locale.trim());
    }

    let mut args = std::env::args().skip(1);
    let command = args.next().unwrap_or_default();
    let argument = args.next();

    let db_path = default_db_path();
    tracing::info!("{} v{} 使用数据库: {}", contract_authoring::APP_NAME, contract_authoring::VERSION, db_path);
    let api = ContractApi::open(&db_path).map_err(report)?;

    match (command.as_str(), argument) {
        ("commit", Some(path)) => {
            let raw = std::fs::read_to_string(&path).with_context(|| format!("读取草稿文件失败: {}", path))?;
            let draft: ContractDraft =
                serde_json::from_str(&raw).with_context(|| format!("草稿JSON解析失败: {}", path))?;

            let session = api.open_session_with_draft(draft).await.map_err(report)?;
            let receipt = api.save(&session).map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&receipt)?);
        }
        ("from-template", Some(template_id)) => {
            let session = api.open_session_from_template(&template_id).await.map_err(report)?;
            println!("{}", serde_json::to_string_pretty(session.draft())?);
        }
        ("show", Some(contract_id)) => {
            let detail = api.get_contract(&contract_id).map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&detail)?);
        }
        ("templates", _) => {
            let templates = api.list_templates().map_err(report)?;
            println!("{}", serde_json::to_string_pretty(&templates)?);
        }
        ("config", _) => {
            let snapshot = api
                .config_manager()
                .get_config_snapshot()
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            println!("{}", snapshot);
        }
        _ => bail!(
            "用法: contract-authoring <commit <draft.json> | from-template <template_id> | show <contract_id> | templates | config>"
        ),
    }

    Ok(())
}

/// 输出本地化提示，保留原始错误链
fn report(err: ApiError) -> anyhow::Error {
    eprintln!("{}", err.user_message());
    anyhow::Error::new(err)
}

/// 默认数据库路径
fn default_db_path() -> String {
    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("CONTRACT_AUTHORING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./contract_authoring.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("contract-authoring");
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("contract_authoring.db");
        }
    }

    path.to_string_lossy().to_string()
}
