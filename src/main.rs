// ==========================================
// 家教平台排课引擎 - 命令行入口
// ==========================================
// 用法: tutoring-scheduler [数据库路径]
// 输出: 筛选面板数据与首页热门课程（JSON）
// ==========================================

use std::sync::Arc;

use anyhow::{anyhow, Context};
use serde_json::json;

use tutoring_scheduler::app::{get_default_db_path, open_database, AppState};
use tutoring_scheduler::config::ConfigManager;
use tutoring_scheduler::{logging, OfferingKind};

const POPULAR_LIMIT: usize = 10;

fn main() -> anyhow::Result<()> {
    let db_path = std::env::args()
        .nth(1)
        .unwrap_or_else(get_default_db_path);

    let conn = open_database(&db_path).map_err(|e| anyhow!(e))?;
    let config_manager =
        ConfigManager::from_connection(conn.clone()).context("无法创建ConfigManager")?;
    let config = config_manager
        .load_scheduling_config()
        .context("排课配置无效")?;

    // 日志格式来自 config_kv，RUST_LOG 控制级别
    logging::init_with_format(config.log_format);

    tracing::info!("==================================================");
    tracing::info!("家教平台排课引擎");
    tracing::info!("系统版本: {}", tutoring_scheduler::VERSION);
    tracing::info!("==================================================");

    let state = AppState::with_config(&db_path, conn, Arc::new(config_manager), config);

    let report = json!({
        "dbPath": state.db_path,
        "filters": {
            "course": state.filter_service.filters(OfferingKind::Course)?,
            "privateLesson": state.filter_service.filters(OfferingKind::PrivateLesson)?,
        },
        "popular": state.filter_service.popular_offerings(POPULAR_LIMIT)?,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
