// ==========================================
// 家教平台排课引擎 - 应用状态
// ==========================================
// 职责: 管理进程级共享状态和服务实例
// 说明: 价格统计只存在于进程内，随 AppState 创建、随进程结束丢弃
// ==========================================

use std::error::Error;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::{ConfigManager, SchedulingConfig};
use crate::db::{ensure_schema, open_sqlite_connection, read_schema_version, CURRENT_SCHEMA_VERSION};
use crate::engine::{
    EnrollmentService, FilterService, OfferingEvent, OfferingEventPublisher,
    OptionalEventPublisher, PriceStatisticsRegistry, PublishWorkflow, SchedulingStores,
};
use crate::i18n;
use crate::repository::sqlite_stores;

/// 以结构化日志输出课程事件
#[derive(Debug, Clone, Default)]
pub struct TracingEventPublisher;

impl OfferingEventPublisher for TracingEventPublisher {
    fn publish(&self, event: OfferingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::info!(
            offering_id = %event.offering_id,
            event_type = event.event_type.as_str(),
            kind = %event.kind,
            slot_id = event.slot_id.as_deref().unwrap_or(""),
            student_id = event.student_id.as_deref().unwrap_or(""),
            "课程事件"
        );
        Ok(String::new())
    }
}

/// 打开数据库并确保表结构存在
///
/// # 返回
/// - Ok(conn): 已应用 PRAGMA、已建表的共享连接
/// - Err(String): 打开或建表失败
pub fn open_database(db_path: &str) -> Result<Arc<Mutex<Connection>>, String> {
    let conn = open_sqlite_connection(db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
    ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;

    match read_schema_version(&conn) {
        Ok(Some(version)) if version != CURRENT_SCHEMA_VERSION => {
            tracing::warn!(
                found = version,
                expected = CURRENT_SCHEMA_VERSION,
                "数据库 schema 版本不一致"
            );
        }
        Ok(_) => {}
        Err(e) => tracing::warn!("读取 schema 版本失败(将继续启动): {}", e),
    }

    Ok(Arc::new(Mutex::new(conn)))
}

/// 应用状态
///
/// 包含所有服务实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 共享连接
    pub conn: Arc<Mutex<Connection>>,

    /// 生效中的排课配置
    pub config: SchedulingConfig,

    /// 配置管理器（config_kv 读写）
    pub config_manager: Arc<ConfigManager>,

    /// 进程级价格统计
    pub price_stats: Arc<PriceStatisticsRegistry>,

    /// 存储端口集合
    pub stores: SchedulingStores,

    /// 课程发布工作流
    pub publish_workflow: Arc<PublishWorkflow>,

    /// 报名服务
    pub enrollment_service: Arc<EnrollmentService>,

    /// 筛选与首页推荐
    pub filter_service: Arc<FilterService>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 说明
    /// 打开数据库、读取 config_kv 中的排课配置，再装配各服务
    pub fn new(db_path: &str) -> Result<Self, String> {
        let conn = open_database(db_path)?;
        let config_manager = ConfigManager::from_connection(conn.clone())
            .map_err(|e| format!("无法创建ConfigManager: {}", e))?;
        let config = config_manager
            .load_scheduling_config()
            .map_err(|e| format!("排课配置无效: {}", e))?;
        Ok(Self::with_config(db_path, conn, Arc::new(config_manager), config))
    }

    /// 以已加载的配置装配
    pub fn with_config(
        db_path: &str,
        conn: Arc<Mutex<Connection>>,
        config_manager: Arc<ConfigManager>,
        config: SchedulingConfig,
    ) -> Self {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);
        i18n::set_locale(&config.locale);

        let stores = sqlite_stores(conn.clone());
        let price_stats = Arc::new(PriceStatisticsRegistry::new());
        let events = OptionalEventPublisher::with_publisher(Arc::new(TracingEventPublisher));

        let publish_workflow = Arc::new(
            PublishWorkflow::new(stores.clone(), price_stats.clone(), config.clone())
                .with_event_publisher(events.clone()),
        );
        let enrollment_service =
            Arc::new(EnrollmentService::new(stores.clone()).with_event_publisher(events));
        let filter_service = Arc::new(FilterService::new(
            stores.offerings.clone(),
            price_stats.clone(),
        ));

        tracing::info!(
            min_duration_minutes = config.min_duration_minutes,
            record_price_on_republish = config.record_price_on_republish,
            locale = %config.locale,
            "AppState初始化完成"
        );

        Self {
            db_path: db_path.to_string(),
            conn,
            config,
            config_manager,
            price_stats,
            stores,
            publish_workflow,
            enrollment_service,
            filter_service,
        }
    }
}

/// 获取默认数据库路径
///
/// 优先使用环境变量 TUTORING_SCHEDULER_DB_PATH，其次用户数据目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("TUTORING_SCHEDULER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./tutoring_scheduler.db");
    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("tutoring-scheduler");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("tutoring_scheduler.db");
        }
    }

    path.to_string_lossy().to_string()
}
