// ==========================================
// 家教平台排课引擎 - 应用层
// ==========================================
// 职责: 进程级上下文装配（连接、配置、价格统计、服务实例）
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, open_database, AppState, TracingEventPublisher};
