// ==========================================
// 家教平台排课引擎 - 配置层
// ==========================================
// 职责: 系统配置管理
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod scheduling_config;

// 重导出核心配置
pub use config_manager::{config_keys, ConfigManager};
pub use scheduling_config::{LogFormat, SchedulingConfig};
