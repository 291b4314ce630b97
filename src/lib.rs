// ==========================================
// 家教平台排课引擎 - 核心库
// ==========================================
// 范围: 课程/私教课发布、时段生成、报名名额、价格分档
// 技术栈: Rust + SQLite
// 系统定位: 业务核心库 (HTTP/鉴权/检索由外部服务层负责)
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "bg");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 排课/名额/发布/价格统计规则
pub mod engine;

// 数据仓储层 - 端口的 SQLite / 内存实现
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// 应用层 - 进程级上下文装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{DayOfWeek, OfferingKind, OfferingStatus};

// 领域实体
pub use domain::{
    CourseSlot, FilterResponse, LessonSlot, Offering, OfferingRequest, Slot, SlotHeader,
    TeacherIdentity, Thema,
};

// 引擎
pub use engine::{
    CapacityTracker, EnrollmentService, FilterService, PriceStatisticsAccumulator,
    PriceStatisticsRegistry, PublishWorkflow, ScheduleBuilder, SchedulingError, SchedulingResult,
};

// 应用上下文
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "tutoring-scheduler";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
