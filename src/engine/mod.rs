// ==========================================
// 家教平台排课引擎 - 引擎层
// ==========================================
// 职责: 时段生成、名额、发布校验、报名、价格分档规则
// 红线: Engine 不拼 SQL，存储经 ports 注入
// ==========================================

pub mod capacity;
pub mod enrollment;
pub mod error;
pub mod events;
pub mod filters;
pub mod ports;
pub mod price_stats;
pub mod publish;
pub mod schedule_builder;
pub mod validation;

// 重导出核心引擎
pub use capacity::{CapacityState, CapacityTracker};
pub use enrollment::{EnrollmentReceipt, EnrollmentService};
pub use error::{ErrorKind, SchedulingError, SchedulingResult};
pub use events::{
    NoOpEventPublisher, OfferingEvent, OfferingEventPublisher, OfferingEventType,
    OptionalEventPublisher,
};
pub use filters::{FilterService, OfferingSummary};
pub use ports::{OfferingStore, SchedulingStores, SlotStore};
pub use price_stats::{PriceStatisticsAccumulator, PriceStatisticsRegistry};
pub use publish::{LifecycleStage, PublishWorkflow};
pub use schedule_builder::{BuildOptions, ScheduleBuilder};
pub use validation::{check_edit_guard, first_failed_check, validate_for_publish, PublishCheck};
