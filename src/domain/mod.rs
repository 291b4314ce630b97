// ==========================================
// 家教平台排课引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、请求结构
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod filter;
pub mod offering;
pub mod request;
pub mod slot;
pub mod types;

// 重导出核心类型
pub use filter::FilterResponse;
pub use offering::{Offering, TeacherIdentity};
pub use request::{CourseSlotRequest, LessonSlotRequest, OfferingRequest, ThemaRequest};
pub use slot::{CourseSlot, LessonSlot, Slot, SlotHeader, Thema};
pub use types::{DayOfWeek, OfferingKind, OfferingStatus};
