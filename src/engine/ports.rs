// ==========================================
// 家教平台排课引擎 - 引擎层存储端口
// ==========================================
// 职责: 定义引擎所需的存储 trait，实现依赖倒置
// 说明: Engine 层定义 trait，Repository 层提供 SQLite / 内存实现
// 红线: Engine 不拼 SQL
// ==========================================

use std::sync::Arc;

use crate::domain::{Offering, Slot};
use crate::repository::error::RepositoryResult;

/// 课程存储端口
pub trait OfferingStore: Send + Sync {
    fn find_offering(&self, offering_id: &str) -> RepositoryResult<Option<Offering>>;

    /// 保存课程（字段 + 全量替换时段，原子；已有课程的热度保持不变）
    fn save_offering(&self, offering: &Offering) -> RepositoryResult<()>;

    /// 删除课程（级联删除时段、课题、报名）
    fn delete_offering(&self, offering_id: &str) -> RepositoryResult<()>;

    fn find_by_teacher(&self, teacher_id: &str) -> RepositoryResult<Vec<Offering>>;

    /// 有时段的已发布课程按热度降序（首页展示），先筛选后截取 limit
    fn find_most_popular(&self, limit: usize) -> RepositoryResult<Vec<Offering>>;

    /// 所有已出现的学科（去重、升序）
    fn list_subjects(&self) -> RepositoryResult<Vec<String>>;

    /// 所有已出现的年级（去重、升序）
    fn list_grades(&self) -> RepositoryResult<Vec<String>>;
}

/// 时段存储端口
pub trait SlotStore: Send + Sync {
    fn find_slot(&self, slot_id: &str) -> RepositoryResult<Option<Slot>>;

    /// 提交一次报名
    ///
    /// # 参数
    /// - `slot`: 已在内存中完成名额扣减的时段
    /// - `student_id`: 报名学生
    /// - `expected_revision`: 读取时的 revision
    ///
    /// # 返回
    /// - `RepositoryError::OptimisticLockFailure`: revision 不匹配
    ///
    /// 时段计数、报名记录、课程热度 +1 在同一事务内写入
    fn commit_enrollment(
        &self,
        slot: &Slot,
        student_id: &str,
        expected_revision: i32,
    ) -> RepositoryResult<()>;

    /// 仅删除空时段；已有报名返回 SlotOccupied
    fn delete_slot(&self, slot_id: &str) -> RepositoryResult<()>;
}

/// 排课引擎存储集合
///
/// 同一后端通常同时实现两个端口，这里聚合为一个参数
#[derive(Clone)]
pub struct SchedulingStores {
    pub offerings: Arc<dyn OfferingStore>,
    pub slots: Arc<dyn SlotStore>,
}

impl SchedulingStores {
    pub fn new(offerings: Arc<dyn OfferingStore>, slots: Arc<dyn SlotStore>) -> Self {
        Self { offerings, slots }
    }

    /// 由同时实现两个端口的后端构造
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: OfferingStore + SlotStore + 'static,
    {
        Self {
            offerings: backend.clone(),
            slots: backend,
        }
    }
}
