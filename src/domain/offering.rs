// ==========================================
// 家教平台排课引擎 - 课程领域模型
// ==========================================
// Offering = 教师发布的课程或私教课（草稿或已发布）
// 红线: 私教课 => student_upper_bound == 1
// 红线: 时段按锚点时间升序，has_slots() <=> slots 非空
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::slot::Slot;
use crate::domain::types::{OfferingKind, OfferingStatus};

// ==========================================
// TeacherIdentity - 已由鉴权层解析的教师身份
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeacherIdentity {
    pub teacher_id: String,
    pub verified: bool,
}

impl TeacherIdentity {
    pub fn new(teacher_id: impl Into<String>, verified: bool) -> Self {
        Self {
            teacher_id: teacher_id.into(),
            verified,
        }
    }
}

// ==========================================
// Offering - 课程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    // ===== 主键与归属 =====
    pub offering_id: String,       // 课程ID
    pub teacher_id: String,        // 所属教师

    // ===== 基本信息 =====
    pub title: String,             // 标题
    pub subject: String,           // 学科
    pub grade: String,             // 年级
    pub description: String,       // 描述
    pub duration_minutes: i32,     // 单次课时长（分钟）
    pub price: f64,                // 价格

    // ===== 类型与状态 =====
    pub kind: OfferingKind,        // 课程 / 私教课
    pub is_draft: bool,            // 草稿标志
    pub student_upper_bound: i32,  // 名额上限（私教课恒为 1）
    pub popularity: i64,           // 热度（每次报名 +1）
    pub price_recorded: bool,      // 价格是否已计入统计

    // ===== 时段（独占，级联删除） =====
    pub slots: Vec<Slot>,

    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Offering {
    /// 派生标志: 是否有时段
    pub fn has_slots(&self) -> bool {
        !self.slots.is_empty()
    }

    pub fn is_private(&self) -> bool {
        self.kind.is_private()
    }

    /// 派生状态（草稿 / 在售 / 无时段）
    pub fn status(&self) -> OfferingStatus {
        if self.is_draft {
            OfferingStatus::Draft
        } else if self.has_slots() {
            OfferingStatus::Active
        } else {
            OfferingStatus::Inactive
        }
    }

    /// 是否存在任何报名
    pub fn has_enrollments(&self) -> bool {
        self.slots.iter().any(|s| !s.is_empty())
    }

    pub fn find_slot(&self, slot_id: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.slot_id() == slot_id)
    }

    /// 时段是否按锚点升序
    pub fn slots_ordered(&self) -> bool {
        self.slots.windows(2).all(|w| w[0].anchor() <= w[1].anchor())
    }

    /// 每课时价格
    ///
    /// - 课程: price / (首个时段每周上课天数 * 周数)
    /// - 私教课: price
    /// - 无时段或除数为 0: None
    pub fn price_per_hour(&self) -> Option<f64> {
        let first = self.slots.first()?;
        match first {
            Slot::Course(c) => {
                let sessions = c.days.len() as u32 * c.week_length;
                if sessions == 0 {
                    None
                } else {
                    Some(self.price / f64::from(sessions))
                }
            }
            Slot::Lesson(_) => Some(self.price),
        }
    }

    /// 首个时段已报名人数（列表页展示用；私教课列表页固定为 0）
    pub fn enrolled_in_first_slot(&self) -> u32 {
        match self.slots.first() {
            Some(Slot::Course(c)) => c.enrolled_count(),
            _ => 0,
        }
    }
}
