// ==========================================
// 家教平台排课引擎 - 名额跟踪器
// ==========================================
// 职责: 初始化时段名额，执行单个时段的报名扣减
// 状态机: OPEN (places_remaining > 0) -> FULL (places_remaining == 0)
// 红线: FULL 为终态（无退课）；失败时时段不做任何修改
// ==========================================

use crate::domain::Slot;
use crate::engine::error::{SchedulingError, SchedulingResult};

/// 时段名额状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapacityState {
    Open,
    Full,
}

// ==========================================
// CapacityTracker - 名额跟踪器（无状态）
// ==========================================
#[derive(Debug, Clone, Copy, Default)]
pub struct CapacityTracker;

impl CapacityTracker {
    pub fn new() -> Self {
        Self
    }

    /// 初始化新时段的名额计数
    ///
    /// - 课程: places_remaining = student_upper_bound，清空名单
    /// - 私教课: 无学生
    pub fn initialize(&self, slot: &mut Slot) {
        match slot {
            Slot::Course(c) => {
                c.places_remaining = c.student_upper_bound;
                c.enrolled_students.clear();
            }
            Slot::Lesson(l) => {
                l.student = None;
            }
        }
        let places = slot.places_remaining();
        let header = slot.header_mut();
        header.is_full = places == 0;
        header.is_empty = true;
    }

    pub fn state(&self, slot: &Slot) -> CapacityState {
        if slot.places_remaining() == 0 {
            CapacityState::Full
        } else {
            CapacityState::Open
        }
    }

    /// 报名: 加入学生，名额 -1，同步满/空标志
    ///
    /// # 返回
    /// - `AlreadyEnrolled`: 该学生已在名单中
    /// - `CapacityExceeded`: 时段已满
    pub fn enroll(&self, slot: &mut Slot, student_id: &str) -> SchedulingResult<()> {
        if slot.is_enrolled(student_id) {
            return Err(SchedulingError::AlreadyEnrolled {
                slot_id: slot.slot_id().to_string(),
                student_id: student_id.to_string(),
            });
        }
        if self.state(slot) == CapacityState::Full {
            return Err(SchedulingError::CapacityExceeded {
                slot_id: slot.slot_id().to_string(),
            });
        }

        match slot {
            Slot::Course(c) => {
                c.enrolled_students.push(student_id.to_string());
                c.places_remaining -= 1;
            }
            Slot::Lesson(l) => {
                l.student = Some(student_id.to_string());
            }
        }

        let places = slot.places_remaining();
        let header = slot.header_mut();
        header.is_full = places == 0;
        header.is_empty = false;
        Ok(())
    }
}
