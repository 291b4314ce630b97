// ==========================================
// 家教平台排课引擎 - 时段领域模型
// ==========================================
// 时段 (Slot) 是可报名的最小单位:
// - CourseSlot: 课程的一个循环锚点（起始日 + 每周上课日 + 周数）
// - LessonSlot: 私教课的一次具体上课时间
// 两者共享 SlotHeader，按变体标签分派，不走继承
// ==========================================
// 红线: 0 <= places_remaining <= student_upper_bound
// 红线: is_full <=> places_remaining == 0
// 红线: is_empty <=> 已报名人数 == 0
// ==========================================

use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{DayOfWeek, OfferingKind};

// ==========================================
// Thema - 课题段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thema {
    pub thema_id: String,
    pub title: String,
    pub description: Option<String>,
    pub link_to_recording: Option<String>,
    pub presentation: Option<String>,
}

impl Thema {
    /// 新建课题（生成新ID）
    pub fn new(title: impl Into<String>, description: Option<String>) -> Self {
        Self {
            thema_id: uuid::Uuid::new_v4().to_string(),
            title: title.into(),
            description,
            link_to_recording: None,
            presentation: None,
        }
    }
}

// ==========================================
// SlotHeader - 时段公共头
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotHeader {
    pub slot_id: String,          // 时段ID
    pub offering_id: String,      // 所属课程（仅回指，不拥有）
    pub anchor: NaiveDateTime,    // 锚点时间（首次上课）
    pub is_full: bool,            // 派生: 名额已满
    pub is_empty: bool,           // 派生: 无人报名
    pub revision: i32,            // 乐观锁：每次报名提交 +1
}

impl SlotHeader {
    pub fn new(offering_id: &str, anchor: NaiveDateTime) -> Self {
        Self {
            slot_id: uuid::Uuid::new_v4().to_string(),
            offering_id: offering_id.to_string(),
            anchor,
            is_full: false,
            is_empty: true,
            revision: 0,
        }
    }
}

// ==========================================
// CourseSlot - 课程时段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSlot {
    pub header: SlotHeader,
    pub week_length: u32,             // 持续周数
    pub days: Vec<DayOfWeek>,         // 每周上课日（去重，保持输入顺序）
    pub course_days: String,          // 上课日展示串 "Ponedelnik, Srqda"
    pub hour_code: i32,               // 上课时刻编码 "09:30" -> 930
    pub student_upper_bound: u32,     // 名额上限
    pub places_remaining: u32,        // 剩余名额
    pub enrolled_students: Vec<String>, // 已报名学生（唯一，按报名顺序）
    pub themas: Vec<Thema>,           // 课题列表（有序）
}

impl CourseSlot {
    /// 课程结束日期 = 锚点日期 + 周数 * 7 天
    pub fn end_date(&self) -> NaiveDate {
        self.header.anchor.date() + Duration::days(i64::from(self.week_length) * 7)
    }

    /// 已报名人数（由名额反推，与列表长度一致）
    pub fn enrolled_count(&self) -> u32 {
        self.student_upper_bound.saturating_sub(self.places_remaining)
    }
}

// ==========================================
// LessonSlot - 私教课时段
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonSlot {
    pub header: SlotHeader,
    pub hour_code: i32,               // 上课时刻编码
    pub student: Option<String>,      // 报名学生（0 或 1 个）
    pub thema: Option<Thema>,         // 课题（最多一个）
}

// ==========================================
// Slot - 时段（带标签的变体）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Slot {
    Course(CourseSlot),
    Lesson(LessonSlot),
}

impl Slot {
    pub fn header(&self) -> &SlotHeader {
        match self {
            Slot::Course(c) => &c.header,
            Slot::Lesson(l) => &l.header,
        }
    }

    pub fn header_mut(&mut self) -> &mut SlotHeader {
        match self {
            Slot::Course(c) => &mut c.header,
            Slot::Lesson(l) => &mut l.header,
        }
    }

    pub fn slot_id(&self) -> &str {
        &self.header().slot_id
    }

    pub fn offering_id(&self) -> &str {
        &self.header().offering_id
    }

    pub fn anchor(&self) -> NaiveDateTime {
        self.header().anchor
    }

    pub fn kind(&self) -> OfferingKind {
        match self {
            Slot::Course(_) => OfferingKind::Course,
            Slot::Lesson(_) => OfferingKind::PrivateLesson,
        }
    }

    pub fn is_full(&self) -> bool {
        self.header().is_full
    }

    pub fn is_empty(&self) -> bool {
        self.header().is_empty
    }

    /// 名额上限（私教课恒为 1）
    pub fn capacity(&self) -> u32 {
        match self {
            Slot::Course(c) => c.student_upper_bound,
            Slot::Lesson(_) => 1,
        }
    }

    /// 剩余名额
    pub fn places_remaining(&self) -> u32 {
        match self {
            Slot::Course(c) => c.places_remaining,
            Slot::Lesson(l) => u32::from(l.student.is_none()),
        }
    }

    pub fn enrolled_count(&self) -> u32 {
        self.capacity().saturating_sub(self.places_remaining())
    }

    pub fn is_enrolled(&self, student_id: &str) -> bool {
        match self {
            Slot::Course(c) => c.enrolled_students.iter().any(|s| s == student_id),
            Slot::Lesson(l) => l.student.as_deref() == Some(student_id),
        }
    }

    /// 已报名学生列表
    pub fn enrolled_students(&self) -> Vec<String> {
        match self {
            Slot::Course(c) => c.enrolled_students.clone(),
            Slot::Lesson(l) => l.student.iter().cloned().collect(),
        }
    }

    pub fn hour_code(&self) -> i32 {
        match self {
            Slot::Course(c) => c.hour_code,
            Slot::Lesson(l) => l.hour_code,
        }
    }

    /// 单次课结束时间 = 锚点 + 课时长度
    pub fn end_time(&self, duration_minutes: i32) -> NaiveDateTime {
        self.anchor() + Duration::minutes(i64::from(duration_minutes.max(0)))
    }

    pub fn as_course(&self) -> Option<&CourseSlot> {
        match self {
            Slot::Course(c) => Some(c),
            Slot::Lesson(_) => None,
        }
    }

    pub fn as_lesson(&self) -> Option<&LessonSlot> {
        match self {
            Slot::Lesson(l) => Some(l),
            Slot::Course(_) => None,
        }
    }

    /// 名额不变式检查
    ///
    /// # 返回
    /// - `true`: 名额区间、满/空标志均与计数一致
    pub fn invariants_hold(&self) -> bool {
        let places_in_range = self.places_remaining() <= self.capacity();
        let full_consistent = self.is_full() == (self.places_remaining() == 0);
        let empty_consistent = self.is_empty() == (self.enrolled_count() == 0);
        let roster_consistent = match self {
            Slot::Course(c) => c.enrolled_students.len() as u32 == c.enrolled_count(),
            Slot::Lesson(_) => true,
        };
        places_in_range && full_consistent && empty_consistent && roster_consistent
    }
}
