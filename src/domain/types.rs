// ==========================================
// 家教平台排课引擎 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 课程类型 (Offering Kind)
// ==========================================
// 课程: 多学生、按周循环; 私教课: 单学生、单次
// 价格统计也按此分两类独立累计
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferingKind {
    Course,       // 课程
    PrivateLesson, // 私教课
}

impl OfferingKind {
    /// 由 isPrivate 标志得到类型
    pub fn from_private_flag(is_private: bool) -> Self {
        if is_private {
            OfferingKind::PrivateLesson
        } else {
            OfferingKind::Course
        }
    }

    pub fn is_private(&self) -> bool {
        matches!(self, OfferingKind::PrivateLesson)
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            OfferingKind::Course => "COURSE",
            OfferingKind::PrivateLesson => "PRIVATE_LESSON",
        }
    }

    /// 从数据库字符串解析（未知值按课程处理）
    pub fn parse(s: &str) -> Self {
        match s.trim().to_uppercase().as_str() {
            "PRIVATE_LESSON" => OfferingKind::PrivateLesson,
            _ => OfferingKind::Course,
        }
    }
}

impl fmt::Display for OfferingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

// ==========================================
// 课程状态 (Offering Status)
// ==========================================
// 派生状态，不落库:
// - Draft: 草稿
// - Active: 已发布且有时段
// - Inactive: 已发布但时段已全部移除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferingStatus {
    Draft,
    Active,
    Inactive,
}

impl OfferingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferingStatus::Draft => "DRAFT",
            OfferingStatus::Active => "ACTIVE",
            OfferingStatus::Inactive => "INACTIVE",
        }
    }

    /// 解析状态字符串；"ALL" 或无法识别时返回 None（即不过滤）
    pub fn parse_filter(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "DRAFT" => Some(OfferingStatus::Draft),
            "ACTIVE" => Some(OfferingStatus::Active),
            "INACTIVE" => Some(OfferingStatus::Inactive),
            _ => None,
        }
    }
}

impl fmt::Display for OfferingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 星期 (Day Of Week)
// ==========================================
// 编码: 1=周一 ... 7=周日
// 显示名沿用平台既有的拉丁转写，不做本地化
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    /// 从 1..=7 编码解析，越界返回 None
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(DayOfWeek::Monday),
            2 => Some(DayOfWeek::Tuesday),
            3 => Some(DayOfWeek::Wednesday),
            4 => Some(DayOfWeek::Thursday),
            5 => Some(DayOfWeek::Friday),
            6 => Some(DayOfWeek::Saturday),
            7 => Some(DayOfWeek::Sunday),
            _ => None,
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            DayOfWeek::Monday => 1,
            DayOfWeek::Tuesday => 2,
            DayOfWeek::Wednesday => 3,
            DayOfWeek::Thursday => 4,
            DayOfWeek::Friday => 5,
            DayOfWeek::Saturday => 6,
            DayOfWeek::Sunday => 7,
        }
    }

    /// 平台展示用的规范名称
    pub fn canonical_name(&self) -> &'static str {
        match self {
            DayOfWeek::Monday => "Ponedelnik",
            DayOfWeek::Tuesday => "Vtornik",
            DayOfWeek::Wednesday => "Srqda",
            DayOfWeek::Thursday => "Chetvurtuk",
            DayOfWeek::Friday => "Petuk",
            DayOfWeek::Saturday => "Subota",
            DayOfWeek::Sunday => "Nedelq",
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl From<DayOfWeek> for chrono::Weekday {
    fn from(day: DayOfWeek) -> Self {
        match day {
            DayOfWeek::Monday => chrono::Weekday::Mon,
            DayOfWeek::Tuesday => chrono::Weekday::Tue,
            DayOfWeek::Wednesday => chrono::Weekday::Wed,
            DayOfWeek::Thursday => chrono::Weekday::Thu,
            DayOfWeek::Friday => chrono::Weekday::Fri,
            DayOfWeek::Saturday => chrono::Weekday::Sat,
            DayOfWeek::Sunday => chrono::Weekday::Sun,
        }
    }
}
