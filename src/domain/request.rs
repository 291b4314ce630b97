// ==========================================
// 家教平台排课引擎 - 创建/编辑请求
// ==========================================
// 由外部服务层反序列化后传入；字段名与原有 JSON 接口保持一致（camelCase）
// ==========================================

use serde::{Deserialize, Serialize};

/// 课程创建/编辑请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OfferingRequest {
    pub title: String,
    pub subject: String,
    pub grade: String,
    pub description: String,
    /// 单次课时长（分钟）
    #[serde(alias = "length")]
    pub duration_minutes: i32,
    pub price: f64,
    #[serde(alias = "studentsUpperBound")]
    pub student_upper_bound: i32,
    /// 课程循环时段请求（仅课程使用）
    #[serde(alias = "courseTerminRequests")]
    pub course_slots: Vec<CourseSlotRequest>,
    /// 私教课时段请求（仅私教课使用）
    #[serde(alias = "privateLessonTermins")]
    pub lesson_slots: Vec<LessonSlotRequest>,
    pub themas: Vec<ThemaRequest>,
}

/// 课程循环时段请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CourseSlotRequest {
    /// 起始日期 YYYY-MM-DD
    pub start_date: String,
    /// 上课时刻 HH:MM
    #[serde(alias = "courseHours")]
    pub hour: String,
    /// 每周上课日编码 1..=7
    #[serde(alias = "courseDaysNumbers")]
    pub days_of_week: Vec<i32>,
    /// 持续周数
    pub week_length: i32,
}

/// 私教课时段请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LessonSlotRequest {
    /// 日期 YYYY-MM-DD
    pub date: String,
    /// 上课时刻 HH:MM
    #[serde(alias = "lessonHours")]
    pub hour: String,
}

/// 课题请求
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ThemaRequest {
    pub title: String,
    pub description: Option<String>,
}

impl ThemaRequest {
    pub fn new(title: impl Into<String>, description: Option<&str>) -> Self {
        Self {
            title: title.into(),
            description: description.map(str::to_string),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_field_names_deserialize() {
        let raw = r#"{
            "title": "Физика",
            "length": 60,
            "price": 120.5,
            "studentsUpperBound": 12,
            "courseTerminRequests": [
                {"startDate": "2026-05-04", "courseHours": "18:00", "courseDaysNumbers": [1, 3], "weekLength": 6}
            ],
            "themas": [{"title": "Кинематика"}]
        }"#;
        let req: OfferingRequest = serde_json::from_str(raw).unwrap();
        assert_eq!(req.duration_minutes, 60);
        assert_eq!(req.student_upper_bound, 12);
        assert_eq!(req.course_slots.len(), 1);
        assert_eq!(req.course_slots[0].days_of_week, vec![1, 3]);
        assert_eq!(req.course_slots[0].hour, "18:00");
        assert!(req.lesson_slots.is_empty());
        assert_eq!(req.themas[0].description, None);
    }
}
