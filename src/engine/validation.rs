// ==========================================
// 家教平台排课引擎 - 发布校验
// ==========================================
// 发布谓词按固定顺序检查，只报告第一个失败项:
// 1 标题 2 时长 3 描述 4 学科 5 时段 6 价格 7 年级 8 名额上限
// 编辑守卫: 非草稿编辑时，拒绝"请求与现有数据同时为空"的字段
// ==========================================

use crate::domain::{Offering, OfferingKind, OfferingRequest};
use crate::engine::error::{SchedulingError, SchedulingResult};

/// 发布校验项（按检查顺序）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishCheck {
    Title,
    Duration,
    Description,
    Subject,
    Slots,
    Price,
    Grade,
    StudentUpperBound,
}

impl PublishCheck {
    pub const ORDER: [PublishCheck; 8] = [
        PublishCheck::Title,
        PublishCheck::Duration,
        PublishCheck::Description,
        PublishCheck::Subject,
        PublishCheck::Slots,
        PublishCheck::Price,
        PublishCheck::Grade,
        PublishCheck::StudentUpperBound,
    ];

    pub fn message_key(&self) -> &'static str {
        match self {
            PublishCheck::Title => "validation.title_missing",
            PublishCheck::Duration => "validation.duration_too_short",
            PublishCheck::Description => "validation.description_missing",
            PublishCheck::Subject => "validation.subject_missing",
            PublishCheck::Slots => "validation.slots_missing",
            PublishCheck::Price => "validation.price_missing",
            PublishCheck::Grade => "validation.grade_missing",
            PublishCheck::StudentUpperBound => "validation.upper_bound_missing",
        }
    }

    fn passes(&self, offering: &Offering, min_duration_minutes: i32) -> bool {
        match self {
            PublishCheck::Title => !offering.title.trim().is_empty(),
            PublishCheck::Duration => offering.duration_minutes >= min_duration_minutes,
            PublishCheck::Description => !offering.description.trim().is_empty(),
            PublishCheck::Subject => !offering.subject.trim().is_empty(),
            PublishCheck::Slots => offering.has_slots(),
            PublishCheck::Price => offering.price.is_finite() && offering.price > 0.0,
            PublishCheck::Grade => !offering.grade.trim().is_empty(),
            PublishCheck::StudentUpperBound => offering.student_upper_bound > 0,
        }
    }
}

/// 返回第一个未通过的校验项
pub fn first_failed_check(offering: &Offering, min_duration_minutes: i32) -> Option<PublishCheck> {
    PublishCheck::ORDER
        .into_iter()
        .find(|check| !check.passes(offering, min_duration_minutes))
}

/// 发布谓词
///
/// # 返回
/// - `Err(InvalidInput)`: 携带第一个失败项的本地化消息
pub fn validate_for_publish(offering: &Offering, min_duration_minutes: i32) -> SchedulingResult<()> {
    match first_failed_check(offering, min_duration_minutes) {
        None => Ok(()),
        Some(check) => {
            tracing::warn!(
                offering_id = %offering.offering_id,
                check = ?check,
                "发布校验未通过"
            );
            Err(SchedulingError::invalid_input(check.message_key()))
        }
    }
}

/// 非草稿编辑守卫
///
/// 拒绝以下任一情况: 请求无时段且课程原本无时段；标题、描述为空且原值也为空；价格为 0 且原价也为 0
pub fn check_edit_guard(
    existing: &Offering,
    request: &OfferingRequest,
    kind: OfferingKind,
) -> SchedulingResult<()> {
    let requested_slots = match kind {
        OfferingKind::Course => request.course_slots.len(),
        OfferingKind::PrivateLesson => request.lesson_slots.len(),
    };

    let violation = (requested_slots == 0 && !existing.has_slots())
        || (existing.title.trim().is_empty() && request.title.trim().is_empty())
        || (existing.description.trim().is_empty() && request.description.trim().is_empty())
        || (existing.price == 0.0 && request.price == 0.0);

    if violation {
        tracing::warn!(offering_id = %existing.offering_id, "编辑请求被守卫拒绝");
        return Err(SchedulingError::invalid_input("validation.unallowed_change"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LessonSlot, Slot, SlotHeader};
    use chrono::NaiveDate;

    fn complete() -> Offering {
        let anchor = NaiveDate::from_ymd_opt(2026, 7, 1)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        Offering {
            offering_id: "O1".to_string(),
            teacher_id: "T1".to_string(),
            title: "Химия".to_string(),
            subject: "Chemistry".to_string(),
            grade: "10".to_string(),
            description: "Органична химия".to_string(),
            duration_minutes: 60,
            price: 50.0,
            kind: OfferingKind::PrivateLesson,
            is_draft: true,
            student_upper_bound: 1,
            popularity: 0,
            price_recorded: false,
            slots: vec![Slot::Lesson(LessonSlot {
                header: SlotHeader::new("O1", anchor),
                hour_code: 1000,
                student: None,
                thema: None,
            })],
            created_at: anchor,
            updated_at: anchor,
        }
    }

    #[test]
    fn test_complete_offering_passes() {
        assert!(validate_for_publish(&complete(), 30).is_ok());
        assert_eq!(first_failed_check(&complete(), 30), None);
    }

    #[test]
    fn test_each_missing_field_is_detected() {
        let cases: Vec<(PublishCheck, Box<dyn Fn(&mut Offering)>)> = vec![
            (PublishCheck::Title, Box::new(|o: &mut Offering| o.title.clear())),
            (PublishCheck::Duration, Box::new(|o: &mut Offering| o.duration_minutes = 29)),
            (PublishCheck::Description, Box::new(|o: &mut Offering| o.description.clear())),
            (PublishCheck::Subject, Box::new(|o: &mut Offering| o.subject.clear())),
            (PublishCheck::Slots, Box::new(|o: &mut Offering| o.slots.clear())),
            (PublishCheck::Price, Box::new(|o: &mut Offering| o.price = 0.0)),
            (PublishCheck::Grade, Box::new(|o: &mut Offering| o.grade.clear())),
            (PublishCheck::StudentUpperBound, Box::new(|o: &mut Offering| o.student_upper_bound = 0)),
        ];
        for (expected, mutate) in cases {
            let mut offering = complete();
            mutate(&mut offering);
            assert_eq!(first_failed_check(&offering, 30), Some(expected));
            assert!(matches!(
                validate_for_publish(&offering, 30),
                Err(SchedulingError::InvalidInput(_))
            ));
        }
    }

    #[test]
    fn test_non_finite_price_rejected() {
        for price in [f64::INFINITY, f64::NAN, -1.0] {
            let mut offering = complete();
            offering.price = price;
            assert_eq!(first_failed_check(&offering, 30), Some(PublishCheck::Price));
        }
    }

    #[test]
    fn test_first_failure_wins() {
        let mut offering = complete();
        offering.grade.clear();
        offering.title.clear();
        assert_eq!(first_failed_check(&offering, 30), Some(PublishCheck::Title));
    }

    #[test]
    fn test_duration_boundary_follows_config() {
        let mut offering = complete();
        offering.duration_minutes = 30;
        assert!(validate_for_publish(&offering, 30).is_ok());
        assert_eq!(first_failed_check(&offering, 45), Some(PublishCheck::Duration));
    }

    #[test]
    fn test_edit_guard() {
        let mut existing = complete();
        let request = OfferingRequest {
            title: "Нов".to_string(),
            description: "Ново".to_string(),
            price: 10.0,
            ..Default::default()
        };
        // 原有时段存在，请求可以不带时段
        assert!(check_edit_guard(&existing, &request, OfferingKind::PrivateLesson).is_ok());

        existing.slots.clear();
        assert!(check_edit_guard(&existing, &request, OfferingKind::PrivateLesson).is_err());

        let mut existing = complete();
        existing.price = 0.0;
        let free = OfferingRequest {
            price: 0.0,
            ..request.clone()
        };
        assert!(check_edit_guard(&existing, &free, OfferingKind::PrivateLesson).is_err());
    }
}
