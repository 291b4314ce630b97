// ==========================================
// 家教平台排课引擎 - 时段生成器
// ==========================================
// 职责: 将创建/编辑请求展开为有序、已校验的时段列表
// 输入: 课程循环请求 或 私教课 (日期, 时刻) 请求 + 课题
// 输出: 按锚点升序的 Slot 列表（同锚点保持输入顺序）
// 红线: 纯函数，全有或全无；名额初始化委托 CapacityTracker
// ==========================================

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::instrument;

use crate::domain::{
    CourseSlot, CourseSlotRequest, DayOfWeek, LessonSlot, LessonSlotRequest, OfferingKind,
    OfferingRequest, Slot, SlotHeader, Thema, ThemaRequest,
};
use crate::engine::capacity::CapacityTracker;
use crate::engine::error::{SchedulingError, SchedulingResult};

/// 生成选项
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// true: 所有课程时段共用同一组课题（同ID，编辑路径）
    /// false: 每个时段独立生成课题（新ID，创建路径）
    pub shared_topics: bool,
    /// true: 请求中没有任何时段时报错
    pub require_slots: bool,
}

impl BuildOptions {
    pub fn for_create() -> Self {
        Self {
            shared_topics: false,
            require_slots: false,
        }
    }

    pub fn for_edit() -> Self {
        Self {
            shared_topics: true,
            require_slots: false,
        }
    }
}

// 已校验的课题内容（尚未分配ID）
#[derive(Debug, Clone, PartialEq)]
struct TopicSpec {
    title: String,
    description: Option<String>,
}

impl TopicSpec {
    fn instantiate(&self) -> Thema {
        Thema::new(self.title.clone(), self.description.clone())
    }
}

// ==========================================
// ScheduleBuilder - 时段生成器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ScheduleBuilder {
    capacity: CapacityTracker,
}

impl ScheduleBuilder {
    pub fn new() -> Self {
        Self {
            capacity: CapacityTracker::new(),
        }
    }

    /// 生成时段
    ///
    /// # 参数
    /// - `offering_id`: 所属课程ID（写入时段回指）
    /// - `kind`: 课程 / 私教课，决定使用请求中的哪一组时段
    /// - `request`: 创建/编辑请求
    /// - `options`: 课题共享方式、是否要求至少一个时段
    ///
    /// # 返回
    /// - `Ok(Vec<Slot>)`: 按锚点升序的完整时段集合
    /// - `Err(InvalidInput)`: 任一时段或课题非法
    #[instrument(skip(self, request), fields(
        offering_id = %offering_id,
        kind = %kind,
        shared_topics = options.shared_topics
    ))]
    pub fn build(
        &self,
        offering_id: &str,
        kind: OfferingKind,
        request: &OfferingRequest,
        options: BuildOptions,
    ) -> SchedulingResult<Vec<Slot>> {
        let requested = match kind {
            OfferingKind::Course => request.course_slots.len(),
            OfferingKind::PrivateLesson => request.lesson_slots.len(),
        };
        if options.require_slots && requested == 0 {
            return Err(SchedulingError::invalid_input("validation.slots_missing"));
        }

        let topics = Self::validate_topics(&request.themas)?;

        let mut slots = match kind {
            OfferingKind::Course => {
                let upper = u32::try_from(request.student_upper_bound).unwrap_or(0);
                self.build_course_slots(
                    offering_id,
                    &request.course_slots,
                    upper,
                    &topics,
                    options.shared_topics,
                )?
            }
            OfferingKind::PrivateLesson => {
                self.build_lesson_slots(offering_id, &request.lesson_slots, topics.first())?
            }
        };

        // 稳定排序：同锚点保持输入顺序
        slots.sort_by_key(Slot::anchor);

        tracing::debug!(slot_count = slots.len(), topic_count = topics.len(), "时段生成完成");
        Ok(slots)
    }

    fn build_course_slots(
        &self,
        offering_id: &str,
        requests: &[CourseSlotRequest],
        student_upper_bound: u32,
        topics: &[TopicSpec],
        shared_topics: bool,
    ) -> SchedulingResult<Vec<Slot>> {
        let shared: Vec<Thema> = if shared_topics {
            topics.iter().map(TopicSpec::instantiate).collect()
        } else {
            Vec::new()
        };

        let mut slots = Vec::with_capacity(requests.len());
        for req in requests {
            let days = Self::decode_days(&req.days_of_week)?;
            if days.is_empty() {
                return Err(SchedulingError::invalid_input("schedule.days_empty"));
            }
            if req.week_length < 1 {
                return Err(SchedulingError::invalid_input_with(
                    "schedule.week_length_invalid",
                    &[("value", &req.week_length.to_string())],
                ));
            }
            let date = Self::parse_date(&req.start_date)?;
            let (time, hour_code) = Self::parse_hour(&req.hour)?;

            let themas = if shared_topics {
                shared.clone()
            } else {
                topics.iter().map(TopicSpec::instantiate).collect()
            };

            let mut slot = Slot::Course(CourseSlot {
                header: SlotHeader::new(offering_id, NaiveDateTime::new(date, time)),
                week_length: req.week_length.unsigned_abs(),
                course_days: Self::format_days(&days),
                days,
                hour_code,
                student_upper_bound,
                places_remaining: student_upper_bound,
                enrolled_students: Vec::new(),
                themas,
            });
            self.capacity.initialize(&mut slot);
            slots.push(slot);
        }
        Ok(slots)
    }

    fn build_lesson_slots(
        &self,
        offering_id: &str,
        requests: &[LessonSlotRequest],
        topic: Option<&TopicSpec>,
    ) -> SchedulingResult<Vec<Slot>> {
        let mut slots = Vec::with_capacity(requests.len());
        for req in requests {
            let date = Self::parse_date(&req.date)?;
            let (time, hour_code) = Self::parse_hour(&req.hour)?;

            let mut slot = Slot::Lesson(LessonSlot {
                header: SlotHeader::new(offering_id, NaiveDateTime::new(date, time)),
                hour_code,
                student: None,
                thema: topic.map(TopicSpec::instantiate),
            });
            self.capacity.initialize(&mut slot);
            slots.push(slot);
        }
        Ok(slots)
    }

    /// 解码星期编码（1=周一），重复编码只保留首次出现
    pub fn decode_days(codes: &[i32]) -> SchedulingResult<Vec<DayOfWeek>> {
        let mut days: Vec<DayOfWeek> = Vec::with_capacity(codes.len());
        for &code in codes {
            let day = DayOfWeek::from_code(code).ok_or_else(|| {
                SchedulingError::invalid_input_with(
                    "schedule.day_out_of_range",
                    &[("value", &code.to_string())],
                )
            })?;
            if !days.contains(&day) {
                days.push(day);
            }
        }
        Ok(days)
    }

    /// 上课日展示串，如 "Ponedelnik, Srqda, Petuk"
    pub fn format_days(days: &[DayOfWeek]) -> String {
        days.iter()
            .map(DayOfWeek::canonical_name)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 解析 "HH:MM"，返回 (时刻, 时刻编码)；"09:30" -> 930
    pub fn parse_hour(raw: &str) -> SchedulingResult<(NaiveTime, i32)> {
        let time = NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|_| {
            SchedulingError::invalid_input_with("schedule.malformed_hour", &[("value", raw)])
        })?;
        let code = (time.hour() * 100 + time.minute()) as i32;
        Ok((time, code))
    }

    /// 解析 "YYYY-MM-DD"
    pub fn parse_date(raw: &str) -> SchedulingResult<NaiveDate> {
        NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
            SchedulingError::invalid_input_with("schedule.malformed_date", &[("value", raw)])
        })
    }

    // 课题校验: 标题必填；(标题, 描述) 相同的课题合并
    fn validate_topics(themas: &[ThemaRequest]) -> SchedulingResult<Vec<TopicSpec>> {
        let mut specs: Vec<TopicSpec> = Vec::with_capacity(themas.len());
        for thema in themas {
            let title = thema.title.trim();
            if title.is_empty() {
                return Err(SchedulingError::invalid_input("schedule.thema_title_missing"));
            }
            let spec = TopicSpec {
                title: title.to_string(),
                description: thema
                    .description
                    .as_deref()
                    .map(str::trim)
                    .filter(|d| !d.is_empty())
                    .map(str::to_string),
            };
            if !specs.contains(&spec) {
                specs.push(spec);
            }
        }
        Ok(specs)
    }
}
