// ==========================================
// 家教平台排课引擎 - 发布工作流
// ==========================================
// 状态机: DRAFT -> VALIDATING -> PUBLISHED
//         EDITING 重新进入 VALIDATING；校验失败时课程保持原状
// 流程: 身份/归属检查 -> 生成候选（含时段） -> 校验 -> 单次提交 -> 价格统计 -> 事件
// 红线: 先完整校验再提交；提交失败不更新价格统计
// ==========================================

use std::sync::Arc;

use chrono::{Local, NaiveDateTime};
use tracing::instrument;

use crate::config::SchedulingConfig;
use crate::domain::{
    Offering, OfferingKind, OfferingRequest, OfferingStatus, Slot, TeacherIdentity,
};
use crate::engine::error::{SchedulingError, SchedulingResult};
use crate::engine::events::{OfferingEvent, OfferingEventType, OptionalEventPublisher};
use crate::engine::ports::SchedulingStores;
use crate::engine::price_stats::PriceStatisticsRegistry;
use crate::engine::schedule_builder::{BuildOptions, ScheduleBuilder};
use crate::engine::validation::{check_edit_guard, validate_for_publish};

/// 课程生命周期阶段（用于状态转换日志与错误）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleStage {
    Draft,
    Editing,
    Validating,
    Published,
    Removed,
}

impl LifecycleStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleStage::Draft => "DRAFT",
            LifecycleStage::Editing => "EDITING",
            LifecycleStage::Validating => "VALIDATING",
            LifecycleStage::Published => "PUBLISHED",
            LifecycleStage::Removed => "REMOVED",
        }
    }

    fn of(offering: &Offering) -> Self {
        if offering.is_draft {
            LifecycleStage::Draft
        } else {
            LifecycleStage::Published
        }
    }
}

fn invalid_transition(from: LifecycleStage, to: LifecycleStage) -> SchedulingError {
    SchedulingError::InvalidStateTransition {
        from: from.as_str().to_string(),
        to: to.as_str().to_string(),
    }
}

// 私教课名额恒为 1
fn effective_upper_bound(kind: OfferingKind, request: &OfferingRequest) -> i32 {
    match kind {
        OfferingKind::Course => request.student_upper_bound,
        OfferingKind::PrivateLesson => 1,
    }
}

// ==========================================
// PublishWorkflow - 发布工作流
// ==========================================
pub struct PublishWorkflow {
    stores: SchedulingStores,
    builder: ScheduleBuilder,
    price_stats: Arc<PriceStatisticsRegistry>,
    events: OptionalEventPublisher,
    config: SchedulingConfig,
}

impl PublishWorkflow {
    pub fn new(
        stores: SchedulingStores,
        price_stats: Arc<PriceStatisticsRegistry>,
        config: SchedulingConfig,
    ) -> Self {
        Self {
            stores,
            builder: ScheduleBuilder::new(),
            price_stats,
            events: OptionalEventPublisher::none(),
            config,
        }
    }

    /// 配置事件发布者
    pub fn with_event_publisher(mut self, events: OptionalEventPublisher) -> Self {
        self.events = events;
        self
    }

    /// 创建课程
    ///
    /// # 参数
    /// - `teacher`: 已鉴权的教师（必须已认证）
    /// - `request`: 创建请求
    /// - `is_draft`: true 保存为草稿（不校验）；false 创建即发布（完整校验）
    /// - `kind`: 课程 / 私教课
    ///
    /// # 返回
    /// - `Ok(Offering)`: 已保存的课程
    #[instrument(skip(self, teacher, request), fields(teacher_id = %teacher.teacher_id, kind = %kind))]
    pub fn create(
        &self,
        teacher: &TeacherIdentity,
        request: &OfferingRequest,
        is_draft: bool,
        kind: OfferingKind,
    ) -> SchedulingResult<Offering> {
        if !teacher.verified {
            tracing::warn!("未认证教师尝试创建课程");
            return Err(SchedulingError::unverified());
        }

        let offering_id = uuid::Uuid::new_v4().to_string();
        let slots = self
            .builder
            .build(&offering_id, kind, request, BuildOptions::for_create())?;

        let created_at = now();
        let mut offering = Offering {
            offering_id,
            teacher_id: teacher.teacher_id.clone(),
            title: request.title.clone(),
            subject: request.subject.clone(),
            grade: request.grade.clone(),
            description: request.description.clone(),
            duration_minutes: request.duration_minutes,
            price: request.price,
            kind,
            is_draft,
            student_upper_bound: effective_upper_bound(kind, request),
            popularity: 0,
            price_recorded: false,
            slots,
            created_at,
            updated_at: created_at,
        };

        if !is_draft {
            self.validate(&offering, LifecycleStage::Draft)?;
        }
        self.commit(&mut offering, LifecycleStage::Draft)?;
        Ok(offering)
    }

    /// 编辑课程（全量重建时段，课题在各时段间共享）
    ///
    /// 校验全部通过后才提交；任何失败都不修改已存储的课程
    #[instrument(skip(self, teacher, request), fields(teacher_id = %teacher.teacher_id, offering_id = %offering_id, kind = %kind))]
    pub fn edit(
        &self,
        teacher: &TeacherIdentity,
        offering_id: &str,
        request: &OfferingRequest,
        is_draft: bool,
        kind: OfferingKind,
    ) -> SchedulingResult<Offering> {
        if !teacher.verified {
            tracing::warn!("未认证教师尝试编辑课程");
            return Err(SchedulingError::unverified());
        }
        let existing = self.load_owned(teacher, offering_id)?;

        if !is_draft {
            check_edit_guard(&existing, request, kind)?;
        }

        let slots = self
            .builder
            .build(&existing.offering_id, kind, request, BuildOptions::for_edit())?;

        let mut candidate = Offering {
            offering_id: existing.offering_id.clone(),
            teacher_id: existing.teacher_id.clone(),
            title: request.title.clone(),
            subject: request.subject.clone(),
            grade: request.grade.clone(),
            description: request.description.clone(),
            duration_minutes: request.duration_minutes,
            price: request.price,
            kind,
            is_draft,
            student_upper_bound: effective_upper_bound(kind, request),
            popularity: existing.popularity,
            price_recorded: existing.price_recorded,
            slots,
            created_at: existing.created_at,
            updated_at: now(),
        };

        if !is_draft {
            self.validate(&candidate, LifecycleStage::Editing)?;
        }

        let dropped: u32 = existing.slots.iter().map(Slot::enrolled_count).sum();
        if dropped > 0 {
            // TODO: 编辑时按锚点匹配保留已有报名，需先为时段引入稳定的业务键
            tracing::warn!(
                offering_id = %existing.offering_id,
                dropped_enrollments = dropped,
                "编辑重建时段，已有报名随旧时段一并移除"
            );
        }

        self.commit(&mut candidate, LifecycleStage::Editing)?;
        if is_draft {
            self.events.publish(OfferingEvent::offering_scope(
                &candidate.offering_id,
                candidate.kind,
                OfferingEventType::Edited,
            ));
        }
        Ok(candidate)
    }

    /// 发布草稿
    #[instrument(skip(self, teacher), fields(teacher_id = %teacher.teacher_id, offering_id = %offering_id))]
    pub fn publish(&self, teacher: &TeacherIdentity, offering_id: &str) -> SchedulingResult<Offering> {
        let existing = self.load_owned(teacher, offering_id)?;
        if !existing.is_draft {
            tracing::warn!("课程已发布，拒绝重复发布");
            return Err(invalid_transition(
                LifecycleStage::Published,
                LifecycleStage::Published,
            ));
        }

        let mut candidate = existing;
        candidate.is_draft = false;
        self.validate(&candidate, LifecycleStage::Draft)?;
        candidate.updated_at = now();

        self.commit(&mut candidate, LifecycleStage::Draft)?;
        Ok(candidate)
    }

    /// 删除草稿（级联删除时段）；不回滚价格统计
    #[instrument(skip(self, teacher), fields(teacher_id = %teacher.teacher_id, offering_id = %offering_id))]
    pub fn remove_draft(&self, teacher: &TeacherIdentity, offering_id: &str) -> SchedulingResult<()> {
        let existing = self.load_owned(teacher, offering_id)?;
        if !existing.is_draft {
            return Err(invalid_transition(
                LifecycleStage::Published,
                LifecycleStage::Removed,
            ));
        }
        if let Some(occupied) = existing.slots.iter().find(|s| !s.is_empty()) {
            return Err(SchedulingError::SlotNotEmpty {
                slot_id: occupied.slot_id().to_string(),
            });
        }

        self.stores.offerings.delete_offering(&existing.offering_id)?;
        tracing::info!(
            from = LifecycleStage::Draft.as_str(),
            to = LifecycleStage::Removed.as_str(),
            "草稿已删除"
        );
        self.events.publish(OfferingEvent::offering_scope(
            &existing.offering_id,
            existing.kind,
            OfferingEventType::DraftRemoved,
        ));
        Ok(())
    }

    /// 删除单个空时段
    ///
    /// # 返回
    /// - `Ok(Offering)`: 删除后的课程
    /// - `SlotNotEmpty`: 时段已有报名（存储层条件删除再次确认）
    #[instrument(skip(self, teacher), fields(teacher_id = %teacher.teacher_id, offering_id = %offering_id, slot_id = %slot_id))]
    pub fn remove_slot(
        &self,
        teacher: &TeacherIdentity,
        offering_id: &str,
        slot_id: &str,
    ) -> SchedulingResult<Offering> {
        let mut offering = self.load_owned(teacher, offering_id)?;
        let slot = offering
            .find_slot(slot_id)
            .ok_or_else(|| SchedulingError::not_found("slot", slot_id))?;
        if !slot.is_empty() {
            tracing::warn!("时段已有报名，拒绝删除");
            return Err(SchedulingError::SlotNotEmpty {
                slot_id: slot_id.to_string(),
            });
        }

        self.stores.slots.delete_slot(slot_id)?;
        offering.slots.retain(|s| s.slot_id() != slot_id);
        tracing::info!(remaining_slots = offering.slots.len(), "时段已删除");

        self.events.publish(OfferingEvent::slot_scope(
            &offering.offering_id,
            offering.kind,
            OfferingEventType::SlotRemoved,
            slot_id,
            None,
        ));
        Ok(offering)
    }

    /// 教师自己的课程列表
    ///
    /// # 参数
    /// - `status`: None 表示全部
    /// - `kind`: None 表示课程与私教课都返回
    pub fn teacher_offerings(
        &self,
        teacher: &TeacherIdentity,
        status: Option<OfferingStatus>,
        kind: Option<OfferingKind>,
    ) -> SchedulingResult<Vec<Offering>> {
        let offerings = self.stores.offerings.find_by_teacher(&teacher.teacher_id)?;
        Ok(offerings
            .into_iter()
            .filter(|o| status.map_or(true, |s| o.status() == s))
            .filter(|o| kind.map_or(true, |k| o.kind == k))
            .collect())
    }

    // ===== 内部 =====

    fn load_owned(&self, teacher: &TeacherIdentity, offering_id: &str) -> SchedulingResult<Offering> {
        let offering = self
            .stores
            .offerings
            .find_offering(offering_id)?
            .ok_or_else(|| SchedulingError::not_found("offering", offering_id))?;
        if offering.teacher_id != teacher.teacher_id {
            tracing::warn!(owner = %offering.teacher_id, "非课程所有者的操作被拒绝");
            return Err(SchedulingError::ownership());
        }
        Ok(offering)
    }

    fn validate(&self, candidate: &Offering, from: LifecycleStage) -> SchedulingResult<()> {
        tracing::debug!(
            offering_id = %candidate.offering_id,
            from = from.as_str(),
            to = LifecycleStage::Validating.as_str(),
            "进入发布校验"
        );
        validate_for_publish(candidate, self.config.min_duration_minutes)
    }

    // 保存候选课程；发布状态下按配置计入价格统计并发布事件
    fn commit(&self, offering: &mut Offering, from: LifecycleStage) -> SchedulingResult<()> {
        let published = !offering.is_draft;
        let record_price =
            published && (self.config.record_price_on_republish || !offering.price_recorded);
        if record_price {
            offering.price_recorded = true;
        }

        self.stores.offerings.save_offering(offering)?;

        if published {
            if record_price {
                self.price_stats.record(offering.kind, offering.price);
            }
            tracing::info!(
                offering_id = %offering.offering_id,
                from = from.as_str(),
                to = LifecycleStage::Published.as_str(),
                slot_count = offering.slots.len(),
                price_recorded = record_price,
                "课程已发布"
            );
            self.events.publish(OfferingEvent::offering_scope(
                &offering.offering_id,
                offering.kind,
                OfferingEventType::Published,
            ));
        } else {
            tracing::info!(
                offering_id = %offering.offering_id,
                stage = LifecycleStage::of(offering).as_str(),
                "草稿已保存"
            );
        }
        Ok(())
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
