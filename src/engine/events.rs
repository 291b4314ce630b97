// ==========================================
// 家教平台排课引擎 - 引擎层事件发布
// ==========================================
// 职责: 定义课程事件发布 trait，实现依赖倒置
// 说明: 引擎在提交成功后发布事件，外部检索索引/缓存据此刷新
// 红线: 事件发布失败只记录告警，不回滚已提交的业务操作
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;

use crate::domain::OfferingKind;

// ==========================================
// 课程事件类型
// ==========================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferingEventType {
    /// 课程发布（创建即发布 / 草稿发布 / 编辑后保存为发布）
    Published,
    /// 课程编辑（含保存为草稿）
    Edited,
    /// 草稿删除
    DraftRemoved,
    /// 时段删除
    SlotRemoved,
    /// 学生报名
    StudentEnrolled,
}

impl OfferingEventType {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            OfferingEventType::Published => "Published",
            OfferingEventType::Edited => "Edited",
            OfferingEventType::DraftRemoved => "DraftRemoved",
            OfferingEventType::SlotRemoved => "SlotRemoved",
            OfferingEventType::StudentEnrolled => "StudentEnrolled",
        }
    }
}

/// 课程事件
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingEvent {
    /// 课程ID
    pub offering_id: String,
    /// 事件类型
    pub event_type: OfferingEventType,
    /// 课程类型（检索索引按类型分区）
    pub kind: OfferingKind,
    /// 受影响的时段（None 表示整个课程）
    pub slot_id: Option<String>,
    /// 报名学生（仅 StudentEnrolled）
    pub student_id: Option<String>,
    /// 发生时间
    pub occurred_at: NaiveDateTime,
}

impl OfferingEvent {
    /// 创建课程级事件
    pub fn offering_scope(offering_id: &str, kind: OfferingKind, event_type: OfferingEventType) -> Self {
        Self {
            offering_id: offering_id.to_string(),
            event_type,
            kind,
            slot_id: None,
            student_id: None,
            occurred_at: chrono::Local::now().naive_local(),
        }
    }

    /// 创建时段级事件
    pub fn slot_scope(
        offering_id: &str,
        kind: OfferingKind,
        event_type: OfferingEventType,
        slot_id: &str,
        student_id: Option<&str>,
    ) -> Self {
        Self {
            offering_id: offering_id.to_string(),
            event_type,
            kind,
            slot_id: Some(slot_id.to_string()),
            student_id: student_id.map(str::to_string),
            occurred_at: chrono::Local::now().naive_local(),
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 课程事件发布者 Trait
///
/// # 返回
/// - `Ok(task_id)`: 下游任务 ID（如果支持）或空字符串
/// - `Err`: 发布失败
pub trait OfferingEventPublisher: Send + Sync {
    fn publish(&self, event: OfferingEvent) -> Result<String, Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl OfferingEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: OfferingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - offering_id={}, event_type={}",
            event.offering_id,
            event.event_type.as_str()
        );
        Ok(String::new())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn OfferingEventPublisher>> 的使用
#[derive(Clone, Default)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn OfferingEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn OfferingEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件；失败只记录告警
    pub fn publish(&self, event: OfferingEvent) {
        let Some(publisher) = &self.inner else {
            tracing::debug!(
                "OptionalEventPublisher: 未配置发布者，跳过事件 - offering_id={}, event_type={}",
                event.offering_id,
                event.event_type.as_str()
            );
            return;
        };

        let offering_id = event.offering_id.clone();
        let event_type = event.event_type;
        if let Err(e) = publisher.publish(event) {
            tracing::warn!(
                offering_id = %offering_id,
                event_type = event_type.as_str(),
                error = %e,
                "课程事件发布失败"
            );
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct FailingPublisher {
        attempts: Mutex<u32>,
    }

    impl OfferingEventPublisher for FailingPublisher {
        fn publish(&self, _event: OfferingEvent) -> Result<String, Box<dyn Error + Send + Sync>> {
            *self.attempts.lock().unwrap() += 1;
            Err("index unavailable".into())
        }
    }

    #[test]
    fn test_slot_scope_event() {
        let event = OfferingEvent::slot_scope(
            "O1",
            OfferingKind::Course,
            OfferingEventType::StudentEnrolled,
            "S1",
            Some("student-7"),
        );
        assert_eq!(event.slot_id.as_deref(), Some("S1"));
        assert_eq!(event.student_id.as_deref(), Some("student-7"));
        assert_eq!(event.event_type.as_str(), "StudentEnrolled");
    }

    #[test]
    fn test_noop_publisher() {
        let event = OfferingEvent::offering_scope(
            "O1",
            OfferingKind::PrivateLesson,
            OfferingEventType::Published,
        );
        let result = NoOpEventPublisher.publish(event);
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish(OfferingEvent::offering_scope(
            "O1",
            OfferingKind::Course,
            OfferingEventType::Edited,
        ));
    }

    #[test]
    fn test_optional_publisher_swallows_failures() {
        let failing = Arc::new(FailingPublisher {
            attempts: Mutex::new(0),
        });
        let publisher = OptionalEventPublisher::with_publisher(failing.clone());
        assert!(publisher.is_configured());

        publisher.publish(OfferingEvent::offering_scope(
            "O1",
            OfferingKind::Course,
            OfferingEventType::DraftRemoved,
        ));
        assert_eq!(*failing.attempts.lock().unwrap(), 1);
    }
}
