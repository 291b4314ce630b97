// ==========================================
// 家教平台排课引擎 - 报名服务
// ==========================================
// 流程: 进程内时段锁 -> 读取时段 -> CapacityTracker 扣减 -> 带 revision 提交 -> 事件
// 并发: 同一时段的 检查-扣减-提交 在进程内串行；跨进程由存储的 revision 乐观锁兜底
//       时段锁按需创建，无人持有时即回收
// 红线: 不做内部重试；冲突以 ConcurrentModification 上抛
// ==========================================

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::engine::capacity::CapacityTracker;
use crate::engine::error::{SchedulingError, SchedulingResult};
use crate::engine::events::{OfferingEvent, OfferingEventType, OptionalEventPublisher};
use crate::engine::ports::SchedulingStores;
use crate::repository::error::RepositoryError;

/// 报名结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrollmentReceipt {
    pub offering_id: String,
    pub slot_id: String,
    pub student_id: String,
    pub places_remaining: u32,
    pub is_full: bool,
    pub revision: i32,
}

// ==========================================
// EnrollmentService - 报名服务
// ==========================================
pub struct EnrollmentService {
    stores: SchedulingStores,
    capacity: CapacityTracker,
    slot_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    events: OptionalEventPublisher,
}

impl EnrollmentService {
    pub fn new(stores: SchedulingStores) -> Self {
        Self {
            stores,
            capacity: CapacityTracker::new(),
            slot_locks: Mutex::new(HashMap::new()),
            events: OptionalEventPublisher::none(),
        }
    }

    /// 配置事件发布者
    pub fn with_event_publisher(mut self, events: OptionalEventPublisher) -> Self {
        self.events = events;
        self
    }

    // 按时段ID取锁（不存在则创建）
    fn slot_lock(&self, slot_id: &str) -> SchedulingResult<Arc<Mutex<()>>> {
        let mut locks = self
            .slot_locks
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))?;
        Ok(locks
            .entry(slot_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone())
    }

    // 归还时段锁；最后一个持有者负责从表中移除
    // 句柄在表锁内释放，取锁也只在表锁内进行，引用计数检查不会漏判
    fn release_slot_lock(&self, slot_id: &str, lock: Arc<Mutex<()>>) {
        match self.slot_locks.lock() {
            Ok(mut locks) => {
                drop(lock);
                let idle = locks
                    .get(slot_id)
                    .map_or(false, |entry| Arc::strong_count(entry) == 1);
                if idle {
                    locks.remove(slot_id);
                }
            }
            Err(e) => tracing::warn!(error = %e, "时段锁表不可用，跳过回收"),
        }
    }

    #[cfg(test)]
    fn tracked_slot_locks(&self) -> usize {
        self.slot_locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    /// 学生报名某课程的某个时段
    ///
    /// # 返回
    /// - `Ok(EnrollmentReceipt)`: 报名成功后的名额状态
    /// - `NotFound`: 课程或时段不存在，或时段不属于该课程
    /// - `InvalidStateTransition`: 课程仍是草稿
    /// - `AlreadyEnrolled` / `CapacityExceeded`: 名额规则拒绝
    /// - `ConcurrentModification`: 其他进程已先提交
    #[instrument(skip(self), fields(student_id = %student_id, offering_id = %offering_id, slot_id = %slot_id))]
    pub fn enroll(
        &self,
        student_id: &str,
        offering_id: &str,
        slot_id: &str,
    ) -> SchedulingResult<EnrollmentReceipt> {
        let lock = self.slot_lock(slot_id)?;
        let result = match lock.lock() {
            Ok(_guard) => self.enroll_locked(student_id, offering_id, slot_id),
            Err(e) => Err(RepositoryError::LockError(e.to_string()).into()),
        };
        self.release_slot_lock(slot_id, lock);
        result
    }

    // 已持有时段锁：检查 -> 扣减 -> 提交
    fn enroll_locked(
        &self,
        student_id: &str,
        offering_id: &str,
        slot_id: &str,
    ) -> SchedulingResult<EnrollmentReceipt> {
        let offering = self
            .stores
            .offerings
            .find_offering(offering_id)?
            .ok_or_else(|| SchedulingError::not_found("offering", offering_id))?;
        if offering.is_draft {
            tracing::warn!("草稿课程不接受报名");
            return Err(SchedulingError::InvalidStateTransition {
                from: "DRAFT".to_string(),
                to: "ENROLLED".to_string(),
            });
        }

        let mut slot = self
            .stores
            .slots
            .find_slot(slot_id)?
            .filter(|s| s.offering_id() == offering_id)
            .ok_or_else(|| SchedulingError::not_found("slot", slot_id))?;

        let expected_revision = slot.header().revision;
        if let Err(e) = self.capacity.enroll(&mut slot, student_id) {
            tracing::warn!(error = %e, "报名被拒绝");
            return Err(e);
        }

        self.stores
            .slots
            .commit_enrollment(&slot, student_id, expected_revision)?;
        slot.header_mut().revision = expected_revision + 1;

        tracing::info!(
            places_remaining = slot.places_remaining(),
            is_full = slot.is_full(),
            "报名成功"
        );
        self.events.publish(OfferingEvent::slot_scope(
            offering_id,
            offering.kind,
            OfferingEventType::StudentEnrolled,
            slot_id,
            Some(student_id),
        ));

        Ok(EnrollmentReceipt {
            offering_id: offering_id.to_string(),
            slot_id: slot_id.to_string(),
            student_id: student_id.to_string(),
            places_remaining: slot.places_remaining(),
            is_full: slot.is_full(),
            revision: slot.header().revision,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CourseSlot, Offering, OfferingKind, Slot, SlotHeader};
    use crate::engine::ports::OfferingStore;
    use crate::repository::memory::InMemoryStore;
    use chrono::NaiveDate;
    use std::thread;

    fn published_course(places: u32) -> Offering {
        let anchor = NaiveDate::from_ymd_opt(2026, 11, 2)
            .and_then(|d| d.and_hms_opt(17, 30, 0))
            .unwrap();
        let mut header = SlotHeader::new("o1", anchor);
        header.slot_id = "o1-slot".to_string();
        Offering {
            offering_id: "o1".to_string(),
            teacher_id: "t1".to_string(),
            title: "Algebra".to_string(),
            subject: "Math".to_string(),
            grade: "8".to_string(),
            description: "d".to_string(),
            duration_minutes: 60,
            price: 80.0,
            kind: OfferingKind::Course,
            is_draft: false,
            student_upper_bound: places as i32,
            popularity: 0,
            price_recorded: true,
            slots: vec![Slot::Course(CourseSlot {
                header,
                days: vec![],
                course_days: String::new(),
                hour_code: 1730,
                week_length: 1,
                student_upper_bound: places,
                places_remaining: places,
                enrolled_students: vec![],
                themas: vec![],
            })],
            created_at: anchor,
            updated_at: anchor,
        }
    }

    fn service_with(offering: &Offering) -> EnrollmentService {
        let store = Arc::new(InMemoryStore::new());
        store.save_offering(offering).unwrap();
        EnrollmentService::new(SchedulingStores::from_backend(store))
    }

    #[test]
    fn test_slot_lock_released_after_enroll() {
        let service = service_with(&published_course(1));

        service.enroll("s1", "o1", "o1-slot").unwrap();
        assert_eq!(service.tracked_slot_locks(), 0);

        // 失败路径同样归还
        let err = service.enroll("s2", "o1", "o1-slot").unwrap_err();
        assert!(matches!(err, SchedulingError::CapacityExceeded { .. }));
        let err = service.enroll("s3", "o1", "missing-slot").unwrap_err();
        assert!(matches!(err, SchedulingError::NotFound { .. }));
        assert_eq!(service.tracked_slot_locks(), 0);
    }

    #[test]
    fn test_slot_locks_drained_after_concurrent_enrollments() {
        let service = Arc::new(service_with(&published_course(4)));
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let service = service.clone();
                thread::spawn(move || service.enroll(&format!("s{}", i), "o1", "o1-slot"))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|r| r.is_ok())
            .count();

        assert_eq!(winners, 4);
        assert_eq!(service.tracked_slot_locks(), 0);
    }
}
