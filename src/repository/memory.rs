// ==========================================
// 家教平台排课引擎 - 内存存储
// ==========================================
// 同时实现 OfferingStore / SlotStore，语义与 SQLite 实现一致
// 用途: 单元测试、无数据库的嵌入场景
// ==========================================

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::{Offering, Slot};
use crate::engine::ports::{OfferingStore, SlotStore};
use crate::repository::error::{RepositoryError, RepositoryResult};

/// 内存存储（课程独占其时段）
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    offerings: Arc<Mutex<HashMap<String, Offering>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> RepositoryResult<MutexGuard<'_, HashMap<String, Offering>>> {
        self.offerings
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 当前课程数
    pub fn offering_count(&self) -> RepositoryResult<usize> {
        Ok(self.guard()?.len())
    }

    fn list_distinct<F>(&self, field: F) -> RepositoryResult<Vec<String>>
    where
        F: Fn(&Offering) -> &str,
    {
        let offerings = self.guard()?;
        let values: BTreeSet<String> = offerings
            .values()
            .map(|o| field(o))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();
        Ok(values.into_iter().collect())
    }
}

impl OfferingStore for InMemoryStore {
    fn find_offering(&self, offering_id: &str) -> RepositoryResult<Option<Offering>> {
        Ok(self.guard()?.get(offering_id).cloned())
    }

    fn save_offering(&self, offering: &Offering) -> RepositoryResult<()> {
        let mut offerings = self.guard()?;
        let mut stored = offering.clone();
        // 热度只由 commit_enrollment 递增
        if let Some(existing) = offerings.get(&offering.offering_id) {
            stored.popularity = existing.popularity;
        }
        offerings.insert(stored.offering_id.clone(), stored);
        Ok(())
    }

    fn delete_offering(&self, offering_id: &str) -> RepositoryResult<()> {
        match self.guard()?.remove(offering_id) {
            Some(_) => Ok(()),
            None => Err(RepositoryError::not_found("offering", offering_id)),
        }
    }

    fn find_by_teacher(&self, teacher_id: &str) -> RepositoryResult<Vec<Offering>> {
        let mut found: Vec<Offering> = self
            .guard()?
            .values()
            .filter(|o| o.teacher_id == teacher_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.offering_id.cmp(&b.offering_id))
        });
        Ok(found)
    }

    fn find_most_popular(&self, limit: usize) -> RepositoryResult<Vec<Offering>> {
        let mut found: Vec<Offering> = self
            .guard()?
            .values()
            .filter(|o| !o.is_draft && o.has_slots())
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.popularity
                .cmp(&a.popularity)
                .then_with(|| a.offering_id.cmp(&b.offering_id))
        });
        found.truncate(limit);
        Ok(found)
    }

    fn list_subjects(&self) -> RepositoryResult<Vec<String>> {
        self.list_distinct(|o| o.subject.as_str())
    }

    fn list_grades(&self) -> RepositoryResult<Vec<String>> {
        self.list_distinct(|o| o.grade.as_str())
    }
}

impl SlotStore for InMemoryStore {
    fn find_slot(&self, slot_id: &str) -> RepositoryResult<Option<Slot>> {
        Ok(self
            .guard()?
            .values()
            .flat_map(|o| o.slots.iter())
            .find(|s| s.slot_id() == slot_id)
            .cloned())
    }

    fn commit_enrollment(
        &self,
        slot: &Slot,
        _student_id: &str,
        expected_revision: i32,
    ) -> RepositoryResult<()> {
        let mut offerings = self.guard()?;
        let offering = offerings
            .get_mut(slot.offering_id())
            .ok_or_else(|| RepositoryError::not_found("slot", slot.slot_id()))?;
        let stored = offering
            .slots
            .iter_mut()
            .find(|s| s.slot_id() == slot.slot_id())
            .ok_or_else(|| RepositoryError::not_found("slot", slot.slot_id()))?;

        let actual = stored.header().revision;
        if actual != expected_revision {
            return Err(RepositoryError::OptimisticLockFailure {
                entity_id: slot.slot_id().to_string(),
                expected: expected_revision,
                actual,
            });
        }

        *stored = slot.clone();
        stored.header_mut().revision = actual + 1;
        offering.popularity += 1;
        Ok(())
    }

    fn delete_slot(&self, slot_id: &str) -> RepositoryResult<()> {
        let mut offerings = self.guard()?;
        for offering in offerings.values_mut() {
            if let Some(pos) = offering.slots.iter().position(|s| s.slot_id() == slot_id) {
                if !offering.slots[pos].is_empty() {
                    return Err(RepositoryError::SlotOccupied {
                        slot_id: slot_id.to_string(),
                    });
                }
                offering.slots.remove(pos);
                return Ok(());
            }
        }
        Err(RepositoryError::not_found("slot", slot_id))
    }
}
