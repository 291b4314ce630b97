// ==========================================
// 家教平台排课引擎 - 时段仓储 (SQLite)
// ==========================================
// 表: slot / thema / slot_enrollment
// 并发: commit_enrollment 使用 revision 乐观锁
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::domain::{CourseSlot, DayOfWeek, LessonSlot, OfferingKind, Slot, SlotHeader, Thema};
use crate::engine::ports::SlotStore;
use crate::repository::error::{RepositoryError, RepositoryResult};

pub(crate) const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SLOT_COLUMNS: &str = "slot_id, offering_id, variant, anchor, hour_code, is_full, is_empty, \
     revision, week_length, day_codes, course_days, student_upper_bound, places_remaining";

pub(crate) fn parse_datetime(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, DATETIME_FORMAT).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

// 时段主行（课题、报名名单另行加载）
struct SlotRow {
    header: SlotHeader,
    variant: OfferingKind,
    hour_code: i32,
    week_length: Option<u32>,
    day_codes: Option<String>,
    course_days: Option<String>,
    student_upper_bound: u32,
    places_remaining: u32,
}

fn map_slot_row(row: &rusqlite::Row) -> rusqlite::Result<SlotRow> {
    let anchor: String = row.get(3)?;
    let variant: String = row.get(2)?;
    Ok(SlotRow {
        header: SlotHeader {
            slot_id: row.get(0)?,
            offering_id: row.get(1)?,
            anchor: parse_datetime(3, &anchor)?,
            is_full: row.get(5)?,
            is_empty: row.get(6)?,
            revision: row.get(7)?,
        },
        variant: OfferingKind::parse(&variant),
        hour_code: row.get(4)?,
        week_length: row.get(8)?,
        day_codes: row.get(9)?,
        course_days: row.get(10)?,
        student_upper_bound: row.get(11)?,
        places_remaining: row.get(12)?,
    })
}

fn decode_day_codes(raw: &str) -> Vec<DayOfWeek> {
    raw.split(',')
        .filter_map(|s| s.trim().parse::<i32>().ok())
        .filter_map(DayOfWeek::from_code)
        .collect()
}

fn encode_day_codes(days: &[DayOfWeek]) -> String {
    days.iter()
        .map(|d| d.code().to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn load_themas(conn: &Connection, slot_id: &str) -> RepositoryResult<Vec<Thema>> {
    let mut stmt = conn.prepare(
        "SELECT thema_id, title, description, link_to_recording, presentation
         FROM thema WHERE slot_id = ? ORDER BY seq",
    )?;
    let themas = stmt
        .query_map(params![slot_id], |row| {
            Ok(Thema {
                thema_id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                link_to_recording: row.get(3)?,
                presentation: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(themas)
}

fn load_students(conn: &Connection, slot_id: &str) -> RepositoryResult<Vec<String>> {
    let mut stmt =
        conn.prepare("SELECT student_id FROM slot_enrollment WHERE slot_id = ? ORDER BY seq")?;
    let students = stmt
        .query_map(params![slot_id], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(students)
}

fn assemble(conn: &Connection, row: SlotRow) -> RepositoryResult<Slot> {
    let mut themas = load_themas(conn, &row.header.slot_id)?;
    let mut students = load_students(conn, &row.header.slot_id)?;

    let slot = match row.variant {
        OfferingKind::Course => {
            let days = row.day_codes.as_deref().map(decode_day_codes).unwrap_or_default();
            Slot::Course(CourseSlot {
                header: row.header,
                week_length: row.week_length.unwrap_or(0),
                days,
                course_days: row.course_days.unwrap_or_default(),
                hour_code: row.hour_code,
                student_upper_bound: row.student_upper_bound,
                places_remaining: row.places_remaining,
                enrolled_students: students,
                themas,
            })
        }
        OfferingKind::PrivateLesson => Slot::Lesson(LessonSlot {
            header: row.header,
            hour_code: row.hour_code,
            student: students.drain(..).next(),
            thema: themas.drain(..).next(),
        }),
    };
    Ok(slot)
}

/// 读取单个时段（含课题与报名名单）
pub(crate) fn load_slot(conn: &Connection, slot_id: &str) -> RepositoryResult<Option<Slot>> {
    let sql = format!("SELECT {} FROM slot WHERE slot_id = ?", SLOT_COLUMNS);
    let row = conn.query_row(&sql, params![slot_id], map_slot_row).optional()?;
    match row {
        Some(row) => Ok(Some(assemble(conn, row)?)),
        None => Ok(None),
    }
}

/// 读取课程的全部时段（按写入顺序，即锚点升序）
pub(crate) fn load_slots_for_offering(
    conn: &Connection,
    offering_id: &str,
) -> RepositoryResult<Vec<Slot>> {
    let sql = format!(
        "SELECT {} FROM slot WHERE offering_id = ? ORDER BY seq",
        SLOT_COLUMNS
    );
    let rows = {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![offering_id], map_slot_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };
    rows.into_iter().map(|row| assemble(conn, row)).collect()
}

/// 写入课程的时段集合（调用方负责事务与旧时段清理）
pub(crate) fn insert_slots(conn: &Connection, slots: &[Slot]) -> RepositoryResult<()> {
    for (seq, slot) in slots.iter().enumerate() {
        let header = slot.header();
        let (week_length, day_codes, course_days) = match slot {
            Slot::Course(c) => (
                Some(c.week_length),
                Some(encode_day_codes(&c.days)),
                Some(c.course_days.clone()),
            ),
            Slot::Lesson(_) => (None, None, None),
        };

        conn.execute(
            r#"INSERT INTO slot (
                slot_id, offering_id, variant, seq, anchor, hour_code,
                is_full, is_empty, revision, week_length, day_codes, course_days,
                student_upper_bound, places_remaining
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &header.slot_id,
                &header.offering_id,
                slot.kind().to_db_str(),
                seq as i64,
                &header.anchor.format(DATETIME_FORMAT).to_string(),
                slot.hour_code(),
                header.is_full,
                header.is_empty,
                header.revision,
                week_length,
                day_codes,
                course_days,
                slot.capacity(),
                slot.places_remaining(),
            ],
        )?;

        let themas: Vec<&Thema> = match slot {
            Slot::Course(c) => c.themas.iter().collect(),
            Slot::Lesson(l) => l.thema.iter().collect(),
        };
        for (thema_seq, thema) in themas.into_iter().enumerate() {
            conn.execute(
                r#"INSERT INTO thema (
                    thema_id, slot_id, seq, title, description, link_to_recording, presentation
                ) VALUES (?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &thema.thema_id,
                    &header.slot_id,
                    thema_seq as i64,
                    &thema.title,
                    &thema.description,
                    &thema.link_to_recording,
                    &thema.presentation,
                ],
            )?;
        }

        for (student_seq, student_id) in slot.enrolled_students().iter().enumerate() {
            conn.execute(
                "INSERT INTO slot_enrollment (slot_id, student_id, seq) VALUES (?, ?, ?)",
                params![&header.slot_id, student_id, student_seq as i64],
            )?;
        }
    }
    Ok(())
}

// ==========================================
// SlotRepository - 时段仓储
// ==========================================
pub struct SlotRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SlotRepository {
    /// 创建新的SlotRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }
}

impl SlotStore for SlotRepository {
    fn find_slot(&self, slot_id: &str) -> RepositoryResult<Option<Slot>> {
        let conn = self.get_conn()?;
        load_slot(&conn, slot_id)
    }

    /// 提交报名 (带乐观锁检查)
    ///
    /// # 并发控制
    /// `UPDATE ... WHERE revision = ?` 影响 0 行时区分记录不存在与 revision 冲突
    fn commit_enrollment(
        &self,
        slot: &Slot,
        student_id: &str,
        expected_revision: i32,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        let header = slot.header();

        let rows_affected = tx.execute(
            r#"UPDATE slot
               SET places_remaining = ?, is_full = ?, is_empty = ?, revision = revision + 1
               WHERE slot_id = ? AND revision = ?"#,
            params![
                slot.places_remaining(),
                header.is_full,
                header.is_empty,
                &header.slot_id,
                expected_revision,
            ],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在还是revision冲突
            let actual: Option<i32> = tx
                .query_row(
                    "SELECT revision FROM slot WHERE slot_id = ?",
                    params![&header.slot_id],
                    |row| row.get(0),
                )
                .optional()?;
            return Err(match actual {
                Some(actual) => RepositoryError::OptimisticLockFailure {
                    entity_id: header.slot_id.clone(),
                    expected: expected_revision,
                    actual,
                },
                None => RepositoryError::not_found("slot", &header.slot_id),
            });
        }

        tx.execute(
            r#"INSERT INTO slot_enrollment (slot_id, student_id, seq)
               VALUES (?, ?, (SELECT COUNT(*) FROM slot_enrollment WHERE slot_id = ?))"#,
            params![&header.slot_id, student_id, &header.slot_id],
        )?;

        tx.execute(
            "UPDATE offering SET popularity = popularity + 1 WHERE offering_id = ?",
            params![&header.offering_id],
        )?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(())
    }

    /// 删除空时段
    ///
    /// 条件删除：只删 is_empty = 1 的行，检查与删除在同一条语句内完成
    fn delete_slot(&self, slot_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM slot WHERE slot_id = ? AND is_empty = 1",
            params![slot_id],
        )?;
        if rows_affected == 0 {
            let exists = conn
                .query_row(
                    "SELECT 1 FROM slot WHERE slot_id = ?",
                    params![slot_id],
                    |_| Ok(()),
                )
                .optional()?
                .is_some();
            return Err(if exists {
                tracing::warn!(slot_id = %slot_id, "时段已有报名，拒绝删除");
                RepositoryError::SlotOccupied {
                    slot_id: slot_id.to_string(),
                }
            } else {
                RepositoryError::not_found("slot", slot_id)
            });
        }
        Ok(())
    }
}
