// ==========================================
// 家教平台排课引擎 - 课程仓储 (SQLite)
// ==========================================
// 表: offering（时段经 slot_repo 辅助函数读写）
// 保存: 课程行 UPSERT + 时段全量替换，单事务
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};
use tracing::instrument;

use crate::domain::{Offering, OfferingKind};
use crate::engine::ports::OfferingStore;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::slot_repo::{
    insert_slots, load_slots_for_offering, parse_datetime, DATETIME_FORMAT,
};

const OFFERING_COLUMNS: &str = "offering_id, teacher_id, title, subject, grade, description, \
     duration_minutes, price, kind, is_draft, student_upper_bound, popularity, price_recorded, \
     created_at, updated_at";

// ==========================================
// OfferingRepository - 课程仓储
// ==========================================
pub struct OfferingRepository {
    conn: Arc<Mutex<Connection>>,
}

impl OfferingRepository {
    /// 创建新的OfferingRepository实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 映射课程行（不含时段）
    fn map_row(&self, row: &rusqlite::Row) -> rusqlite::Result<Offering> {
        let kind: String = row.get(8)?;
        let created_at: String = row.get(13)?;
        let updated_at: String = row.get(14)?;
        Ok(Offering {
            offering_id: row.get(0)?,
            teacher_id: row.get(1)?,
            title: row.get(2)?,
            subject: row.get(3)?,
            grade: row.get(4)?,
            description: row.get(5)?,
            duration_minutes: row.get(6)?,
            price: row.get(7)?,
            kind: OfferingKind::parse(&kind),
            is_draft: row.get(9)?,
            student_upper_bound: row.get(10)?,
            popularity: row.get(11)?,
            price_recorded: row.get(12)?,
            slots: Vec::new(),
            created_at: parse_datetime(13, &created_at)?,
            updated_at: parse_datetime(14, &updated_at)?,
        })
    }

    // 按条件查询课程并补齐时段
    fn query_offerings(
        &self,
        conn: &Connection,
        sql: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<Offering>> {
        let mut offerings = {
            let mut stmt = conn.prepare(sql)?;
            let rows = stmt
                .query_map(args, |row| self.map_row(row))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        for offering in offerings.iter_mut() {
            offering.slots = load_slots_for_offering(conn, &offering.offering_id)?;
        }
        Ok(offerings)
    }

    fn list_distinct(&self, column: &str) -> RepositoryResult<Vec<String>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT DISTINCT {col} FROM offering WHERE {col} <> '' ORDER BY {col}",
            col = column
        );
        let mut stmt = conn.prepare(&sql)?;
        let values = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(values)
    }
}

impl OfferingStore for OfferingRepository {
    fn find_offering(&self, offering_id: &str) -> RepositoryResult<Option<Offering>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM offering WHERE offering_id = ?",
            OFFERING_COLUMNS
        );
        let offering = conn
            .query_row(&sql, params![offering_id], |row| self.map_row(row))
            .optional()?;

        match offering {
            Some(mut offering) => {
                offering.slots = load_slots_for_offering(&conn, offering_id)?;
                Ok(Some(offering))
            }
            None => Ok(None),
        }
    }

    /// 保存课程
    ///
    /// 旧时段经外键级联删除（课题、报名随之删除），再按当前集合重建。
    /// 已有课程的 popularity 不被覆盖，只由 commit_enrollment 递增
    #[instrument(skip(self, offering), fields(offering_id = %offering.offering_id, slots = offering.slots.len()))]
    fn save_offering(&self, offering: &Offering) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO offering (
                offering_id, teacher_id, title, subject, grade, description,
                duration_minutes, price, kind, is_draft, student_upper_bound,
                popularity, price_recorded, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(offering_id) DO UPDATE SET
                teacher_id = excluded.teacher_id,
                title = excluded.title,
                subject = excluded.subject,
                grade = excluded.grade,
                description = excluded.description,
                duration_minutes = excluded.duration_minutes,
                price = excluded.price,
                kind = excluded.kind,
                is_draft = excluded.is_draft,
                student_upper_bound = excluded.student_upper_bound,
                price_recorded = excluded.price_recorded,
                updated_at = excluded.updated_at"#,
            params![
                &offering.offering_id,
                &offering.teacher_id,
                &offering.title,
                &offering.subject,
                &offering.grade,
                &offering.description,
                offering.duration_minutes,
                offering.price,
                offering.kind.to_db_str(),
                offering.is_draft,
                offering.student_upper_bound,
                offering.popularity,
                offering.price_recorded,
                &offering.created_at.format(DATETIME_FORMAT).to_string(),
                &offering.updated_at.format(DATETIME_FORMAT).to_string(),
            ],
        )?;

        tx.execute(
            "DELETE FROM slot WHERE offering_id = ?",
            params![&offering.offering_id],
        )?;
        insert_slots(&tx, &offering.slots)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        tracing::debug!("课程已保存");
        Ok(())
    }

    fn delete_offering(&self, offering_id: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let rows_affected = conn.execute(
            "DELETE FROM offering WHERE offering_id = ?",
            params![offering_id],
        )?;
        if rows_affected == 0 {
            return Err(RepositoryError::not_found("offering", offering_id));
        }
        Ok(())
    }

    fn find_by_teacher(&self, teacher_id: &str) -> RepositoryResult<Vec<Offering>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM offering WHERE teacher_id = ? ORDER BY created_at, offering_id",
            OFFERING_COLUMNS
        );
        self.query_offerings(&conn, &sql, &[&teacher_id])
    }

    fn find_most_popular(&self, limit: usize) -> RepositoryResult<Vec<Offering>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM offering WHERE is_draft = 0 \
             AND EXISTS (SELECT 1 FROM slot s WHERE s.offering_id = offering.offering_id) \
             ORDER BY popularity DESC, offering_id LIMIT ?",
            OFFERING_COLUMNS
        );
        let limit = limit as i64;
        self.query_offerings(&conn, &sql, &[&limit])
    }

    fn list_subjects(&self) -> RepositoryResult<Vec<String>> {
        self.list_distinct("subject")
    }

    fn list_grades(&self) -> RepositoryResult<Vec<String>> {
        self.list_distinct("grade")
    }
}
