// ==========================================
// 家教平台排课引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、写入
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::scheduling_config::{LogFormat, SchedulingConfig};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};

const GLOBAL_SCOPE: &str = "global";

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 会对传入连接再次应用统一 PRAGMA（幂等）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> RepositoryResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key, value, "配置已更新");
        Ok(())
    }

    /// 获取 global 配置快照（键升序）
    pub fn get_config_snapshot(&self) -> RepositoryResult<BTreeMap<String, String>> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    // ===== 排课配置 =====

    /// 加载排课配置
    ///
    /// # 返回
    /// - 缺省键使用默认值
    /// - `FieldValueError`: 值无法解析
    pub fn load_scheduling_config(&self) -> RepositoryResult<SchedulingConfig> {
        let defaults = SchedulingConfig::default();

        let raw = self.get_config_or_default(
            config_keys::MIN_DURATION_MINUTES,
            &defaults.min_duration_minutes.to_string(),
        )?;
        let min_duration_minutes = raw.trim().parse::<i32>().map_err(|_| {
            RepositoryError::field_value(config_keys::MIN_DURATION_MINUTES, format!("非整数: {}", raw))
        })?;

        let raw = self.get_config_or_default(
            config_keys::RECORD_PRICE_ON_REPUBLISH,
            &defaults.record_price_on_republish.to_string(),
        )?;
        let record_price_on_republish = parse_bool(&raw).ok_or_else(|| {
            RepositoryError::field_value(
                config_keys::RECORD_PRICE_ON_REPUBLISH,
                format!("非布尔值: {}", raw),
            )
        })?;

        let locale = self.get_config_or_default(config_keys::LOCALE, &defaults.locale)?;
        if crate::i18n::SupportedLocale::parse(&locale).is_none() {
            return Err(RepositoryError::field_value(
                config_keys::LOCALE,
                format!("不支持的语言: {}", locale),
            ));
        }

        let raw = self.get_config_or_default(config_keys::LOG_FORMAT, "pretty")?;
        let log_format = LogFormat::parse(&raw).ok_or_else(|| {
            RepositoryError::field_value(config_keys::LOG_FORMAT, format!("未知日志格式: {}", raw))
        })?;

        Ok(SchedulingConfig {
            min_duration_minutes,
            record_price_on_republish,
            locale,
            log_format,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const MIN_DURATION_MINUTES: &str = "scheduling.min_duration_minutes";
    pub const RECORD_PRICE_ON_REPUBLISH: &str = "scheduling.record_price_on_republish";
    pub const LOCALE: &str = "scheduling.locale";
    pub const LOG_FORMAT: &str = "scheduling.log_format";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::ensure_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let mgr = manager();
        assert_eq!(mgr.load_scheduling_config().unwrap(), SchedulingConfig::default());
    }

    #[test]
    fn test_overrides_are_applied() {
        let mgr = manager();
        mgr.set_config_value(config_keys::MIN_DURATION_MINUTES, "45").unwrap();
        mgr.set_config_value(config_keys::RECORD_PRICE_ON_REPUBLISH, "false").unwrap();
        mgr.set_config_value(config_keys::LOG_FORMAT, "json").unwrap();

        let cfg = mgr.load_scheduling_config().unwrap();
        assert_eq!(cfg.min_duration_minutes, 45);
        assert!(!cfg.record_price_on_republish);
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert_eq!(mgr.get_config_snapshot().unwrap().len(), 3);
    }

    #[test]
    fn test_malformed_value_is_reported() {
        let mgr = manager();
        mgr.set_config_value(config_keys::MIN_DURATION_MINUTES, "half an hour").unwrap();
        let err = mgr.load_scheduling_config().unwrap_err();
        assert!(matches!(
            err,
            RepositoryError::FieldValueError { ref field, .. } if field == config_keys::MIN_DURATION_MINUTES
        ));
    }
}
