// ==========================================
// 家教平台排课引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 实现 engine::ports 中的存储端口，屏蔽数据库细节
// 约束: 所有查询使用参数化，防止 SQL 注入
// ==========================================

pub mod error;
pub mod memory;
pub mod offering_repo;
pub mod slot_repo;

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::engine::ports::SchedulingStores;

// 重导出核心仓储
pub use error::{RepositoryError, RepositoryResult};
pub use memory::InMemoryStore;
pub use offering_repo::OfferingRepository;
pub use slot_repo::SlotRepository;

/// 以共享 SQLite 连接构造引擎存储集合
pub fn sqlite_stores(conn: Arc<Mutex<Connection>>) -> SchedulingStores {
    SchedulingStores::new(
        Arc::new(OfferingRepository::new(conn.clone())),
        Arc::new(SlotRepository::new(conn)),
    )
}
