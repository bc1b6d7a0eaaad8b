// ==========================================
// 库存台账导入 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 约束: 所有查询使用参数化
// ==========================================

pub mod error;
pub mod import_run_repo;
pub mod record_repo;

// 重导出核心仓储
pub use crate::domain::types::UpsertOutcome;
pub use error::{RepositoryError, RepositoryResult};
pub use import_run_repo::ImportRunRepository;
pub use record_repo::{RecordStore, SqliteRecordStore};
