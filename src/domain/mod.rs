// ==========================================
// 库存台账导入 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑
// ==========================================

pub mod import_run;
pub mod record;
pub mod types;

// 重导出核心类型
pub use import_run::{ImportReport, ImportRun, RunContext};
pub use record::{CellValue, ImportBatch, RawRow, Record, RowError, RowErrorKind};
pub use types::{RecordField, UpsertOutcome};
