// ==========================================
// 库存台账导入 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 表格文件 → 校验 → 落库（按标识去重）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 导入层 - 文件解析与行校验
pub mod importer;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 调用方接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

pub use domain::{
    CellValue, ImportBatch, ImportReport, ImportRun, RawRow, Record, RowError, RowErrorKind, RunContext,
};
pub use importer::{ImportError, ImportResult, ImportSchema, TabularRecordImporter};
pub use repository::{RecordStore, SqliteRecordStore, UpsertOutcome};
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "库存台账导入";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
