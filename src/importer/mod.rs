// ==========================================
// 库存台账导入 - 导入层
// ==========================================
// 职责: 外部表格数据 → 校验后的库存记录
// 支持: Excel, CSV, 已解析的行
// ==========================================

// 模块声明
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod record_importer;
pub mod schema;
pub mod stock_importer_impl;
pub mod stock_importer_trait;

// 重导出核心类型
pub use conflict_handler::ConflictHandler;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper as FieldMapperImpl;
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use record_importer::{ImporterOptions, TabularRecordImporter};
pub use schema::{ColumnSpec, ImportSchema};
pub use stock_importer_impl::StockImporterImpl;

// 重导出 Trait 接口
pub use stock_importer_trait::{DataCleaner, FieldMapper, FileParser, ImportOutcome, StockImporter};
