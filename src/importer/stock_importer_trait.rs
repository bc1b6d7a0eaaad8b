// ==========================================
// 库存台账导入 - 导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// ==========================================

use crate::domain::import_run::{ImportRun, RunContext};
use crate::domain::record::{CellValue, RawRow, Record, RowErrorKind};
use crate::domain::types::UpsertOutcome;
use crate::importer::conflict_handler::split_by_outcome;
use crate::importer::error::ImportResult;
use crate::importer::schema::{ColumnSpec, ImportSchema};
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// StockImporter Trait
// ==========================================
// 用途: 导入主接口（解析 → 校验 → 批量 upsert-or-reject）
// 实现者: StockImporterImpl
#[async_trait]
pub trait StockImporter: Send + Sync {
    /// 从文件导入（按扩展名选择解析器）
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 校验结果 + 每条已接受记录的落库结果 + 运行日志
    /// - Err: 批次级失败（文件不可读、必填列整体缺失、落库失败等），不写入任何数据
    async fn import_file(&self, file_path: &Path, run: &RunContext)
        -> ImportResult<ImportOutcome>;

    /// 从已解析的行导入
    async fn import_rows(&self, rows: Vec<RawRow>, run: &RunContext)
        -> ImportResult<ImportOutcome>;
}

/// 一次导入的完整结果
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    /// 输入行数
    pub total_rows: usize,
    /// 校验结果
    pub batch: crate::domain::record::ImportBatch,
    /// 与 batch.records 一一对应的落库结果
    pub outcomes: Vec<UpsertOutcome>,
    /// 与记录同一事务写入的运行日志
    pub run: ImportRun,
}

impl ImportOutcome {
    /// (新落库标识, 库中已存在标识)，均保持源顺序
    pub fn split_identifiers(&self) -> (Vec<String>, Vec<String>) {
        split_by_outcome(&self.batch.records, &self.outcomes)
    }
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行（列名 → 单元格）
    ///
    /// 空白行保留输出，保证行号与源文件一致
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>>;
}

// ==========================================
// DataCleaner Trait
// ==========================================
// 用途: 单元格清洗接口
// 实现者: DataCleanerImpl
pub trait DataCleaner: Send + Sync {
    /// 清洗单元格（TRIM + NULL 标准化）
    fn clean_cell(&self, cell: &CellValue) -> Option<String>;

    /// 按列名 + 别名查找，返回第一个非空值
    fn lookup(&self, row: &RawRow, column: &ColumnSpec) -> Option<String>;

    /// 整行为空
    fn is_blank_row(&self, row: &RawRow) -> bool;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 必填校验 + 类型转换
// 实现者: FieldMapperImpl
pub trait FieldMapper: Send + Sync {
    /// 将原始行映射为 Record
    ///
    /// # 返回
    /// - Ok(Record): 必填列齐全且类型转换成功
    /// - Err(RowErrorKind): 第一个失败原因（MissingField 或 InvalidValue）
    fn map_to_record(&self, schema: &ImportSchema, row: &RawRow) -> Result<Record, RowErrorKind>;
}
