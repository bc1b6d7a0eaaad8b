// ==========================================
// 库存台账导入 - 表格记录导入器
// ==========================================
// 职责: 原始行 → ImportBatch（已接受记录 + 行级错误）
// 红线: 纯转换，无副作用；单行错误不中断批次
// ==========================================
// 每行按源顺序:
// 1. 必填列齐全且非空        → 否则 MissingField
// 2. 类型转换                → 否则 InvalidValue
// 3. 同批次内标识唯一        → 否则 DuplicateIdentifier
// 4. 追加到已接受列表
// ==========================================

use crate::domain::record::{ImportBatch, RawRow, RowError, RowErrorKind};
use crate::importer::conflict_handler::ConflictHandler;
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper as FieldMapperImpl;
use crate::importer::schema::ImportSchema;
use crate::importer::stock_importer_trait::{DataCleaner, FieldMapper};
use tracing::{debug, info, instrument};

/// 导入选项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImporterOptions {
    /// 跳过整行为空的行（仍占用行号）
    pub skip_blank_rows: bool,
    /// 单批最大行数，超出则整批失败
    pub max_rows: Option<usize>,
}

impl Default for ImporterOptions {
    fn default() -> Self {
        Self {
            skip_blank_rows: true,
            max_rows: None,
        }
    }
}

pub struct TabularRecordImporter {
    schema: ImportSchema,
    options: ImporterOptions,
    cleaner: Box<dyn DataCleaner>,
    field_mapper: Box<dyn FieldMapper>,
}

impl TabularRecordImporter {
    pub fn new(schema: ImportSchema) -> Self {
        Self::with_options(schema, ImporterOptions::default())
    }

    pub fn with_options(schema: ImportSchema, options: ImporterOptions) -> Self {
        Self {
            schema,
            options,
            cleaner: Box::new(DataCleanerImpl),
            field_mapper: Box::new(FieldMapperImpl::default()),
        }
    }

    /// 替换字段映射器
    pub fn with_field_mapper(mut self, field_mapper: Box<dyn FieldMapper>) -> Self {
        self.field_mapper = field_mapper;
        self
    }

    pub fn schema(&self) -> &ImportSchema {
        &self.schema
    }

    pub fn options(&self) -> &ImporterOptions {
        &self.options
    }

    /// 校验并转换全部行
    ///
    /// # 返回
    /// - Ok(ImportBatch): 行级错误都收集在 batch.errors 中
    /// - Err(ImportError): 批次级失败（行数超限 / 必填列在所有行中都不存在）
    #[instrument(skip(self, rows), fields(rows = rows.len()))]
    pub fn import_rows(&self, rows: &[RawRow]) -> ImportResult<ImportBatch> {
        self.check_batch(rows)?;

        let mut batch = ImportBatch::default();
        let mut conflicts = ConflictHandler::new();

        for (idx, row) in rows.iter().enumerate() {
            let row_number = idx + 1;

            if self.options.skip_blank_rows && self.cleaner.is_blank_row(row) {
                debug!(row_number, "跳过空行");
                batch.skipped_rows.push(row_number);
                continue;
            }

            let record = match self.field_mapper.map_to_record(&self.schema, row) {
                Ok(record) => record,
                Err(kind) => {
                    debug!(row_number, reason = %kind, "行校验失败");
                    batch.errors.push(RowError::new(row_number, kind));
                    continue;
                }
            };

            if !conflicts.admit(&record.identifier) {
                debug!(row_number, identifier = %record.identifier, "同批次标识重复");
                batch.errors.push(RowError::new(
                    row_number,
                    RowErrorKind::DuplicateIdentifier {
                        identifier: record.identifier,
                    },
                ));
                continue;
            }

            batch.records.push(record);
        }

        info!(
            total = rows.len(),
            accepted = batch.accepted_count(),
            errors = batch.error_count(),
            skipped = batch.skipped_rows.len(),
            "行校验完成"
        );
        Ok(batch)
    }

    /// 批次级检查
    fn check_batch(&self, rows: &[RawRow]) -> ImportResult<()> {
        if let Some(max) = self.options.max_rows {
            if rows.len() > max {
                return Err(ImportError::TooManyRows {
                    rows: rows.len(),
                    max,
                });
            }
        }

        if rows.is_empty() {
            return Ok(());
        }

        // 必填列（含别名）在任何一行中都没有出现
        let absent: Vec<String> = self
            .schema
            .required_columns()
            .filter(|column| {
                !rows
                    .iter()
                    .any(|row| column.candidate_names().any(|name| row.contains_key(name)))
            })
            .map(|column| column.name.clone())
            .collect();

        if absent.is_empty() {
            Ok(())
        } else {
            Err(ImportError::MissingColumns { columns: absent })
        }
    }
}
