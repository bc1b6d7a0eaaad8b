// ==========================================
// 库存台账导入 - 导入管道实现
// ==========================================
// 流程: 解析 → 行校验（收集行级错误）→ 批量 upsert-or-reject + 运行日志（单事务）
// 红线: 先整批校验再批量落库，库内重复只报告不覆盖
// ==========================================

use crate::domain::import_run::RunContext;
use crate::domain::record::RawRow;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::record_importer::TabularRecordImporter;
use crate::importer::stock_importer_trait::{FileParser, ImportOutcome, StockImporter};
use crate::repository::RecordStore;
use async_trait::async_trait;
use std::path::Path;
use tracing::{error, info, instrument};

pub struct StockImporterImpl<S>
where
    S: RecordStore,
{
    store: S,
    file_parser: Box<dyn FileParser>,
    importer: TabularRecordImporter,
}

impl<S> StockImporterImpl<S>
where
    S: RecordStore,
{
    pub fn new(store: S, file_parser: Box<dyn FileParser>, importer: TabularRecordImporter) -> Self {
        Self {
            store,
            file_parser,
            importer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    async fn validate_and_store(
        &self,
        rows: &[RawRow],
        run: &RunContext,
    ) -> ImportResult<ImportOutcome> {
        let batch = self.importer.import_rows(rows)?;

        let (outcomes, import_run) = self
            .store
            .commit_import(run, rows.len(), &batch)
            .await
            .map_err(|e| {
                error!(error = %e, "批量落库失败");
                ImportError::InternalError(format!("批量落库失败: {}", e))
            })?;

        let outcome = ImportOutcome {
            total_rows: rows.len(),
            batch,
            outcomes,
            run: import_run,
        };
        let (created, existing) = outcome.split_identifiers();
        info!(
            total = outcome.total_rows,
            accepted = outcome.batch.accepted_count(),
            created = created.len(),
            existing = existing.len(),
            errors = outcome.batch.error_count(),
            skipped = outcome.batch.skipped_rows.len(),
            run_id = %outcome.run.run_id,
            "导入完成"
        );
        Ok(outcome)
    }
}

#[async_trait]
impl<S> StockImporter for StockImporterImpl<S>
where
    S: RecordStore,
{
    #[instrument(skip(self, run), fields(file = %file_path.display(), run_id = %run.run_id))]
    async fn import_file(
        &self,
        file_path: &Path,
        run: &RunContext,
    ) -> ImportResult<ImportOutcome> {
        let rows = self.file_parser.parse_rows(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        info!(rows = rows.len(), "文件解析完成");

        self.validate_and_store(&rows, run).await
    }

    async fn import_rows(
        &self,
        rows: Vec<RawRow>,
        run: &RunContext,
    ) -> ImportResult<ImportOutcome> {
        self.validate_and_store(&rows, run).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::CellValue;
    use crate::domain::types::UpsertOutcome;
    use crate::importer::file_parser::UniversalFileParser;
    use crate::importer::schema::ImportSchema;
    use crate::repository::SqliteRecordStore;

    fn row(id: &str, qty: &str) -> RawRow {
        [("id", id), ("name", "Widget"), ("qty", qty), ("loc", "A1")]
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    fn ctx() -> RunContext {
        RunContext::new("test")
    }

    fn importer() -> StockImporterImpl<SqliteRecordStore> {
        StockImporterImpl::new(
            SqliteRecordStore::in_memory().unwrap(),
            Box::new(UniversalFileParser::default()),
            TabularRecordImporter::new(ImportSchema::default()),
        )
    }

    #[tokio::test]
    async fn test_import_rows_stores_only_accepted() {
        let importer = importer();

        let outcome = importer
            .import_rows(vec![row("P1", "1"), row("P2", "x"), row("P1", "3")], &ctx())
            .await
            .unwrap();

        assert_eq!(outcome.total_rows, 3);
        assert_eq!(outcome.outcomes, vec![UpsertOutcome::Created]);
        assert_eq!(outcome.batch.errors.len(), 2);
        assert_eq!(outcome.run.error_rows, 2);
        assert_eq!(importer.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_second_import_reports_existing() {
        let importer = importer();
        importer.import_rows(vec![row("P1", "1")], &ctx()).await.unwrap();

        let outcome = importer
            .import_rows(vec![row("P1", "9"), row("P2", "2")], &ctx())
            .await
            .unwrap();

        let (created, existing) = outcome.split_identifiers();
        assert_eq!(created, vec!["P2"]);
        assert_eq!(existing, vec!["P1"]);

        let stored = importer.store().find_by_identifier("P1").await.unwrap().unwrap();
        assert_eq!(stored.quantity, 1);
    }

    #[tokio::test]
    async fn test_batch_failure_stores_nothing() {
        let importer = importer();
        let mut incomplete = row("P1", "1");
        incomplete.remove("loc");

        let err = importer.import_rows(vec![incomplete], &ctx()).await.unwrap_err();

        assert!(matches!(err, ImportError::MissingColumns { .. }));
        assert_eq!(importer.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_store_failure_is_batch_failure() {
        let importer = importer();
        let run = ctx();
        importer.import_rows(vec![row("P1", "1")], &run).await.unwrap();

        // 复用 run_id: 运行日志写入失败，记录随之回滚
        let err = importer
            .import_rows(vec![row("P2", "2")], &run)
            .await
            .unwrap_err();

        assert!(matches!(err, ImportError::InternalError(_)));
        assert!(importer.store().find_by_identifier("P2").await.unwrap().is_none());
    }
}
