// ==========================================
// 库存台账导入 - 导入API
// ==========================================
// 职责: 封装导入流程，返回导入报告（运行日志与记录同一事务落库）
// 报告: 已接受数量 + 新增/已存在标识 + 全部行级错误 + 跳过的空行
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{configure_sqlite_connection, init_schema};
use crate::domain::import_run::{ImportReport, ImportRun, RunContext};
use crate::domain::record::RawRow;
use crate::importer::{
    ImportOutcome, ImportSchema, StockImporter, StockImporterImpl, TabularRecordImporter,
};
use crate::repository::{ImportRunRepository, SqliteRecordStore};
use futures::future::join_all;
use rusqlite::Connection;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};

/// 导入API（绑定一个 SQLite 数据库）
#[derive(Clone)]
pub struct ImportApi {
    conn: Arc<Mutex<Connection>>,
}

impl ImportApi {
    /// 打开数据库并确保表结构存在
    pub fn new(db_path: &str) -> ApiResult<Self> {
        let conn = Connection::open(db_path)?;
        configure_sqlite_connection(&conn)?;
        init_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 配置管理器（共享连接）
    pub fn config_manager(&self) -> ConfigManager {
        ConfigManager::from_connection(self.conn.clone())
    }

    /// 记录存储（共享连接）
    pub fn record_store(&self) -> SqliteRecordStore {
        SqliteRecordStore::from_connection(self.conn.clone())
    }

    fn run_repo(&self) -> ImportRunRepository {
        ImportRunRepository::from_connection(self.conn.clone())
    }

    /// 按当前配置构建导入管道
    async fn create_importer(&self) -> ApiResult<StockImporterImpl<SqliteRecordStore>> {
        let config = self.config_manager().get_import_config().await?;
        let schema = ImportSchema::from_config(&config)?;

        Ok(StockImporterImpl::new(
            self.record_store(),
            Box::new(config.file_parser()),
            TabularRecordImporter::with_options(schema, config.importer_options()),
        ))
    }

    /// 导入文件
    ///
    /// # 返回
    /// - Ok(ImportReport): 行级错误在报告中，不视为失败
    /// - Err(ApiError::ImportFailed): 批次级失败，零条记录落库
    pub async fn import_file<P: AsRef<Path>>(&self, file_path: P) -> ApiResult<ImportReport> {
        let path = file_path.as_ref();
        let source_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        let run = RunContext::new(source_name);
        let importer = self.create_importer().await?;
        let outcome = importer.import_file(path, &run).await.map_err(|e| {
            warn!(file = %path.display(), error = %e, "批次导入失败");
            e
        })?;

        Ok(Self::report(outcome))
    }

    /// 导入已解析的行
    pub async fn import_rows(&self, source_name: &str, rows: Vec<RawRow>) -> ApiResult<ImportReport> {
        if source_name.trim().is_empty() {
            return Err(ApiError::InvalidInput("source_name 不能为空".to_string()));
        }

        let run = RunContext::new(source_name.trim());
        let importer = self.create_importer().await?;
        let outcome = importer.import_rows(rows, &run).await.map_err(|e| {
            warn!(source = %run.source_name, error = %e, "批次导入失败");
            e
        })?;

        Ok(Self::report(outcome))
    }

    /// 并发导入多个文件
    ///
    /// 每个文件独立导入，某个文件失败不影响其他文件；结果与输入顺序一致
    pub async fn batch_import(&self, file_paths: Vec<PathBuf>) -> Vec<(PathBuf, ApiResult<ImportReport>)> {
        let tasks = file_paths.into_iter().map(|path| {
            let api = self.clone();
            async move {
                let handle = {
                    let path = path.clone();
                    tokio::spawn(async move { api.import_file(&path).await })
                };
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => {
                        error!(file = %path.display(), error = %e, "导入任务异常退出");
                        Err(ApiError::InternalError(format!("导入任务异常退出: {}", e)))
                    }
                };
                (path, result)
            }
        });

        join_all(tasks).await
    }

    /// 最近的导入记录
    pub fn list_recent_runs(&self, limit: usize) -> ApiResult<Vec<ImportRun>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }
        Ok(self.run_repo().list_recent(limit)?)
    }

    /// 查询单次导入记录
    pub fn get_run(&self, run_id: &str) -> ApiResult<ImportRun> {
        self.run_repo()
            .find_by_id(run_id)?
            .ok_or_else(|| ApiError::NotFound(format!("ImportRun: {}", run_id)))
    }

    /// 由导入结果生成报告（运行日志已随记录落库）
    fn report(outcome: ImportOutcome) -> ImportReport {
        let (created, already_existing) = outcome.split_identifiers();
        let ImportOutcome {
            total_rows,
            batch,
            run,
            ..
        } = outcome;

        let report = ImportReport {
            run_id: run.run_id,
            source_name: run.source_name,
            total_rows,
            accepted: batch.accepted_count(),
            created,
            already_existing,
            row_errors: batch.errors,
            skipped_rows: batch.skipped_rows,
            elapsed_ms: run.elapsed_ms,
        };

        info!(
            run_id = %report.run_id,
            source = %report.source_name,
            accepted = report.accepted,
            created = report.created.len(),
            existing = report.already_existing.len(),
            errors = report.row_errors.len(),
            skipped = report.skipped_rows.len(),
            elapsed_ms = report.elapsed_ms,
            "导入报告已生成"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::config_keys;
    use crate::domain::record::{CellValue, RowErrorKind};

    fn api() -> ImportApi {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ImportApi::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    #[tokio::test]
    async fn test_import_rows_report_and_run_log() {
        let api = api();
        let rows = vec![
            row(&[("id", "P1"), ("name", "Widget"), ("qty", "10"), ("loc", "A1")]),
            row(&[("id", "P2"), ("name", "Bolt"), ("qty", ""), ("loc", "A2")]),
        ];

        let report = api.import_rows("manual", rows).await.unwrap();

        assert_eq!(report.accepted, 1);
        assert_eq!(report.created, vec!["P1"]);
        assert_eq!(
            report.row_errors[0].kind,
            RowErrorKind::MissingField {
                field: "qty".to_string()
            }
        );

        let run = api.get_run(&report.run_id).unwrap();
        assert_eq!(run.error_rows, 1);
        assert_eq!(api.list_recent_runs(5).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_config_override_changes_required_columns() {
        let api = api();
        api.config_manager()
            .set_config_value(config_keys::REQUIRED_COLUMNS, "id")
            .unwrap();

        let report = api
            .import_rows("manual", vec![row(&[("id", "P1")])])
            .await
            .unwrap();

        assert!(report.is_fully_imported());
        let stored = api.record_store();
        use crate::repository::RecordStore;
        assert_eq!(stored.find_by_identifier("P1").await.unwrap().unwrap().quantity, 0);
    }

    #[tokio::test]
    async fn test_blank_source_name_rejected() {
        let api = api();
        let err = api.import_rows("  ", vec![]).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));
    }

    #[test]
    fn test_get_unknown_run() {
        let api = api();
        assert!(matches!(api.get_run("missing"), Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_skipped_blank_rows_reported_and_logged() {
        let api = api();
        let rows = vec![
            row(&[("id", "P1"), ("name", "Widget"), ("qty", "1"), ("loc", "A1")]),
            row(&[("id", ""), ("name", " "), ("qty", ""), ("loc", "")]),
        ];

        let report = api.import_rows("m", rows).await.unwrap();

        assert_eq!(report.total_rows, 2);
        assert_eq!(report.accepted, 1);
        assert!(report.row_errors.is_empty());
        assert_eq!(report.skipped_rows, vec![2]);
        assert_eq!(
            report.accepted + report.row_errors.len() + report.skipped_rows.len(),
            report.total_rows
        );

        let run = api.get_run(&report.run_id).unwrap();
        assert_eq!(run.skipped_rows, 1);
        assert_eq!(run.source_name, "m");
    }
}
