// ==========================================
// 库存台账导入 - 导入运行日志 Repository
// ==========================================
// 职责: import_run 表的写入与查询
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import_run::ImportRun;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::{Arc, Mutex, MutexGuard};

pub struct ImportRunRepository {
    conn: Arc<Mutex<Connection>>,
}

const SELECT_COLUMNS: &str = "run_id, source_name, total_rows, accepted_rows, created_rows, \
     duplicate_rows, error_rows, skipped_rows, row_errors_json, imported_at, elapsed_ms";

impl ImportRunRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    pub fn insert(&self, run: &ImportRun) -> RepositoryResult<()> {
        let conn = self.lock()?;
        Self::insert_with(&conn, run)
    }

    /// 在调用方持有的连接（或事务）上写入
    pub(crate) fn insert_with(conn: &Connection, run: &ImportRun) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO import_run (
                run_id, source_name, total_rows, accepted_rows, created_rows,
                duplicate_rows, error_rows, skipped_rows, row_errors_json, imported_at,
                elapsed_ms
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                run.run_id,
                run.source_name,
                run.total_rows as i64,
                run.accepted_rows as i64,
                run.created_rows as i64,
                run.duplicate_rows as i64,
                run.error_rows as i64,
                run.skipped_rows as i64,
                run.row_errors_json,
                run.imported_at.to_rfc3339_opts(SecondsFormat::Micros, true), // 定长格式，保证按字符串排序
                run.elapsed_ms,
            ],
        )?;
        Ok(())
    }

    pub fn find_by_id(&self, run_id: &str) -> RepositoryResult<Option<ImportRun>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM import_run WHERE run_id = ?1", SELECT_COLUMNS);
        let raw = conn.query_row(&sql, params![run_id], read_raw).optional()?;
        raw.map(RawRun::into_run).transpose()
    }

    /// 最近的导入记录（按导入时间倒序）
    pub fn list_recent(&self, limit: usize) -> RepositoryResult<Vec<ImportRun>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM import_run ORDER BY imported_at DESC, run_id LIMIT ?1",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params![limit as i64], read_raw)?;

        let mut runs = Vec::new();
        for row in rows {
            runs.push(row?.into_run()?);
        }
        Ok(runs)
    }
}

/// 数据库原始行（时间字段尚未解析）
struct RawRun {
    run_id: String,
    source_name: String,
    counts: [i64; 6],
    row_errors_json: String,
    imported_at: String,
    elapsed_ms: i64,
}

fn read_raw(row: &Row<'_>) -> rusqlite::Result<RawRun> {
    Ok(RawRun {
        run_id: row.get(0)?,
        source_name: row.get(1)?,
        counts: [
            row.get(2)?,
            row.get(3)?,
            row.get(4)?,
            row.get(5)?,
            row.get(6)?,
            row.get(7)?,
        ],
        row_errors_json: row.get(8)?,
        imported_at: row.get(9)?,
        elapsed_ms: row.get(10)?,
    })
}

impl RawRun {
    fn into_run(self) -> RepositoryResult<ImportRun> {
        let imported_at = DateTime::parse_from_rfc3339(&self.imported_at)
            .map_err(|e| RepositoryError::FieldValueError {
                field: "imported_at".to_string(),
                message: e.to_string(),
            })?
            .with_timezone(&Utc);
        let [total, accepted, created, duplicate, errors, skipped] = self.counts.map(|n| n.max(0) as usize);

        Ok(ImportRun {
            run_id: self.run_id,
            source_name: self.source_name,
            total_rows: total,
            accepted_rows: accepted,
            created_rows: created,
            duplicate_rows: duplicate,
            error_rows: errors,
            skipped_rows: skipped,
            row_errors_json: self.row_errors_json,
            imported_at,
            elapsed_ms: self.elapsed_ms,
        })
    }
}
