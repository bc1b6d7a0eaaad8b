// ==========================================
// 库存台账导入 - 库存记录 Repository
// ==========================================
// 职责: upsert-or-reject 落库（按 identifier），不覆盖已有记录
// 红线: Repository 不含业务规则，只做数据 CRUD
// 并发: 单标识原子性由 SQLite 主键 + 串行化连接保证
// ==========================================

use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::import_run::{ImportRun, RunContext};
use crate::domain::record::{ImportBatch, Record};
use crate::domain::types::UpsertOutcome;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::import_run_repo::ImportRunRepository;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex, MutexGuard};

// ==========================================
// RecordStore Trait
// ==========================================
// 实现者: SqliteRecordStore
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// 插入新记录，或报告标识已存在（不覆盖）
    async fn upsert_or_reject(&self, record: &Record) -> RepositoryResult<UpsertOutcome>;

    /// 批量 upsert-or-reject（单事务），结果与输入顺序一致
    async fn upsert_or_reject_all(&self, records: &[Record])
        -> RepositoryResult<Vec<UpsertOutcome>>;

    /// 批量 upsert-or-reject 并写入运行日志
    ///
    /// 记录与 import_run 在同一事务中提交，任一失败整体回滚
    async fn commit_import(
        &self,
        run: &RunContext,
        total_rows: usize,
        batch: &ImportBatch,
    ) -> RepositoryResult<(Vec<UpsertOutcome>, ImportRun)>;

    async fn find_by_identifier(&self, identifier: &str) -> RepositoryResult<Option<Record>>;

    async fn count(&self) -> RepositoryResult<usize>;
}

// ==========================================
// SqliteRecordStore
// ==========================================
pub struct SqliteRecordStore {
    conn: Arc<Mutex<Connection>>,
}

const INSERT_OR_IGNORE_SQL: &str = r#"
    INSERT INTO stock_record (identifier, name, quantity, location)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT(identifier) DO NOTHING
"#;

impl SqliteRecordStore {
    /// 打开数据库并确保表结构存在
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self::from_connection(Arc::new(Mutex::new(conn))))
    }

    /// 内存数据库（测试 / 临时校验用）
    pub fn in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
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

    fn insert_or_ignore(conn: &Connection, record: &Record) -> RepositoryResult<UpsertOutcome> {
        let quantity = i64::try_from(record.quantity).map_err(|_| RepositoryError::FieldValueError {
            field: "quantity".to_string(),
            message: format!("超出范围: {}", record.quantity),
        })?;

        let changed = conn.execute(
            INSERT_OR_IGNORE_SQL,
            params![record.identifier, record.name, quantity, record.location],
        )?;

        Ok(if changed == 1 {
            UpsertOutcome::Created
        } else {
            UpsertOutcome::Duplicate
        })
    }

    fn insert_all(conn: &Connection, records: &[Record]) -> RepositoryResult<Vec<UpsertOutcome>> {
        records
            .iter()
            .map(|record| Self::insert_or_ignore(conn, record))
            .collect()
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn upsert_or_reject(&self, record: &Record) -> RepositoryResult<UpsertOutcome> {
        let conn = self.lock()?;
        Self::insert_or_ignore(&conn, record)
    }

    async fn upsert_or_reject_all(
        &self,
        records: &[Record],
    ) -> RepositoryResult<Vec<UpsertOutcome>> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let outcomes = Self::insert_all(&tx, records)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(outcomes)
    }

    async fn commit_import(
        &self,
        run: &RunContext,
        total_rows: usize,
        batch: &ImportBatch,
    ) -> RepositoryResult<(Vec<UpsertOutcome>, ImportRun)> {
        let mut conn = self.lock()?;
        let tx = conn
            .transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 提前返回时 tx 被 drop，自动回滚
        let outcomes = Self::insert_all(&tx, &batch.records)?;
        let import_run = run.to_run(total_rows, batch, &outcomes, Utc::now())?;
        ImportRunRepository::insert_with(&tx, &import_run)?;

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok((outcomes, import_run))
    }

    async fn find_by_identifier(&self, identifier: &str) -> RepositoryResult<Option<Record>> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT identifier, name, quantity, location FROM stock_record WHERE identifier = ?1",
                params![identifier],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        row.map(|(identifier, name, quantity, location)| {
            let quantity = u64::try_from(quantity).map_err(|_| RepositoryError::FieldValueError {
                field: "quantity".to_string(),
                message: format!("库中数量为负: {}", quantity),
            })?;
            Ok(Record {
                identifier,
                name,
                quantity,
                location,
            })
        })
        .transpose()
    }

    async fn count(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM stock_record", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}
