// ==========================================
// 库存台账导入 - 导入运行记录 / 导入报告
// ==========================================
// ImportRun: 持久化到 import_run 表，与记录落库同一事务写入
// ImportReport: 返回给调用方（已接受数量 + 全部行级错误 + 跳过的空行）
// ==========================================

use crate::domain::record::{ImportBatch, RowError};
use crate::domain::types::UpsertOutcome;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use uuid::Uuid;

// ==========================================
// ImportRun - 导入运行日志
// ==========================================
// 对齐: import_run 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportRun {
    pub run_id: String,          // 运行 ID（UUID）
    pub source_name: String,     // 来源（文件名或调用方给定名称）
    pub total_rows: usize,       // 输入行数
    pub accepted_rows: usize,    // 通过校验行数
    pub created_rows: usize,     // 新落库行数
    pub duplicate_rows: usize,   // 库中已存在行数
    pub error_rows: usize,       // 行级错误数
    pub skipped_rows: usize,     // 跳过的空白行数
    pub row_errors_json: String, // 行级错误明细 JSON
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
}

// ==========================================
// RunContext - 单次导入的运行上下文
// ==========================================
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run_id: String,
    pub source_name: String,
    started: Instant,
}

impl RunContext {
    pub fn new(source_name: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            source_name: source_name.into(),
            started: Instant::now(),
        }
    }

    pub fn elapsed_ms(&self) -> i64 {
        self.started.elapsed().as_millis() as i64
    }

    /// 由校验结果与落库结果生成运行日志
    ///
    /// outcomes 与 batch.records 一一对应
    pub fn to_run(
        &self,
        total_rows: usize,
        batch: &ImportBatch,
        outcomes: &[UpsertOutcome],
        imported_at: DateTime<Utc>,
    ) -> Result<ImportRun, serde_json::Error> {
        let created = outcomes
            .iter()
            .filter(|o| **o == UpsertOutcome::Created)
            .count();

        Ok(ImportRun {
            run_id: self.run_id.clone(),
            source_name: self.source_name.clone(),
            total_rows,
            accepted_rows: batch.accepted_count(),
            created_rows: created,
            duplicate_rows: outcomes.len() - created,
            error_rows: batch.error_count(),
            skipped_rows: batch.skipped_rows.len(),
            row_errors_json: serde_json::to_string(&batch.errors)?,
            imported_at,
            elapsed_ms: self.elapsed_ms(),
        })
    }
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: String,
    pub source_name: String,
    pub total_rows: usize,
    /// 通过校验的记录数
    pub accepted: usize,
    /// 新落库的标识
    pub created: Vec<String>,
    /// 库中已存在、被拒绝写入的标识
    pub already_existing: Vec<String>,
    /// 行级错误（源顺序）
    pub row_errors: Vec<RowError>,
    /// 跳过的空白行号
    pub skipped_rows: Vec<usize>,
    pub elapsed_ms: i64,
}

impl ImportReport {
    /// 是否全部成功（无行级错误且无库内重复）
    pub fn is_fully_imported(&self) -> bool {
        self.row_errors.is_empty() && self.already_existing.is_empty()
    }
}
