// ==========================================
// 库存台账导入 - 冲突处理器实现
// ==========================================
// 职责: 检测同批次内重复标识 / 汇总库内已存在标识
// 策略: 同批次保留首次出现；库内已存在则拒绝写入（不覆盖）
// ==========================================

use crate::domain::record::Record;
use crate::domain::types::UpsertOutcome;
use std::collections::HashSet;

/// 同批次重复检测（只记录已接受的标识）
#[derive(Debug, Default)]
pub struct ConflictHandler {
    accepted: HashSet<String>,
}

impl ConflictHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// 尝试接受标识
    ///
    /// # 返回
    /// - true: 首次出现，已登记
    /// - false: 同批次内已接受过
    pub fn admit(&mut self, identifier: &str) -> bool {
        if self.accepted.contains(identifier) {
            return false;
        }
        self.accepted.insert(identifier.to_string());
        true
    }

    /// 已接受的标识数量
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }
}

/// 按落库结果拆分标识
///
/// # 返回
/// - (新落库标识, 库中已存在标识)，均保持源顺序
pub fn split_by_outcome(
    records: &[Record],
    outcomes: &[UpsertOutcome],
) -> (Vec<String>, Vec<String>) {
    let mut created = Vec::new();
    let mut existing = Vec::new();

    for (record, outcome) in records.iter().zip(outcomes.iter()) {
        match outcome {
            UpsertOutcome::Created => created.push(record.identifier.clone()),
            UpsertOutcome::Duplicate => existing.push(record.identifier.clone()),
        }
    }

    (created, existing)
}
