// ==========================================
// 库存台账导入 - 领域类型定义
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 记录字段 (Record Field)
// ==========================================
// 目标实体 Record 的四个字段，与导入 schema 的列一一对应
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecordField {
    Identifier, // 唯一标识
    Name,       // 显示名称
    Quantity,   // 数量（非负整数）
    Location,   // 库位
}

impl RecordField {
    /// 全部字段（schema 默认顺序）
    pub const ALL: [RecordField; 4] = [
        RecordField::Identifier,
        RecordField::Name,
        RecordField::Quantity,
        RecordField::Location,
    ];
}

impl fmt::Display for RecordField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordField::Identifier => write!(f, "IDENTIFIER"),
            RecordField::Name => write!(f, "NAME"),
            RecordField::Quantity => write!(f, "QUANTITY"),
            RecordField::Location => write!(f, "LOCATION"),
        }
    }
}

// ==========================================
// 落库结果 (Upsert Outcome)
// ==========================================
// upsert-or-reject: 新增，或报告标识已存在（不覆盖）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UpsertOutcome {
    Created,   // 新插入
    Duplicate, // 标识已存在，未写入
}

impl fmt::Display for UpsertOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpsertOutcome::Created => write!(f, "CREATED"),
            UpsertOutcome::Duplicate => write!(f, "DUPLICATE"),
        }
    }
}
