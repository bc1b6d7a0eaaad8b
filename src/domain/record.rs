// ==========================================
// 库存台账导入 - 记录领域模型
// ==========================================
// 职责: 原始单元格 / 原始行 / 校验后的记录 / 行级错误 / 导入批次
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ==========================================
// CellValue - 原始单元格
// ==========================================
// 文件解析层产出，尚未做任何类型转换
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Empty,
}

impl CellValue {
    /// 清洗后的文本（TRIM；空白视为空值）
    ///
    /// 整数值的数字单元格不带小数部分（1001.0 → "1001"）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => Some(format_number(*n)),
            CellValue::Empty => None,
        }
    }

    /// 是否为空值（空单元格或纯空白文本）
    pub fn is_blank(&self) -> bool {
        self.as_text().is_none()
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

fn format_number(n: f64) -> String {
    // 2^53 以内的整数可精确表示
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// 原始行：列名 → 单元格
pub type RawRow = HashMap<String, CellValue>;

// ==========================================
// Record - 校验通过的库存记录
// ==========================================
// 约束: identifier 非空；唯一性在落库时保证
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub identifier: String, // 唯一标识
    pub name: String,       // 显示名称
    pub quantity: u64,      // 数量（非负）
    pub location: String,   // 库位
}

// ==========================================
// RowError - 行级错误
// ==========================================
// row: 1 起始，与源文件可见的数据行号一致（不含表头）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row: usize,
    pub kind: RowErrorKind,
}

impl RowError {
    pub fn new(row: usize, kind: RowErrorKind) -> Self {
        Self { row, kind }
    }

    /// 人类可读的错误原因
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }
}

impl fmt::Display for RowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {}: {}", self.row, self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    /// 必填列缺失或为空
    MissingField { field: String },
    /// 类型转换失败
    InvalidValue { field: String, raw: String },
    /// 同批次内标识重复（保留首次出现）
    DuplicateIdentifier { identifier: String },
}

impl fmt::Display for RowErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowErrorKind::MissingField { field } => write!(f, "missing field {}", field),
            RowErrorKind::InvalidValue { field, raw } => {
                write!(f, "invalid value for {}: {}", field, raw)
            }
            RowErrorKind::DuplicateIdentifier { identifier } => {
                write!(f, "duplicate identifier {}", identifier)
            }
        }
    }
}

// ==========================================
// ImportBatch - 单次导入的结果
// ==========================================
// 生命周期: 每次导入创建，落库/上报后丢弃，不持久化
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub records: Vec<Record>,    // 通过校验的记录（源顺序）
    pub errors: Vec<RowError>,   // 行级错误（源顺序）
    #[serde(default)]
    pub skipped_rows: Vec<usize>, // 跳过的空白行号
}

impl ImportBatch {
    pub fn accepted_count(&self) -> usize {
        self.records.len()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// 无任何行级错误
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_as_text_trims_and_normalizes_null() {
        assert_eq!(CellValue::from("  A1 ").as_text(), Some("A1".to_string()));
        assert_eq!(CellValue::from("   ").as_text(), None);
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_cell_number_rendering() {
        assert_eq!(CellValue::Number(1001.0).as_text(), Some("1001".to_string()));
        assert_eq!(CellValue::Number(-3.0).as_text(), Some("-3".to_string()));
        assert_eq!(CellValue::Number(2.5).as_text(), Some("2.5".to_string()));
    }

    #[test]
    fn test_row_error_reasons() {
        let missing = RowError::new(1, RowErrorKind::MissingField { field: "qty".into() });
        assert_eq!(missing.reason(), "missing field qty");

        let invalid = RowError::new(
            3,
            RowErrorKind::InvalidValue {
                field: "qty".into(),
                raw: "-3".into(),
            },
        );
        assert_eq!(invalid.reason(), "invalid value for qty: -3");
        assert_eq!(invalid.to_string(), "row 3: invalid value for qty: -3");

        let dup = RowError::new(
            2,
            RowErrorKind::DuplicateIdentifier {
                identifier: "P1".into(),
            },
        );
        assert_eq!(dup.reason(), "duplicate identifier P1");
    }

    #[test]
    fn test_row_error_kind_serialized_with_tag() {
        let kind = RowErrorKind::DuplicateIdentifier {
            identifier: "P1".into(),
        };
        let json = serde_json::to_value(&kind).unwrap();
        assert_eq!(json["type"], "DUPLICATE_IDENTIFIER");
        assert_eq!(json["identifier"], "P1");
    }
}
