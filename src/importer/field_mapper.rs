// ==========================================
// 库存台账导入 - 字段映射器实现
// ==========================================
// 职责: 必填列校验 → 类型转换 → Record
// 顺序: 先检查全部必填列，再做类型转换
// ==========================================

use crate::domain::record::{RawRow, Record, RowErrorKind};
use crate::domain::types::RecordField;
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
use crate::importer::schema::ImportSchema;
use crate::importer::stock_importer_trait::{DataCleaner, FieldMapper as FieldMapperTrait};

pub struct FieldMapper {
    cleaner: Box<dyn DataCleaner>,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new(Box::new(DataCleanerImpl))
    }
}

impl FieldMapper {
    pub fn new(cleaner: Box<dyn DataCleaner>) -> Self {
        Self { cleaner }
    }

    /// 取字段值（列未定义或为空时返回 None）
    fn value_of(&self, schema: &ImportSchema, row: &RawRow, field: RecordField) -> Option<String> {
        schema
            .column(field)
            .and_then(|column| self.cleaner.lookup(row, column))
    }

    /// 规范列名（用于错误信息）
    fn column_name(schema: &ImportSchema, field: RecordField) -> String {
        schema
            .column(field)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| field.to_string().to_lowercase())
    }
}

impl FieldMapperTrait for FieldMapper {
    fn map_to_record(&self, schema: &ImportSchema, row: &RawRow) -> Result<Record, RowErrorKind> {
        // 1. 必填列
        for column in schema.required_columns() {
            if self.cleaner.lookup(row, column).is_none() {
                return Err(RowErrorKind::MissingField {
                    field: column.name.clone(),
                });
            }
        }

        // 2. 类型转换
        let identifier = self
            .value_of(schema, row, RecordField::Identifier)
            .ok_or_else(|| RowErrorKind::MissingField {
                field: Self::column_name(schema, RecordField::Identifier),
            })?;

        let quantity = match self.value_of(schema, row, RecordField::Quantity) {
            None => 0,
            Some(raw) => parse_quantity(&raw).ok_or_else(|| RowErrorKind::InvalidValue {
                field: Self::column_name(schema, RecordField::Quantity),
                raw,
            })?,
        };

        Ok(Record {
            identifier,
            name: self
                .value_of(schema, row, RecordField::Name)
                .unwrap_or_default(),
            quantity,
            location: self
                .value_of(schema, row, RecordField::Location)
                .unwrap_or_default(),
        })
    }
}

/// 数量上限（与 SQLite INTEGER 一致）
pub const MAX_QUANTITY: u64 = i64::MAX as u64;

/// 解析数量: 非负整数
///
/// 接受 "12" / "+12" / "12.0"（电子表格常见的整数浮点形式）
pub fn parse_quantity(raw: &str) -> Option<u64> {
    let n = match raw.parse::<u64>() {
        Ok(n) => n,
        Err(_) => {
            let f = raw.parse::<f64>().ok()?;
            if !(f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f < MAX_QUANTITY as f64) {
                return None;
            }
            f as u64
        }
    };
    (n <= MAX_QUANTITY).then_some(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::record::CellValue;
    use crate::importer::schema::ColumnSpec;

    fn row(pairs: &[(&str, &str)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), CellValue::from(*v)))
            .collect()
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("10"), Some(10));
        assert_eq!(parse_quantity("12.0"), Some(12));
        assert_eq!(parse_quantity("-3"), None);
        assert_eq!(parse_quantity("2.5"), None);
        assert_eq!(parse_quantity("ten"), None);
        assert_eq!(parse_quantity("NaN"), None);
        assert_eq!(parse_quantity("inf"), None);
        assert_eq!(parse_quantity("18446744073709551615"), None);
    }

    #[test]
    fn test_map_valid_row() {
        let mapper = FieldMapper::default();
        let schema = ImportSchema::default();
        let record = mapper
            .map_to_record(
                &schema,
                &row(&[("id", "P1"), ("name", "Widget"), ("qty", "10"), ("loc", "A1")]),
            )
            .unwrap();

        assert_eq!(
            record,
            Record {
                identifier: "P1".to_string(),
                name: "Widget".to_string(),
                quantity: 10,
                location: "A1".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_field_reported_before_invalid_value() {
        let mapper = FieldMapper::default();
        let schema = ImportSchema::default();
        let err = mapper
            .map_to_record(&schema, &row(&[("id", "P1"), ("name", "W"), ("qty", "x")]))
            .unwrap_err();

        assert_eq!(err, RowErrorKind::MissingField { field: "loc".to_string() });
    }

    #[test]
    fn test_invalid_quantity_keeps_raw_value() {
        let mapper = FieldMapper::default();
        let schema = ImportSchema::default();
        let err = mapper
            .map_to_record(
                &schema,
                &row(&[("id", "P2"), ("name", "Bolt"), ("qty", " -3 "), ("loc", "A3")]),
            )
            .unwrap_err();

        assert_eq!(
            err,
            RowErrorKind::InvalidValue {
                field: "qty".to_string(),
                raw: "-3".to_string(),
            }
        );
    }

    #[test]
    fn test_optional_columns_default() {
        let mapper = FieldMapper::default();
        let schema = ImportSchema::default().with_required(&["id"]).unwrap();
        let record = mapper.map_to_record(&schema, &row(&[("id", "P9")])).unwrap();

        assert_eq!(record.quantity, 0);
        assert_eq!(record.name, "");
        assert_eq!(record.location, "");
    }

    #[test]
    fn test_optional_quantity_still_coerced() {
        let mapper = FieldMapper::default();
        let schema = ImportSchema::default().with_required(&["id"]).unwrap();
        let err = mapper
            .map_to_record(&schema, &row(&[("id", "P9"), ("quantity", "lots")]))
            .unwrap_err();

        assert!(matches!(err, RowErrorKind::InvalidValue { field, .. } if field == "qty"));
    }

    /// 把 "N/A" 视为空值的清洗器
    struct NaCleaner;

    impl DataCleaner for NaCleaner {
        fn clean_cell(&self, cell: &CellValue) -> Option<String> {
            DataCleanerImpl
                .clean_cell(cell)
                .filter(|v| !v.eq_ignore_ascii_case("n/a"))
        }

        fn lookup(&self, row: &RawRow, column: &ColumnSpec) -> Option<String> {
            column
                .candidate_names()
                .filter_map(|name| row.get(name))
                .find_map(|cell| self.clean_cell(cell))
        }

        fn is_blank_row(&self, row: &RawRow) -> bool {
            row.values().all(|cell| self.clean_cell(cell).is_none())
        }
    }

    #[test]
    fn test_custom_cleaner_drives_missing_field() {
        let mapper = FieldMapper::new(Box::new(NaCleaner));
        let schema = ImportSchema::default();
        let err = mapper
            .map_to_record(
                &schema,
                &row(&[("id", "P1"), ("name", "Widget"), ("qty", "N/A"), ("loc", "A1")]),
            )
            .unwrap_err();

        assert_eq!(err, RowErrorKind::MissingField { field: "qty".to_string() });

        // 默认清洗器把 "N/A" 当作普通文本
        let err = FieldMapper::default()
            .map_to_record(
                &schema,
                &row(&[("id", "P1"), ("name", "Widget"), ("qty", "N/A"), ("loc", "A1")]),
            )
            .unwrap_err();
        assert!(matches!(err, RowErrorKind::InvalidValue { .. }));
    }
}
