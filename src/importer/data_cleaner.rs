// ==========================================
// 库存台账导入 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 列名别名查找 / 空行判定
// ==========================================

use crate::domain::record::{CellValue, RawRow};
use crate::importer::schema::ColumnSpec;
use crate::importer::stock_importer_trait::DataCleaner as DataCleanerTrait;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_cell(&self, cell: &CellValue) -> Option<String> {
        cell.as_text()
    }

    fn lookup(&self, row: &RawRow, column: &ColumnSpec) -> Option<String> {
        column
            .candidate_names()
            .filter_map(|name| row.get(name))
            .find_map(|cell| self.clean_cell(cell))
    }

    fn is_blank_row(&self, row: &RawRow) -> bool {
        row.values().all(|cell| cell.is_blank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::RecordField;

    fn row(pairs: &[(&str, CellValue)]) -> RawRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_lookup_prefers_canonical_name() {
        let cleaner = DataCleaner;
        let column = ColumnSpec::new(RecordField::Quantity, "qty", &["quantity"], true);
        let r = row(&[("qty", "5".into()), ("quantity", "7".into())]);

        assert_eq!(cleaner.lookup(&r, &column), Some("5".to_string()));
    }

    #[test]
    fn test_lookup_falls_back_to_alias_when_blank() {
        let cleaner = DataCleaner;
        let column = ColumnSpec::new(RecordField::Quantity, "qty", &["quantity"], true);
        let r = row(&[("qty", "  ".into()), ("quantity", CellValue::Number(7.0))]);

        assert_eq!(cleaner.lookup(&r, &column), Some("7".to_string()));
    }

    #[test]
    fn test_is_blank_row() {
        let cleaner = DataCleaner;
        assert!(cleaner.is_blank_row(&row(&[("id", CellValue::Empty), ("qty", " ".into())])));
        assert!(!cleaner.is_blank_row(&row(&[("id", "P1".into())])));
        assert!(cleaner.is_blank_row(&RawRow::new()));
    }
}
