// ==========================================
// 库存台账导入 - 导入配置
// ==========================================
// 默认值 + config_kv 覆写（见 ConfigManager）
// ==========================================

use crate::domain::types::RecordField;
use crate::importer::file_parser::{CsvParser, ExcelParser, UniversalFileParser};
use crate::importer::record_importer::ImporterOptions;
use serde::{Deserialize, Serialize};

/// 默认单批最大行数
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// 单列配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub field: RecordField,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
}

impl ColumnConfig {
    fn new(field: RecordField, name: &str, aliases: &[&str]) -> Self {
        Self {
            field,
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    pub columns: Vec<ColumnConfig>,
    /// 必填列（规范列名）
    pub required_columns: Vec<String>,
    pub skip_blank_rows: bool,
    /// None 表示不限制
    pub max_rows: Option<usize>,
    pub csv_delimiter: u8,
    /// Excel 工作表名；None 时读取第一个
    pub sheet_name: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnConfig::new(RecordField::Identifier, "id", &["identifier", "sku"]),
                ColumnConfig::new(RecordField::Name, "name", &["display_name"]),
                ColumnConfig::new(RecordField::Quantity, "qty", &["quantity"]),
                ColumnConfig::new(RecordField::Location, "loc", &["location"]),
            ],
            required_columns: vec![
                "id".to_string(),
                "name".to_string(),
                "qty".to_string(),
                "loc".to_string(),
            ],
            skip_blank_rows: true,
            max_rows: Some(DEFAULT_MAX_ROWS),
            csv_delimiter: b',',
            sheet_name: None,
        }
    }
}

impl ImportConfig {
    pub fn importer_options(&self) -> ImporterOptions {
        ImporterOptions {
            skip_blank_rows: self.skip_blank_rows,
            max_rows: self.max_rows,
        }
    }

    pub fn file_parser(&self) -> UniversalFileParser {
        UniversalFileParser::new(
            CsvParser::new(self.csv_delimiter),
            ExcelParser::new(self.sheet_name.clone()),
        )
    }
}
