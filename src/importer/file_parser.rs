// ==========================================
// 库存台账导入 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xlsb/.xls/.ods) / CSV (.csv)
// 约定: 首行为表头；空白行保留输出（保证行号一致）
// ==========================================

use crate::domain::record::{CellValue, RawRow};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::stock_importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::debug;

const EXCEL_EXTENSIONS: [&str; 5] = ["xlsx", "xlsm", "xlsb", "xls", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if path.exists() {
        Ok(())
    } else {
        Err(ImportError::FileNotFound(path.display().to_string()))
    }
}

/// 按表头组装一行（重复表头保留第一列，空表头列忽略）
fn build_row<I>(headers: &[String], cells: I) -> RawRow
where
    I: IntoIterator<Item = CellValue>,
{
    let mut row = RawRow::new();
    for (header, cell) in headers.iter().zip(cells) {
        if header.is_empty() {
            continue;
        }
        row.entry(header.clone()).or_insert(cell);
    }
    row
}

/// 字节偏移 → 物理行号（1 起始）
struct LineIndex<'a> {
    content: &'a [u8],
    newlines: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    fn new(content: &'a [u8]) -> Self {
        let newlines = content
            .iter()
            .enumerate()
            .filter(|(_, b)| **b == b'\n')
            .map(|(i, _)| i)
            .collect();
        Self { content, newlines }
    }

    /// 记录首行的物理行号
    ///
    /// record.position() 指向上一条记录之后，可能落在被跳过的空行上，
    /// 需越过换行符找到记录真正的起点
    fn start_line(&self, record: &StringRecord, fallback: usize) -> usize {
        let Some(position) = record.position() else {
            return fallback;
        };
        let mut offset = position.byte() as usize;
        while offset < self.content.len() && matches!(self.content[offset], b'\r' | b'\n') {
            offset += 1;
        }
        self.newlines.partition_point(|&p| p < offset) + 1
    }
}

/// 引号字段内的换行数（多行记录仍算一行数据）
fn embedded_newlines(record: &StringRecord) -> usize {
    record.iter().map(|field| field.matches('\n').count()).sum()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
}

impl Default for CsvParser {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl FileParser for CsvParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let content = std::fs::read(file_path)?;
        let lines = LineIndex::new(&content);
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .delimiter(self.delimiter)
            .flexible(true) // 允许行长度不一致
            .from_reader(content.as_slice());

        let header_record = reader.headers()?.clone();
        let headers: Vec<String> = header_record
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::CsvParseError("CSV 文件无表头".to_string()));
        }

        let mut last_line = lines.start_line(&header_record, 1) + embedded_newlines(&header_record);
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;

            // csv 会跳过空行，这里补回空行，保证行号与文件一致
            let start = lines.start_line(&record, last_line + 1);
            for _ in (last_line + 1)..start {
                rows.push(RawRow::new());
            }
            last_line = start + embedded_newlines(&record);

            let cells = record.iter().map(|value| {
                if value.trim().is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(value.to_string())
                }
            });
            rows.push(build_row(&headers, cells));
        }

        debug!(rows = rows.len(), columns = headers.len(), "CSV 解析完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
#[derive(Default)]
pub struct ExcelParser {
    /// 指定工作表；None 时读取第一个
    sheet_name: Option<String>,
}

impl ExcelParser {
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }
}

/// Excel 单元格 → CellValue
pub fn excel_cell_to_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty => CellValue::Empty,
        Data::Int(i) => CellValue::Number(*i as f64),
        Data::Float(f) => CellValue::Number(*f),
        Data::String(s) => CellValue::Text(s.clone()),
        other => CellValue::Text(other.to_string()),
    }
}

impl FileParser for ExcelParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !EXCEL_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = match &self.sheet_name {
            Some(name) => {
                if !workbook.sheet_names().iter().any(|s| s == name) {
                    return Err(ImportError::ExcelParseError(format!("工作表不存在: {}", name)));
                }
                name.clone()
            }
            None => workbook
                .sheet_names()
                .first()
                .cloned()
                .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows_iter = range.rows();
        let header_row = rows_iter
            .next()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无表头".to_string()))?;
        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        let rows: Vec<RawRow> = rows_iter
            .map(|data_row| build_row(&headers, data_row.iter().map(excel_cell_to_value)))
            .collect();

        debug!(sheet = %sheet_name, rows = rows.len(), columns = headers.len(), "Excel 解析完成");
        Ok(rows)
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
#[derive(Default)]
pub struct UniversalFileParser {
    csv: CsvParser,
    excel: ExcelParser,
}

impl UniversalFileParser {
    pub fn new(csv: CsvParser, excel: ExcelParser) -> Self {
        Self { csv, excel }
    }
}

impl FileParser for UniversalFileParser {
    fn parse_rows(&self, file_path: &Path) -> ImportResult<Vec<RawRow>> {
        let ext = extension_of(file_path);
        match ext.as_str() {
            "csv" => self.csv.parse_rows(file_path),
            e if EXCEL_EXTENSIONS.contains(&e) => self.excel.parse_rows(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}
