// ==========================================
// 库存台账导入 - 导入模块错误类型
// ==========================================
// 批次级失败（BatchFailure）: 立即返回，零条记录被接受
// 行级错误不在此处，见 domain::record::RowError
// ==========================================

use thiserror::Error;

/// 导入模块错误类型（批次级）
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xlsm/.xlsb/.xls/.ods）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 批次结构错误 =====
    #[error("所有行均缺少必填列: {}", columns.join(", "))]
    MissingColumns { columns: Vec<String> },

    #[error("行数超出上限: {rows} > {max}")]
    TooManyRows { rows: usize, max: usize },

    #[error("导入 schema 无效: {0}")]
    InvalidSchema(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),
}

impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
