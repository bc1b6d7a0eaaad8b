// ==========================================
// 库存台账导入 - 配置层错误类型
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置写入失败 (key: {key}): {message}")]
    ConfigWriteError { key: String, message: String },

    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库错误: {0}")]
    DatabaseError(#[from] rusqlite::Error),
}

/// Result 类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
