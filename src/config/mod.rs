// ==========================================
// 库存台账导入 - 配置层
// ==========================================
// 职责: 导入配置（列名/别名/必填列/解析选项），支持覆写
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod import_config;
pub mod import_config_trait;

// 重导出核心配置类型
pub use config_manager::{config_keys, ConfigManager};
pub use error::{ConfigError, ConfigResult};
pub use import_config::{ColumnConfig, ImportConfig};
pub use import_config_trait::ImportConfigReader;
