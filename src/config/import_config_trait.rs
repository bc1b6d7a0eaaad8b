// ==========================================
// 库存台账导入 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::config::import_config::ImportConfig;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 读取完整导入配置
    ///
    /// 未配置的项使用 ImportConfig::default() 中的值
    async fn get_import_config(&self) -> ConfigResult<ImportConfig>;
}

#[async_trait]
impl ImportConfigReader for ImportConfig {
    async fn get_import_config(&self) -> ConfigResult<ImportConfig> {
        Ok(self.clone())
    }
}
