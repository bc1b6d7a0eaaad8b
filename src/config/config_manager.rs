// ==========================================
// 库存台账导入 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// 约定: 非法配置值回退默认值并告警，不中断导入
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config::ImportConfig;
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::{init_schema, open_sqlite_connection};
use crate::domain::types::RecordField;
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tracing::warn;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 打开数据库并确保 config_kv 表存在
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> ConfigResult<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| ConfigError::LockError(e.to_string()))
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    pub fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ConfigError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入配置值（UPSERT）
    pub fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| ConfigError::ConfigWriteError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;
        let mut config_map = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(json!(config_map).to_string())
    }

    /// 读取导入配置（默认值 + 覆写）
    pub fn load_import_config(&self) -> ConfigResult<ImportConfig> {
        let mut config = ImportConfig::default();

        for field in RecordField::ALL {
            let (name_key, aliases_key) = config_keys::column_keys(field);
            let name = self.get_config_value(&name_key)?;
            let aliases = self.get_config_value(&aliases_key)?;

            let ImportConfig {
                columns,
                required_columns,
                ..
            } = &mut config;
            if let Some(column) = columns.iter_mut().find(|c| c.field == field) {
                if let Some(name) = name.map(|n| n.trim().to_string()) {
                    if name.is_empty() {
                        warn!(config_key = %name_key, "列名配置为空，使用默认值");
                    } else {
                        // 缺省必填列跟随改名
                        for required in required_columns.iter_mut() {
                            if *required == column.name {
                                *required = name.clone();
                            }
                        }
                        column.name = name;
                    }
                }
                if let Some(aliases) = aliases {
                    column.aliases = split_list(&aliases);
                }
            }
        }

        if let Some(raw) = self.get_config_value(config_keys::REQUIRED_COLUMNS)? {
            let required = split_list(&raw);
            if required.is_empty() {
                warn!(config_key = config_keys::REQUIRED_COLUMNS, "必填列配置为空，使用默认值");
            } else {
                config.required_columns = required;
            }
        }

        if let Some(raw) = self.get_config_value(config_keys::SKIP_BLANK_ROWS)? {
            match parse_bool(&raw) {
                Some(v) => config.skip_blank_rows = v,
                None => warn!(config_key = config_keys::SKIP_BLANK_ROWS, raw_value = %raw, "配置格式错误，使用默认值"),
            }
        }

        if let Some(raw) = self.get_config_value(config_keys::MAX_ROWS)? {
            match raw.trim().parse::<usize>() {
                Ok(0) => config.max_rows = None,
                Ok(n) => config.max_rows = Some(n),
                Err(_) => warn!(config_key = config_keys::MAX_ROWS, raw_value = %raw, "配置格式错误，使用默认值"),
            }
        }

        if let Some(raw) = self.get_config_value(config_keys::CSV_DELIMITER)? {
            match parse_delimiter(&raw) {
                Some(d) => config.csv_delimiter = d,
                None => warn!(config_key = config_keys::CSV_DELIMITER, raw_value = %raw, "配置格式错误，使用默认值"),
            }
        }

        if let Some(raw) = self.get_config_value(config_keys::SHEET_NAME)? {
            let trimmed = raw.trim();
            config.sheet_name = (!trimmed.is_empty()).then(|| trimmed.to_string());
        }

        Ok(config)
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_import_config(&self) -> ConfigResult<ImportConfig> {
        self.load_import_config()
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "是" => Some(true),
        "0" | "false" | "no" | "n" | "否" => Some(false),
        _ => None,
    }
}

fn parse_delimiter(raw: &str) -> Option<u8> {
    match raw {
        "\\t" | "tab" | "\t" => Some(b'\t'),
        _ => {
            let mut chars = raw.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() => Some(c as u8),
                _ => None,
            }
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    use crate::domain::types::RecordField;

    pub const REQUIRED_COLUMNS: &str = "import.required_columns";
    pub const SKIP_BLANK_ROWS: &str = "import.skip_blank_rows";
    pub const MAX_ROWS: &str = "import.max_rows"; // 0 = 不限制
    pub const CSV_DELIMITER: &str = "import.csv_delimiter";
    pub const SHEET_NAME: &str = "import.sheet_name";

    /// 列名 / 别名配置键
    pub fn column_keys(field: RecordField) -> (String, String) {
        let suffix = field.to_string().to_lowercase();
        (
            format!("import.column.{}", suffix),
            format!("import.aliases.{}", suffix),
        )
    }
}
