// ==========================================
// 库存台账导入 - 导入 Schema
// ==========================================
// 职责: 列名/别名/必填列的显式描述，作为参数传入导入器
// 红线: 不使用全局注册表
// ==========================================

use crate::config::ImportConfig;
use crate::domain::types::RecordField;
use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 单列描述
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub field: RecordField,
    /// 规范列名（错误信息使用此名称）
    pub name: String,
    /// 备用列名，按顺序尝试
    pub aliases: Vec<String>,
    pub required: bool,
}

impl ColumnSpec {
    pub fn new(field: RecordField, name: &str, aliases: &[&str], required: bool) -> Self {
        Self {
            field,
            name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            required,
        }
    }

    /// 规范列名 + 别名
    pub fn candidate_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(|a| a.as_str()))
    }
}

/// 导入 Schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSchema {
    columns: Vec<ColumnSpec>,
}

impl Default for ImportSchema {
    fn default() -> Self {
        Self {
            columns: vec![
                ColumnSpec::new(RecordField::Identifier, "id", &["identifier", "sku"], true),
                ColumnSpec::new(RecordField::Name, "name", &["display_name"], true),
                ColumnSpec::new(RecordField::Quantity, "qty", &["quantity"], true),
                ColumnSpec::new(RecordField::Location, "loc", &["location"], true),
            ],
        }
    }
}

impl ImportSchema {
    /// 创建并校验 schema
    pub fn new(columns: Vec<ColumnSpec>) -> ImportResult<Self> {
        let schema = Self { columns };
        schema.validate()?;
        Ok(schema)
    }

    /// 从配置构建 schema
    pub fn from_config(config: &ImportConfig) -> ImportResult<Self> {
        let columns = config
            .columns
            .iter()
            .map(|c| ColumnSpec {
                field: c.field,
                name: c.name.trim().to_string(),
                aliases: c.aliases.iter().map(|a| a.trim().to_string()).collect(),
                required: false,
            })
            .collect();

        // 必填标记在 with_required 中设置并统一校验
        Self { columns }.with_required(&config.required_columns)
    }

    /// 按规范列名设置必填列（覆盖原有必填标记）
    pub fn with_required<S: AsRef<str>>(mut self, required: &[S]) -> ImportResult<Self> {
        let known: HashSet<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        let unknown: Vec<String> = required
            .iter()
            .map(|r| r.as_ref().trim())
            .filter(|r| !known.contains(r))
            .map(|r| r.to_string())
            .collect();
        if !unknown.is_empty() {
            return Err(ImportError::InvalidSchema(format!(
                "未知的必填列: {}",
                unknown.join(", ")
            )));
        }

        for column in &mut self.columns {
            column.required = required.iter().any(|r| r.as_ref().trim() == column.name);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn columns(&self) -> &[ColumnSpec] {
        &self.columns
    }

    /// 查找字段对应的列
    pub fn column(&self, field: RecordField) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// 必填列（schema 顺序）
    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.required)
    }

    fn validate(&self) -> ImportResult<()> {
        let mut names = HashSet::new();
        let mut fields = HashSet::new();

        for column in &self.columns {
            if column.name.is_empty() {
                return Err(ImportError::InvalidSchema(format!(
                    "字段 {} 的列名为空",
                    column.field
                )));
            }
            if !fields.insert(column.field) {
                return Err(ImportError::InvalidSchema(format!(
                    "字段 {} 重复定义",
                    column.field
                )));
            }
            for name in column.candidate_names() {
                if !names.insert(name.to_string()) {
                    return Err(ImportError::InvalidSchema(format!("列名重复: {}", name)));
                }
            }
        }

        match self.column(RecordField::Identifier) {
            Some(c) if c.required => Ok(()),
            Some(c) => Err(ImportError::InvalidSchema(format!(
                "标识列 {} 必须为必填列",
                c.name
            ))),
            None => Err(ImportError::InvalidSchema("缺少标识列".to_string())),
        }
    }
}
