// ==========================================
// 库存台账导入 - API 层
// ==========================================
// 职责: 面向调用方（CLI / 上层服务）的导入接口
// ==========================================

pub mod error;
pub mod import_api;

pub use error::{ApiError, ApiResult};
pub use import_api::ImportApi;
