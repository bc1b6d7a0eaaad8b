// ==========================================
// 库存台账导入 - 日志系统
// ==========================================
// 输出: stderr（stdout 留给 JSON 导入报告）
// 级别: RUST_LOG，缺省 DEFAULT_FILTER
// 格式: STOCK_IMPORT_LOG_FORMAT=json 时输出结构化 JSON
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 缺省过滤规则：本库 info，依赖库 warn
pub const DEFAULT_FILTER: &str = "warn,stock_import=info";

/// 日志格式环境变量
pub const LOG_FORMAT_ENV: &str = "STOCK_IMPORT_LOG_FORMAT";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match std::env::var(LOG_FORMAT_ENV) {
            Ok(v) if v.trim().eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Text,
        }
    }
}

/// 初始化日志系统
///
/// # 示例
/// ```no_run
/// use stock_import::logging;
/// logging::init();
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let builder = fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr);

    let result = match LogFormat::from_env() {
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
        LogFormat::Text => builder.with_line_number(true).try_init(),
    };
    if let Err(e) = result {
        eprintln!("日志系统已初始化，忽略: {}", e);
    }
}

/// 测试用日志（debug 级别，可重复调用）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
