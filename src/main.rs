// ==========================================
// 库存台账导入 - 命令行入口
// ==========================================
// 用法: stock-import [--db <path>] <file>...
// 输出: 每个文件一份 JSON 导入报告
// 退出码: 任一文件批次级失败时非零
// ==========================================

use anyhow::{bail, Context};
use std::path::PathBuf;
use stock_import::db::get_default_db_path;
use stock_import::{logging, ImportApi};

struct CliArgs {
    db_path: String,
    files: Vec<PathBuf>,
}

fn parse_args() -> anyhow::Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut db_path = None;
    let mut files = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--db" => {
                let path = args.next().context("--db 需要指定数据库路径")?;
                db_path = Some(path);
            }
            "-h" | "--help" => {
                println!("用法: stock-import [--db <path>] <file>...");
                std::process::exit(0);
            }
            _ => files.push(PathBuf::from(arg)),
        }
    }

    if files.is_empty() {
        bail!("未指定导入文件（用法: stock-import [--db <path>] <file>...）");
    }

    Ok(CliArgs {
        db_path: db_path.unwrap_or_else(get_default_db_path),
        files,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let args = parse_args()?;
    tracing::info!("{} v{}", stock_import::APP_NAME, stock_import::VERSION);
    tracing::info!("使用数据库: {}", args.db_path);

    let api = ImportApi::new(&args.db_path)
        .with_context(|| format!("无法打开数据库: {}", args.db_path))?;

    let mut failed = 0usize;
    for (path, result) in api.batch_import(args.files).await {
        match result {
            Ok(report) => {
                println!("{}", serde_json::to_string_pretty(&report)?);
            }
            Err(e) => {
                failed += 1;
                eprintln!("{}: {}", path.display(), e);
            }
        }
    }

    if failed > 0 {
        bail!("{} 个文件导入失败", failed);
    }
    Ok(())
}
