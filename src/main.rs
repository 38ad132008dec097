//! 命令行入口：默认以 MCP stdio 服务器运行，也可以单次解析/下载。

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Result, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;

use douyin_mcp_server::base_system::config::load_or_create;
use douyin_mcp_server::base_system::context::Config;
use douyin_mcp_server::base_system::logging::{LogOptions, LogSystem};
use douyin_mcp_server::download::{CliProgress, DownloadProgress, ProgressSink};
use douyin_mcp_server::server::context::HostContext;
use douyin_mcp_server::server::routes::tools;
use douyin_mcp_server::server::{self, AppState};

const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Parser)]
#[command(name = "douyin-mcp-server")]
#[command(about = "Douyin watermark-free video MCP server")]
struct Cli {
    /// 启用调试日志输出
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// 显示版本信息后退出
    #[arg(long, default_value_t = false)]
    version: bool,

    /// 数据目录路径（用于存放 config.yml 和 logs）
    #[arg(long)]
    data_dir: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// 以 MCP 服务器模式运行（stdin/stdout）
    Serve,
    /// 解析分享链接并输出无水印下载链接
    Resolve {
        /// 分享链接或包含链接的分享文本
        text: String,
    },
    /// 下载视频到缓存目录
    Download {
        /// 分享链接或包含链接的分享文本
        text: String,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    if cli.version {
        println!("Douyin MCP Server v{}", VERSION);
        return Ok(ExitCode::SUCCESS);
    }

    let data_dir = cli.data_dir.as_deref().map(Path::new);
    let config = load_or_create::<Config>(data_dir).map_err(|e| anyhow!(e.to_string()))?;
    let _log = init_logging(cli.debug, config.log_to_console, data_dir)?;
    info!(target: "startup", "当前版本: v{}", VERSION);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => server::run(&config).map(|()| ExitCode::SUCCESS),
        Command::Resolve { text } => run_once(&config, |state| async move {
            tools::get_download_link(&state, &text).await
        }),
        Command::Download { text } => run_once(&config, |state| async move {
            let ctx = CliContext::default();
            let out = tools::download_video(&state, &text, &ctx).await;
            ctx.progress.finish();
            out
        }),
    }
}

/// 单次命令：构建运行时执行一个工具，结果信封打印到 stdout。
fn run_once<F, Fut>(config: &Config, op: F) -> Result<ExitCode>
where
    F: FnOnce(AppState) -> Fut,
    Fut: Future<Output = tools::ToolOutput>,
{
    let state = AppState::from_config(config)?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let out = rt.block_on(op(state));
    println!("{}", out.text);
    if out.is_error {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

#[derive(Default)]
struct CliContext {
    progress: CliProgress,
}

impl HostContext for CliContext {
    fn info(&self, message: &str) {
        info!("{message}");
        self.progress.println(message);
    }

    fn report_progress(&self, current: u64, total: Option<u64>) {
        self.progress.report(DownloadProgress {
            downloaded: current,
            total,
        });
    }
}

fn init_logging(debug: bool, console: bool, base_dir: Option<&Path>) -> Result<LogSystem> {
    let opts = LogOptions {
        debug,
        archive_on_exit: true,
        console,
    };
    LogSystem::init(opts, base_dir).map_err(|e| anyhow!(e))
}
