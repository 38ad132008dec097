//! MCP stdio 服务器。
//!
//! - `protocol`：JSON-RPC 报文
//! - `router`  ：方法分发
//! - `routes`  ：工具与资源处理函数
//! - `context` ：工具执行期间的日志/进度通知
//! - `state`   ：共享只读状态

pub mod context;
pub mod protocol;
pub mod router;
pub mod routes;
pub mod state;

use anyhow::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::base_system::context::Config;
use protocol::{IncomingMessage, Outgoing, PARSE_ERROR, Response, RpcError};
pub use state::AppState;

/// 构建运行时并在 stdin/stdout 上提供服务，直到 stdin 关闭。
pub fn run(config: &Config) -> Result<()> {
    let state = AppState::from_config(config).context("初始化 HTTP 客户端失败")?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(serve(state, tokio::io::stdin(), tokio::io::stdout()))
}

/// 逐行读取请求，每个请求在独立任务中处理；所有输出经由同一个写任务。
pub async fn serve<R, W>(state: AppState, input: R, output: W) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (outbox, rx) = unbounded_channel::<Outgoing>();
    let writer = tokio::spawn(write_loop(rx, output));
    let mut tasks = JoinSet::new();

    info!("MCP 服务器已启动，等待请求");
    let mut reader = BufReader::new(input);
    let mut buf = Vec::new();
    let mut read_error = None;
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                // 停止读取，但仍等待进行中的请求写回结果
                error!("读取 stdin 失败: {e}");
                read_error = Some(e);
                break;
            }
        }

        let line = match std::str::from_utf8(&buf) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!("请求不是合法的 UTF-8: {e}");
                let err = RpcError::new(PARSE_ERROR, format!("Parse error: {e}"));
                let _ = outbox.send(Response::failure(Value::Null, err).into());
                continue;
            }
        };
        if line.is_empty() {
            continue;
        }

        let msg = match IncomingMessage::from_json_line(line) {
            Ok(msg) => msg,
            Err(err) => {
                warn!("无法解析请求: {} ({})", err.message, err.code);
                let _ = outbox.send(Response::failure(Value::Null, err).into());
                continue;
            }
        };

        let state = state.clone();
        let outbox = outbox.clone();
        tasks.spawn(async move {
            if let Some(out) = router::handle_message(&state, msg, &outbox).await {
                let _ = outbox.send(out);
            }
        });

        // 回收已结束的任务
        while let Some(joined) = tasks.try_join_next() {
            if let Err(e) = joined {
                error!("请求任务异常退出: {e}");
            }
        }
    }

    debug!("stdin 已关闭，等待 {} 个进行中的请求", tasks.len());
    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            error!("请求任务异常退出: {e}");
        }
    }

    drop(outbox);
    writer.await.context("写任务异常退出")??;
    if let Some(e) = read_error {
        return Err(e).context("读取 stdin 失败");
    }
    info!("MCP 服务器已退出");
    Ok(())
}

async fn write_loop<W>(mut rx: UnboundedReceiver<Outgoing>, mut output: W) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(out) = rx.recv().await {
        let mut line = match out.to_json_line() {
            Ok(line) => line,
            Err(e) => {
                error!("序列化响应失败: {e}");
                continue;
            }
        };
        line.push('\n');
        output.write_all(line.as_bytes()).await?;
        output.flush().await?;
    }
    Ok(())
}
