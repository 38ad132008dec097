//! 工具执行期间提供给处理函数的宿主上下文：日志与进度通知。

use serde_json::Value;
use tokio::sync::mpsc::UnboundedSender;
use tracing::debug;

use super::protocol::{Notification, Outgoing};
use crate::download::{DownloadProgress, ProgressSink};

pub trait HostContext: Send + Sync {
    /// 发送一条日志消息，不等待结果。
    fn info(&self, message: &str);
    /// 上报进度；`total` 为 `None` 表示总量未知。
    fn report_progress(&self, current: u64, total: Option<u64>);
}

/// 把宿主上下文当作下载进度回调使用。
pub struct HostProgress<'a>(pub &'a dyn HostContext);

impl ProgressSink for HostProgress<'_> {
    fn report(&self, progress: DownloadProgress) {
        self.0.report_progress(progress.downloaded, progress.total);
    }
}

const LOGGER_NAME: &str = "douyin-mcp-server";

/// 单个 `tools/call` 请求的上下文，通知经由输出通道写回宿主。
pub struct RequestContext {
    outbox: UnboundedSender<Outgoing>,
    progress_token: Option<Value>,
}

impl RequestContext {
    pub fn new(outbox: UnboundedSender<Outgoing>, progress_token: Option<Value>) -> Self {
        Self {
            outbox,
            progress_token,
        }
    }

    fn send(&self, notification: Notification) {
        if self.outbox.send(notification.into()).is_err() {
            debug!("输出通道已关闭，丢弃通知");
        }
    }
}

impl HostContext for RequestContext {
    fn info(&self, message: &str) {
        self.send(Notification::log("info", LOGGER_NAME, message));
    }

    fn report_progress(&self, current: u64, total: Option<u64>) {
        // 宿主未提供 progressToken 时不发送进度
        if let Some(token) = &self.progress_token {
            self.send(Notification::progress(token.clone(), current, total));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn progress_needs_token() {
        let (tx, mut rx) = unbounded_channel();
        let ctx = RequestContext::new(tx, None);
        ctx.report_progress(1, Some(2));
        assert!(rx.try_recv().is_err());

        ctx.info("正在下载视频: x");
        let Outgoing::Notification(n) = rx.try_recv().unwrap() else {
            panic!("expected notification");
        };
        assert_eq!(n.method, "notifications/message");
        assert_eq!(n.params["data"], json!("正在下载视频: x"));
    }

    #[test]
    fn host_progress_forwards_unknown_total() {
        let (tx, mut rx) = unbounded_channel();
        let ctx = RequestContext::new(tx, Some(json!("p1")));
        HostProgress(&ctx).report(DownloadProgress {
            downloaded: 8192,
            total: None,
        });
        let Outgoing::Notification(n) = rx.try_recv().unwrap() else {
            panic!("expected notification");
        };
        assert_eq!(n.method, "notifications/progress");
        assert_eq!(n.params["progressToken"], json!("p1"));
        assert!(n.params.get("total").is_none());
    }

    #[test]
    fn closed_outbox_is_tolerated() {
        let (tx, rx) = unbounded_channel();
        drop(rx);
        let ctx = RequestContext::new(tx, Some(json!(1)));
        ctx.info("ignored");
        ctx.report_progress(1, None);
    }
}
