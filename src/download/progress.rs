//! 下载进度上报与 CLI 进度条。

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// 已下载字节数与总大小；服务器未给出 `Content-Length` 时总大小未知。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    pub downloaded: u64,
    pub total: Option<u64>,
}

/// 每写完一个数据块同步调用一次。
pub trait ProgressSink: Send + Sync {
    fn report(&self, progress: DownloadProgress);
}

impl<F> ProgressSink for F
where
    F: Fn(DownloadProgress) + Send + Sync,
{
    fn report(&self, progress: DownloadProgress) {
        self(progress)
    }
}


/// 命令行模式下的字节进度条。
pub struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    pub fn new() -> Self {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner} [{elapsed_precise}] {bytes}/{total_bytes} {bytes_per_sec} {wide_bar}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        Self { bar }
    }

    /// 在进度条上方打印一行，不打断进度条。
    pub fn println(&self, message: &str) {
        self.bar.println(message);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl Default for CliProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for CliProgress {
    fn report(&self, progress: DownloadProgress) {
        if let Some(total) = progress.total
            && self.bar.length() != Some(total)
        {
            self.bar.set_length(total);
        }
        self.bar.set_position(progress.downloaded);
    }
}
