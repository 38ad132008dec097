//! 下载流程模块入口。
//!
//! 子模块：
//! - `progress`  ：进度上报与 CLI 进度条
//! - `downloader`：流式下载到缓存目录

pub mod downloader;
pub mod progress;

pub use downloader::{CHUNK_SIZE, DownloadError, VideoDownloader};
pub use progress::{CliProgress, DownloadProgress, ProgressSink};
