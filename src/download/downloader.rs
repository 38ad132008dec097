//! 视频流式下载：固定大小分块写盘，每块上报一次进度。

use std::io;
use std::path::{Path, PathBuf};
use std::pin::pin;
use std::time::Duration;

use futures_util::TryStreamExt;
use reqwest::header::CONTENT_LENGTH;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::io::StreamReader;
use tracing::{debug, info};

use super::progress::{DownloadProgress, ProgressSink};
use crate::base_system::video_paths::video_file_path;
use crate::network_parser::VideoInfo;

pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("media server returned {0}")]
    Status(StatusCode),
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("stream read failed: {0}")]
    Stream(io::Error),
    #[error("no data received for {0:?}")]
    Stalled(Duration),
}

#[derive(Debug, Clone)]
pub struct VideoDownloader {
    client: Client,
    stall_timeout: Duration,
}

impl VideoDownloader {
    /// `client` 应携带与解析相同的移动端请求头。
    pub fn new(client: Client, stall_timeout: Duration) -> Self {
        Self {
            client,
            stall_timeout,
        }
    }

    /// 下载到 `dest_dir/{title}.mp4`，已存在则覆盖。失败时可能留下不完整的文件。
    pub async fn download(
        &self,
        video: &VideoInfo,
        dest_dir: &Path,
        sink: &dyn ProgressSink,
    ) -> Result<PathBuf, DownloadError> {
        let path = video_file_path(dest_dir, video.title());

        let resp = tokio::time::timeout(self.stall_timeout, self.client.get(video.url()).send())
            .await
            .map_err(|_| DownloadError::Stalled(self.stall_timeout))??;
        let status = resp.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status));
        }

        let total = content_length(resp.headers());
        debug!("开始下载 {} -> {}，总大小: {:?}", video.url(), path.display(), total);

        let io_err = |source| DownloadError::Io {
            path: path.clone(),
            source,
        };
        let mut file = File::create(&path).await.map_err(io_err)?;

        let stream = resp.bytes_stream().map_err(io::Error::other);
        let mut reader = pin!(StreamReader::new(stream));
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut downloaded = 0u64;

        loop {
            let n = tokio::time::timeout(self.stall_timeout, read_chunk(&mut reader, &mut buf))
                .await
                .map_err(|_| DownloadError::Stalled(self.stall_timeout))?
                .map_err(DownloadError::Stream)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n]).await.map_err(io_err)?;
            downloaded += n as u64;
            sink.report(DownloadProgress { downloaded, total });
        }

        file.flush().await.map_err(io_err)?;
        info!("下载完成: {} ({} 字节)", path.display(), downloaded);
        Ok(path)
    }
}

/// `Content-Length` 缺失或为 0 视为未知。
fn content_length(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .filter(|&n| n > 0)
}

/// 读满一个缓冲区或读到流结束；只有最后一块可能不足 `buf.len()`。
async fn read_chunk<R>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
