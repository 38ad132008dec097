use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Value, json};
use tracing::{error, info};

use crate::base_system::cache_dir::CacheDir;
use crate::server::context::{HostContext, HostProgress};
use crate::server::state::AppState;

pub const GET_DOWNLOAD_LINK: &str = "get_douyin_download_link";
pub const PARSE_VIDEO_INFO: &str = "parse_douyin_video_info";
pub const DOWNLOAD_VIDEO: &str = "download_douyin_video";

const SUCCESS: &str = "success";
const ERROR: &str = "error";

/// 工具执行结果：漂亮打印的 JSON 文本，失败时置 `is_error`。
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    fn from_envelope<T: Serialize>(envelope: &T, is_error: bool) -> Self {
        let text = serde_json::to_string_pretty(envelope).unwrap_or_else(|e| {
            error!("序列化工具结果失败: {e}");
            format!(r#"{{"status": "error", "error": "{e}"}}"#)
        });
        Self { text, is_error }
    }

    fn error(message: String) -> Self {
        Self::from_envelope(
            &ErrorEnvelope {
                status: ERROR,
                error: message,
            },
            true,
        )
    }

    pub fn to_call_result(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error,
        })
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    status: &'static str,
    error: String,
}

#[derive(Serialize)]
struct DownloadLinkEnvelope<'a> {
    status: &'static str,
    video_id: &'a str,
    title: &'a str,
    download_url: &'a str,
    description: String,
    usage_tip: &'static str,
}

#[derive(Serialize)]
struct VideoInfoEnvelope<'a> {
    video_id: &'a str,
    title: &'a str,
    download_url: &'a str,
    status: &'static str,
}

#[derive(Serialize)]
struct DownloadEnvelope {
    status: &'static str,
    video_path: String,
}

/// `tools/list` 返回的工具定义。
pub fn tool_definitions() -> Vec<Value> {
    let share_link_schema = json!({
        "type": "object",
        "properties": {
            "share_link": {
                "type": "string",
                "description": "抖音分享链接或包含链接的文本"
            }
        },
        "required": ["share_link"]
    });

    vec![
        json!({
            "name": GET_DOWNLOAD_LINK,
            "description": "获取抖音视频的无水印下载链接",
            "inputSchema": share_link_schema,
        }),
        json!({
            "name": PARSE_VIDEO_INFO,
            "description": "解析抖音分享链接，获取视频基本信息",
            "inputSchema": share_link_schema,
        }),
        json!({
            "name": DOWNLOAD_VIDEO,
            "description": "下载抖音无水印视频到缓存目录，并上报下载进度",
            "inputSchema": share_link_schema,
        }),
    ]
}

pub async fn get_download_link(state: &AppState, share_link: &str) -> ToolOutput {
    match state.client.resolve(share_link).await {
        Ok(video) => {
            info!("获取下载链接成功: {}", video.video_id());
            ToolOutput::from_envelope(
                &DownloadLinkEnvelope {
                    status: SUCCESS,
                    video_id: video.video_id(),
                    title: video.title(),
                    download_url: video.url(),
                    description: format!("视频标题: {}", video.title()),
                    usage_tip: "可以直接使用此链接下载无水印视频",
                },
                false,
            )
        }
        Err(e) => {
            error!("获取下载链接失败: {e}");
            ToolOutput::error(format!("获取下载链接失败: {e}"))
        }
    }
}

pub async fn parse_video_info(state: &AppState, share_link: &str) -> ToolOutput {
    match state.client.resolve(share_link).await {
        Ok(video) => ToolOutput::from_envelope(
            &VideoInfoEnvelope {
                video_id: video.video_id(),
                title: video.title(),
                download_url: video.url(),
                status: SUCCESS,
            },
            false,
        ),
        Err(e) => {
            error!("解析视频信息失败: {e}");
            ToolOutput::error(e.to_string())
        }
    }
}

pub async fn download_video(
    state: &AppState,
    share_link: &str,
    ctx: &dyn HostContext,
) -> ToolOutput {
    match download_to_cache(state, share_link, ctx).await {
        Ok(path) => ToolOutput::from_envelope(
            &DownloadEnvelope {
                status: SUCCESS,
                video_path: path.display().to_string(),
            },
            false,
        ),
        Err(e) => {
            error!("下载视频失败: {e:#}");
            ToolOutput::error(format!("下载视频失败: {e}"))
        }
    }
}

async fn download_to_cache(
    state: &AppState,
    share_link: &str,
    ctx: &dyn HostContext,
) -> anyhow::Result<PathBuf> {
    let video = state.client.resolve(share_link).await?;
    let cache = CacheDir::acquire(&state.cache_dir)?;

    ctx.info(&format!("正在下载视频: {}", video.title()));
    let path = state
        .downloader
        .download(&video, cache.path(), &HostProgress(ctx))
        .await?;
    ctx.info(&format!("视频下载完成: {}", path.display()));
    Ok(path)
}
