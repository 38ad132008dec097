use serde_json::{Value, json};
use tracing::error;

use crate::server::protocol::RpcError;
use crate::server::state::AppState;

pub const VIDEO_URI_PREFIX: &str = "douyin://video/";
const VIDEO_URI_TEMPLATE: &str = "douyin://video/{video_id}";

pub fn resource_templates() -> Vec<Value> {
    vec![json!({
        "uriTemplate": VIDEO_URI_TEMPLATE,
        "name": "douyin_video",
        "description": "按视频 ID 获取抖音视频信息",
        "mimeType": "application/json",
    })]
}

/// 从 `douyin://video/{video_id}` 中取出 id；不匹配模板时返回 `None`。
pub fn video_id_from_uri(uri: &str) -> Option<&str> {
    let id = uri.strip_prefix(VIDEO_URI_PREFIX)?;
    if id.is_empty() || id.contains('/') {
        return None;
    }
    Some(id)
}

/// 解析视频详情页，返回 `VideoInfo` JSON；失败时返回可读的错误文本。
pub async fn video_info_text(state: &AppState, video_id: &str) -> String {
    let page_url = state.client.share_page_for(video_id);
    let resolved = state.client.resolve(&page_url).await;
    match resolved.map(|video| serde_json::to_string_pretty(&video)) {
        Ok(Ok(text)) => text,
        Ok(Err(e)) => {
            error!("序列化视频信息失败: {e}");
            format!("获取视频信息失败: {e}")
        }
        Err(e) => {
            error!("获取视频信息失败: {video_id}: {e}");
            format!("获取视频信息失败: {e}")
        }
    }
}

/// `resources/read` 的结果体。
pub async fn read_resource(state: &AppState, uri: &str) -> Result<Value, RpcError> {
    let video_id = video_id_from_uri(uri)
        .ok_or_else(|| RpcError::invalid_params(format!("Unknown resource: {uri}")))?;
    let text = video_info_text(state, video_id).await;
    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": "application/json",
            "text": text,
        }]
    }))
}
