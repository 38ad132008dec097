use serde::Serialize;

use crate::base_system::video_paths::sanitize_title;

/// 一次解析得到的视频信息，构造后不可变。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VideoInfo {
    url: String,
    title: String,
    video_id: String,
}

impl VideoInfo {
    /// `title` 会在这里做文件名清洗，之后可直接拼接为下载路径。
    pub fn new(url: impl Into<String>, title: &str, video_id: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: sanitize_title(title),
            video_id: video_id.into(),
        }
    }

    /// 无水印直链。
    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }
}
