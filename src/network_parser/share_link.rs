//! 分享文本中的链接提取，以及从跳转后的地址中取出视频 ID。

use regex::Regex;
use reqwest::Url;
use std::sync::OnceLock;

static RE_SHARE_URL: OnceLock<Regex> = OnceLock::new();

fn re_share_url() -> &'static Regex {
    RE_SHARE_URL.get_or_init(|| {
        Regex::new(r"https?://(?:[a-zA-Z]|[0-9]|[$-_@.&+]|[!*(),]|%[0-9a-fA-F][0-9a-fA-F])+")
            .expect("compile RE_SHARE_URL")
    })
}

/// 取分享文本里的第一个链接。
pub fn find_share_url(text: &str) -> Option<&str> {
    re_share_url().find(text).map(|m| m.as_str())
}

/// 去掉查询串与末尾的 `/`，取最后一段路径作为视频 ID。
pub fn video_id_from_url(url: &Url) -> Option<String> {
    url.path_segments()?
        .rev()
        .find(|seg| !seg.is_empty())
        .map(|seg| seg.to_string())
}
