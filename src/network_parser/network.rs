use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

use super::models::VideoInfo;
use super::page_data::{extract_router_data, parse_page_record};
use super::share_link::{find_share_url, video_id_from_url};
use crate::base_system::context::Config;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no valid share link found")]
    NoShareLink,
    #[error("cannot take video id from redirect target {0}")]
    BadRedirect(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("share page returned {status} for {url}")]
    Status { status: StatusCode, url: String },
    #[error("parse page failed")]
    PageParse,
    #[error("invalid page json: {0}")]
    Json(serde_json::Error),
    #[error("unrecognized page data: neither video nor note page found")]
    UnknownPageShape,
    #[error("page data contains no items")]
    EmptyItemList,
    #[error("item has no play address")]
    MissingPlayUrl,
    #[error("invalid client settings: {0}")]
    Client(String),
}

/// 请求画像：UA 与超时，在构造 HTTP 客户端时一次性注入。
#[derive(Debug, Clone)]
pub struct ClientProfile {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub share_page_url: String,
}

impl ClientProfile {
    pub fn from_config(config: &Config) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout(),
            connect_timeout: config.connect_timeout(),
            share_page_url: config.share_page_url.clone(),
        }
    }

    fn share_page_for(&self, video_id: &str) -> String {
        self.share_page_url.replace("{video_id}", video_id)
    }
}

/// 抖音分享链接解析客户端。无缓存、无重试，每次解析相互独立。
#[derive(Debug, Clone)]
pub struct DouyinClient {
    client: Client,
    profile: ClientProfile,
}

impl DouyinClient {
    pub fn new(profile: ClientProfile) -> Result<Self, ResolveError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&profile.user_agent)
                .map_err(|e| ResolveError::Client(format!("user_agent: {e}")))?,
        );
        default_headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        // 不设置整体 timeout：下载流由调用方按数据块限时
        let client = Client::builder()
            .default_headers(default_headers)
            .connect_timeout(profile.connect_timeout)
            .build()?;

        Ok(Self { client, profile })
    }

    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        Self::new(ClientProfile::from_config(config))
    }

    /// 底层客户端，下载器复用同一套请求头。
    pub fn http(&self) -> &Client {
        &self.client
    }

    pub fn share_page_for(&self, video_id: &str) -> String {
        self.profile.share_page_for(video_id)
    }

    /// 从分享文本解析出无水印视频信息。
    pub async fn resolve(&self, share_text: &str) -> Result<VideoInfo, ResolveError> {
        let share_url = find_share_url(share_text).ok_or(ResolveError::NoShareLink)?;
        debug!("提取到分享链接: {}", share_url);

        let video_id = self.follow_share_url(share_url).await?;
        debug!("视频 ID: {}", video_id);

        let page_url = self.profile.share_page_for(&video_id);
        let html = self.fetch_page(&page_url).await?;

        let raw = extract_router_data(&html).ok_or(ResolveError::PageParse)?;
        let record = parse_page_record(raw)?;
        debug!("页面模板: {}", record.shape_key);

        let url = record.play_url.replace("playwm", "play");
        let title = if record.desc.is_empty() {
            format!("douyin_{video_id}")
        } else {
            record.desc
        };

        let info = VideoInfo::new(url, &title, video_id);
        info!("解析完成: {} ({})", info.title(), info.video_id());
        Ok(info)
    }

    async fn follow_share_url(&self, share_url: &str) -> Result<String, ResolveError> {
        let resp = self
            .client
            .get(share_url)
            .timeout(self.profile.request_timeout)
            .send()
            .await?;
        let final_url: Url = resp.url().clone();
        debug!("跳转后的地址: {}", final_url);
        video_id_from_url(&final_url).ok_or_else(|| ResolveError::BadRedirect(final_url.to_string()))
    }

    async fn fetch_page(&self, page_url: &str) -> Result<String, ResolveError> {
        let resp = self
            .client
            .get(page_url)
            .timeout(self.profile.request_timeout)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ResolveError::Status {
                status,
                url: page_url.to_string(),
            });
        }
        Ok(resp.text().await?)
    }
}
