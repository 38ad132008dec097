//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, ConfigSpec, FieldMeta};

/// 抖音移动端 UA；桌面 UA 拿到的页面结构不同，解析会失败。
pub const MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_2 like Mac OS X) AppleWebKit/605.1.15 (HTML, like Gecko) EdgeOS/121.0.2277.107 Version/17.0 Mobile/15E148 Safari/604.1";

pub const SHARE_PAGE_URL: &str = "https://www.iesdouyin.com/share/video/{video_id}";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // 保存配置
    #[serde(default = "default_cache_dir")]
    pub cache_dir: String,

    // 网络配置
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
    #[serde(default = "default_download_stall_timeout")]
    pub download_stall_timeout: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_share_page_url")]
    pub share_page_url: String,

    // 日志配置
    #[serde(default = "default_false")]
    pub log_to_console: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            download_stall_timeout: default_download_stall_timeout(),
            user_agent: default_user_agent(),
            share_page_url: default_share_page_url(),
            log_to_console: default_false(),
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 7] = [
            FieldMeta {
                name: "cache_dir",
                description: "视频下载目录（相对路径以进程工作目录为基准）",
            },
            FieldMeta {
                name: "request_timeout",
                description: "页面请求超时时间（秒）",
            },
            FieldMeta {
                name: "connect_timeout",
                description: "建立连接超时时间（秒）",
            },
            FieldMeta {
                name: "download_stall_timeout",
                description: "下载时单个数据块的最长等待时间（秒）",
            },
            FieldMeta {
                name: "user_agent",
                description: "请求使用的 User-Agent（需为移动端，否则页面结构不同）",
            },
            FieldMeta {
                name: "share_page_url",
                description: "视频详情页地址模板，{video_id} 会被替换为视频 ID",
            },
            FieldMeta {
                name: "log_to_console",
                description: "是否同时把日志输出到 stderr",
            },
        ];
        &FIELDS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.share_page_url.contains("{video_id}") {
            return Err(ConfigError::Validation(
                "share_page_url must contain {video_id}".to_string(),
            ));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "user_agent must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn cache_dir_path(&self) -> PathBuf {
        if self.cache_dir.trim().is_empty() {
            PathBuf::from(default_cache_dir())
        } else {
            PathBuf::from(&self.cache_dir)
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout.max(1))
    }

    pub fn download_stall_timeout(&self) -> Duration {
        Duration::from_secs(self.download_stall_timeout.max(1))
    }
}

fn default_cache_dir() -> String {
    "../tmp".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_download_stall_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    MOBILE_USER_AGENT.to_string()
}

fn default_share_page_url() -> String {
    SHARE_PAGE_URL.to_string()
}

fn default_false() -> bool {
    false
}
