use std::path::PathBuf;

use crate::base_system::context::Config;
use crate::download::VideoDownloader;
use crate::network_parser::{DouyinClient, ResolveError};

/// 各请求共享的只读状态；不持有任何跨请求的可变数据。
#[derive(Clone)]
pub struct AppState {
    pub client: DouyinClient,
    pub downloader: VideoDownloader,
    pub cache_dir: PathBuf,
}

impl AppState {
    pub fn from_config(config: &Config) -> Result<Self, ResolveError> {
        let client = DouyinClient::from_config(config)?;
        let downloader = VideoDownloader::new(client.http().clone(), config.download_stall_timeout());
        Ok(Self {
            client,
            downloader,
            cache_dir: config.cache_dir_path(),
        })
    }
}
