//! 分享页内嵌 `window._ROUTER_DATA` 的提取与解析。
//!
//! 同一域名下有两种页面模板：视频页 `video_(id)/page` 与图集页
//! `note_(id)/page`，二者的记录结构相同，但挂在不同的键下。

use regex::Regex;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::sync::OnceLock;

use super::network::ResolveError;

const VIDEO_PAGE_KEY: &str = "video_(id)/page";
const NOTE_PAGE_KEY: &str = "note_(id)/page";

static RE_ROUTER_DATA: OnceLock<Regex> = OnceLock::new();

fn re_router_data() -> &'static Regex {
    // (?s) 让 . 匹配换行
    RE_ROUTER_DATA.get_or_init(|| {
        Regex::new(r"(?s)window\._ROUTER_DATA\s*=\s*(.*?)</script>").expect("compile RE_ROUTER_DATA")
    })
}

/// 截取 `window._ROUTER_DATA = ` 与其后第一个 `</script>` 之间的文本。
pub fn extract_router_data(html: &str) -> Option<&str> {
    let caps = re_router_data().captures(html)?;
    let raw = caps.get(1)?.as_str().trim();
    if raw.is_empty() { None } else { Some(raw) }
}

#[derive(Debug, Deserialize)]
struct RouterData {
    #[serde(rename = "loaderData", default)]
    loader_data: Map<String, Value>,
}

/// 页面模板类型，按键存在与否选择，视频页优先。
#[derive(Debug, Clone, Copy)]
pub enum PageShape<'a> {
    Video(&'a Value),
    Note(&'a Value),
}

impl<'a> PageShape<'a> {
    fn detect(loader_data: &'a Map<String, Value>) -> Option<Self> {
        if let Some(page) = loader_data.get(VIDEO_PAGE_KEY) {
            return Some(PageShape::Video(page));
        }
        loader_data.get(NOTE_PAGE_KEY).map(PageShape::Note)
    }

    pub fn key(&self) -> &'static str {
        match self {
            PageShape::Video(_) => VIDEO_PAGE_KEY,
            PageShape::Note(_) => NOTE_PAGE_KEY,
        }
    }

    fn first_item(&self) -> Result<AwemeItem, ResolveError> {
        match self {
            PageShape::Video(page) => video_page_item(page),
            PageShape::Note(page) => note_page_item(page),
        }
    }
}

fn video_page_item(page: &Value) -> Result<AwemeItem, ResolveError> {
    first_of_item_list(page.pointer("/videoInfoRes/item_list"))
}

fn note_page_item(page: &Value) -> Result<AwemeItem, ResolveError> {
    first_of_item_list(page.pointer("/videoInfoRes/item_list"))
}

fn first_of_item_list(list: Option<&Value>) -> Result<AwemeItem, ResolveError> {
    let first = list
        .and_then(Value::as_array)
        .and_then(|items| items.first())
        .ok_or(ResolveError::EmptyItemList)?;
    AwemeItem::deserialize(first).map_err(ResolveError::Json)
}

#[derive(Debug, Deserialize)]
struct AwemeItem {
    #[serde(default)]
    desc: Option<String>,
    #[serde(default)]
    video: Option<AwemeVideo>,
}

#[derive(Debug, Deserialize)]
struct AwemeVideo {
    #[serde(default)]
    play_addr: Option<PlayAddr>,
}

#[derive(Debug, Deserialize)]
struct PlayAddr {
    #[serde(default)]
    url_list: Vec<String>,
}

/// 从页面 JSON 中取出的原始记录（尚未去水印、未清洗标题）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRecord {
    pub shape_key: &'static str,
    pub play_url: String,
    pub desc: String,
}

/// 解析内嵌 JSON，定位页面模板并读取第一条记录。
pub fn parse_page_record(raw_json: &str) -> Result<PageRecord, ResolveError> {
    let data: RouterData = serde_json::from_str(raw_json).map_err(ResolveError::Json)?;
    let shape = PageShape::detect(&data.loader_data).ok_or(ResolveError::UnknownPageShape)?;
    let item = shape.first_item()?;

    let play_url = item
        .video
        .and_then(|v| v.play_addr)
        .and_then(|p| p.url_list.into_iter().next())
        .ok_or(ResolveError::MissingPlayUrl)?;

    Ok(PageRecord {
        shape_key: shape.key(),
        play_url,
        desc: item.desc.unwrap_or_default().trim().to_string(),
    })
}
