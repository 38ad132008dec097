//! 抖音无水印视频解析/下载 MCP 服务器。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/缓存目录/文件名等基础设施
//! - `network_parser`：分享链接解析，得到无水印播放地址
//! - `download`：流式下载与进度上报
//! - `server`：MCP（JSON-RPC over stdio）协议层、工具与资源

pub mod base_system;
pub mod download;
pub mod network_parser;
pub mod server;
