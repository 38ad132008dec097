pub mod cache_dir;
pub mod config;
pub mod context;
pub mod logging;
pub mod video_paths;
