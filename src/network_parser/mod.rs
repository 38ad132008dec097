pub mod models;
pub mod network;
pub mod page_data;
pub mod share_link;

pub use models::VideoInfo;
pub use network::{ClientProfile, DouyinClient, ResolveError};
