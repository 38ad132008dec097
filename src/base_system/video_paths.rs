use std::path::{Path, PathBuf};

/// 视频标题中不能出现在文件名里的字符。
const ILLEGAL_FILENAME_CHARS: [char; 9] = ['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// 把文件名非法字符替换为 `_`。
pub fn sanitize_title(title: &str) -> String {
    title
        .chars()
        .map(|ch| {
            if ILLEGAL_FILENAME_CHARS.contains(&ch) {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

pub fn video_file_name(title: &str) -> String {
    format!("{title}.mp4")
}

pub fn video_file_path(dest_dir: &Path, title: &str) -> PathBuf {
    dest_dir.join(video_file_name(title))
}
