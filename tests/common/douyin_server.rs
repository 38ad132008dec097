//! Minimal HTTP/1.1 server imitating the share redirect, the detail page and
//! the media host for integration tests.
//!
//! Routes:
//! - `GET /s/{id}/`            302 to `/share/video/{id}/?region=CN`
//! - `GET /share/video/{id}/`  200, redirect landing page
//! - `GET /detail/{id}`        detail page; shape depends on the id
//! - `GET /aweme/play/{id}`    media body; `playwm` variant returns 403

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use serde_json::json;

/// Video page, media with Content-Length.
pub const VIDEO_ID: &str = "7123456789012345678";
/// Note page, media without Content-Length.
pub const NOTE_ID: &str = "7000000000000000002";
/// Page whose loaderData has neither known key.
pub const UNKNOWN_SHAPE_ID: &str = "7000000000000000003";
/// Detail page answers 404.
pub const MISSING_PAGE_ID: &str = "7000000000000000004";
/// Video page with a blank description.
pub const UNTITLED_ID: &str = "7000000000000000005";

pub const VIDEO_DESC: &str = "A:B Test";
pub const NOTE_DESC: &str = "图集 <1>";
pub const KNOWN_LEN: usize = 20_000;
pub const UNKNOWN_LEN: usize = 10_000;

pub struct DouyinServer {
    pub base: String,
}

impl DouyinServer {
    /// Share text the way the app copies it, with the link in the middle.
    pub fn share_text(&self, id: &str) -> String {
        format!("7.43 复制打开抖音，看看【测试作品】 {}/s/{}/ a@b.cn 01/01", self.base, id)
    }

    pub fn share_page_template(&self) -> String {
        format!("{}/detail/{{video_id}}", self.base)
    }
}

pub fn media_body(len: usize) -> Vec<u8> {
    (0u8..=250).cycle().take(len).collect()
}

/// Starts the server in a background thread. Runs until the process exits.
pub fn start() -> DouyinServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let base = format!("http://127.0.0.1:{port}");
    let base_for_thread = base.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let base = base_for_thread.clone();
            thread::spawn(move || handle(stream, &base));
        }
    });
    DouyinServer { base }
}

fn handle(mut stream: TcpStream, base: &str) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let Some(path) = read_request_path(&stream) else {
        return;
    };
    let path = path.split('?').next().unwrap_or("").to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match segments.as_slice() {
        ["s", id] => {
            let head = format!(
                "HTTP/1.1 302 Found\r\nLocation: /share/video/{id}/?region=CN\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            );
            let _ = stream.write_all(head.as_bytes());
        }
        ["share", "video", _id] => {
            respond(&mut stream, "200 OK", "text/html", b"<html>landing</html>");
        }
        ["detail", id] => detail_page(&mut stream, base, id),
        ["aweme", "play", id] => media(&mut stream, id),
        ["aweme", "playwm", _] => respond(&mut stream, "403 Forbidden", "text/plain", b"watermarked"),
        _ => respond(&mut stream, "404 Not Found", "text/plain", b"not found"),
    }
}

fn read_request_path(stream: &TcpStream) -> Option<String> {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let path = request_line.split_whitespace().nth(1)?.to_string();
    // drain headers
    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => break,
            Ok(_) if line.trim().is_empty() => break,
            Ok(_) => continue,
            Err(_) => return None,
        }
    }
    Some(path)
}

fn respond(stream: &mut TcpStream, status: &str, content_type: &str, body: &[u8]) {
    let head = format!(
        "HTTP/1.1 {status}\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    );
    let _ = stream.write_all(head.as_bytes());
    let _ = stream.write_all(body);
}

fn page_json(key: &str, desc: &str, play_url: &str) -> serde_json::Value {
    json!({
        "loaderData": {
            "_layout": { "ok": true },
            key: {
                "videoInfoRes": {
                    "item_list": [{
                        "desc": desc,
                        "video": { "play_addr": { "url_list": [play_url, "http://backup.invalid/"] } }
                    }]
                }
            }
        }
    })
}

fn detail_page(stream: &mut TcpStream, base: &str, id: &str) {
    let play_url = format!("{base}/aweme/playwm/{id}");
    let data = match id {
        VIDEO_ID => page_json("video_(id)/page", VIDEO_DESC, &play_url),
        NOTE_ID => page_json("note_(id)/page", NOTE_DESC, &play_url),
        UNTITLED_ID => page_json("video_(id)/page", "   ", &play_url),
        UNKNOWN_SHAPE_ID => json!({ "loaderData": { "live_(id)/page": {} } }),
        _ => {
            respond(stream, "404 Not Found", "text/html", b"<html>gone</html>");
            return;
        }
    };
    let html = format!(
        "<html><head><script>window.__INIT__ = 1;</script></head><body>\n\
         <script>window._ROUTER_DATA = {}\n</script>\n\
         <script>window.other = {{}};</script></body></html>",
        serde_json::to_string_pretty(&data).unwrap()
    );
    respond(stream, "200 OK", "text/html; charset=utf-8", html.as_bytes());
}

fn media(stream: &mut TcpStream, id: &str) {
    if id == NOTE_ID {
        // body delimited by connection close
        let body = media_body(UNKNOWN_LEN);
        let head = "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nConnection: close\r\n\r\n";
        let _ = stream.write_all(head.as_bytes());
        for chunk in body.chunks(3000) {
            let _ = stream.write_all(chunk);
            let _ = stream.flush();
        }
        let _ = stream.shutdown(std::net::Shutdown::Write);
        return;
    }
    respond(stream, "200 OK", "video/mp4", &media_body(KNOWN_LEN));
}
