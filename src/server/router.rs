use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use super::context::RequestContext;
use super::protocol::{IncomingMessage, Outgoing, PROTOCOL_VERSION, Response, RpcError};
use super::routes::{resources, tools};
use super::state::AppState;

pub const SERVER_NAME: &str = "douyin-mcp-server";

#[derive(Debug, Deserialize)]
struct CallToolParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
    #[serde(default, rename = "_meta")]
    meta: Option<RequestMeta>,
}

#[derive(Debug, Deserialize)]
struct RequestMeta {
    #[serde(default, rename = "progressToken")]
    progress_token: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ReadResourceParams {
    uri: String,
}

/// 处理一条消息；通知与客户端响应返回 `None`。
pub async fn handle_message(
    state: &AppState,
    msg: IncomingMessage,
    outbox: &UnboundedSender<Outgoing>,
) -> Option<Outgoing> {
    let Some(method) = msg.method.as_deref() else {
        debug!("忽略客户端响应: {:?}", msg.id);
        return None;
    };

    let Some(id) = msg.id.clone() else {
        debug!("收到通知: {method}");
        return None;
    };

    let result = dispatch(state, method, msg.params, outbox).await;
    let response = match result {
        Ok(value) => Response::success(id, value),
        Err(e) => {
            warn!("请求 {method} 失败: {} ({})", e.message, e.code);
            Response::failure(id, e)
        }
    };
    Some(response.into())
}

async fn dispatch(
    state: &AppState,
    method: &str,
    params: Value,
    outbox: &UnboundedSender<Outgoing>,
) -> Result<Value, RpcError> {
    match method {
        "initialize" => Ok(initialize_result()),
        "ping" => Ok(json!({})),
        "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
        "tools/call" => call_tool(state, params, outbox).await,
        "resources/list" => Ok(json!({ "resources": [] })),
        "resources/templates/list" => Ok(json!({
            "resourceTemplates": resources::resource_templates()
        })),
        "resources/read" => {
            let p: ReadResourceParams = parse_params(params)?;
            resources::read_resource(state, &p.uri).await
        }
        "logging/setLevel" => Ok(json!({})),
        other => Err(RpcError::method_not_found(other)),
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
            "resources": { "subscribe": false, "listChanged": false },
            "logging": {},
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}

async fn call_tool(
    state: &AppState,
    params: Value,
    outbox: &UnboundedSender<Outgoing>,
) -> Result<Value, RpcError> {
    let p: CallToolParams = parse_params(params)?;
    let share_link = p
        .arguments
        .get("share_link")
        .and_then(Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("missing string argument: share_link"))?;

    info!("调用工具: {}", p.name);
    let output = match p.name.as_str() {
        tools::GET_DOWNLOAD_LINK => tools::get_download_link(state, share_link).await,
        tools::PARSE_VIDEO_INFO => tools::parse_video_info(state, share_link).await,
        tools::DOWNLOAD_VIDEO => {
            let token = p.meta.and_then(|m| m.progress_token);
            let ctx = RequestContext::new(outbox.clone(), token);
            tools::download_video(state, share_link, &ctx).await
        }
        other => return Err(RpcError::invalid_params(format!("Unknown tool: {other}"))),
    };
    Ok(output.to_call_result())
}

fn parse_params<T: for<'de> Deserialize<'de>>(params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params).map_err(|e| RpcError::invalid_params(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::base_system::context::Config;
    use crate::server::protocol::{INVALID_PARAMS, METHOD_NOT_FOUND};
    use tokio::sync::mpsc::unbounded_channel;

    fn state() -> AppState {
        AppState::from_config(&Config::default()).unwrap()
    }

    fn request(id: i64, method: &str, params: Value) -> IncomingMessage {
        IncomingMessage {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(id)),
            method: Some(method.to_string()),
            params,
        }
    }

    async fn call(msg: IncomingMessage) -> Option<Value> {
        let (tx, _rx) = unbounded_channel();
        let out = handle_message(&state(), msg, &tx).await?;
        Some(serde_json::from_str(&out.to_json_line().unwrap()).unwrap())
    }

    #[tokio::test]
    async fn initialize_reports_protocol_version() {
        let v = call(request(1, "initialize", json!({}))).await.unwrap();
        assert_eq!(v["result"]["protocolVersion"], json!(PROTOCOL_VERSION));
        assert_eq!(v["result"]["serverInfo"]["name"], json!(SERVER_NAME));
    }

    #[tokio::test]
    async fn tools_list_has_three_tools() {
        let v = call(request(2, "tools/list", Value::Null)).await.unwrap();
        assert_eq!(v["result"]["tools"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_method_is_rejected() {
        let v = call(request(3, "bogus/method", Value::Null)).await.unwrap();
        assert_eq!(v["error"]["code"], json!(METHOD_NOT_FOUND));
        assert_eq!(v["id"], json!(3));
    }

    #[tokio::test]
    async fn notifications_get_no_reply() {
        let mut msg = request(0, "notifications/initialized", Value::Null);
        msg.id = None;
        assert!(call(msg).await.is_none());

        let mut unknown = request(0, "notifications/whatever", Value::Null);
        unknown.id = None;
        assert!(call(unknown).await.is_none());
    }

    #[tokio::test]
    async fn missing_share_link_is_invalid_params() {
        let v = call(request(
            4,
            "tools/call",
            json!({ "name": tools::GET_DOWNLOAD_LINK, "arguments": {} }),
        ))
        .await
        .unwrap();
        assert_eq!(v["error"]["code"], json!(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn unknown_tool_is_invalid_params() {
        let v = call(request(
            5,
            "tools/call",
            json!({ "name": "nope", "arguments": { "share_link": "x" } }),
        ))
        .await
        .unwrap();
        assert_eq!(v["error"]["code"], json!(INVALID_PARAMS));
    }

    #[tokio::test]
    async fn text_without_link_yields_error_envelope() {
        let v = call(request(
            6,
            "tools/call",
            json!({ "name": tools::GET_DOWNLOAD_LINK, "arguments": { "share_link": "没有链接" } }),
        ))
        .await
        .unwrap();
        assert_eq!(v["result"]["isError"], json!(true));
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert_eq!(envelope["status"], json!("error"));
        assert!(
            envelope["error"]
                .as_str()
                .unwrap()
                .starts_with("获取下载链接失败: ")
        );
    }

    #[tokio::test]
    async fn download_without_link_yields_error_envelope() {
        let v = call(request(
            7,
            "tools/call",
            json!({ "name": tools::DOWNLOAD_VIDEO, "arguments": { "share_link": "" } }),
        ))
        .await
        .unwrap();
        let text = v["result"]["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert!(envelope["error"].as_str().unwrap().starts_with("下载视频失败: "));
    }

    #[tokio::test]
    async fn bad_resource_uri_is_invalid_params() {
        let v = call(request(
            8,
            "resources/read",
            json!({ "uri": "https://example.com" }),
        ))
        .await
        .unwrap();
        assert_eq!(v["error"]["code"], json!(INVALID_PARAMS));
    }
}
