//! JSON-RPC 2.0 报文类型（MCP stdio 传输，一行一个 JSON 对象）。

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;

// ====== INCOMING (host -> server) ======

/// 请求、通知或（忽略的）客户端响应。
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub jsonrpc: Option<String>,
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub params: Value,
}

impl IncomingMessage {
    /// 不是合法 JSON 时返回 `-32700`；是 JSON 但不是请求对象时返回 `-32600`。
    pub fn from_json_line(line: &str) -> Result<Self, RpcError> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| RpcError::new(PARSE_ERROR, format!("Parse error: {e}")))?;
        if !value.is_object() {
            return Err(RpcError::new(
                INVALID_REQUEST,
                "Invalid Request: expected a JSON object",
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| RpcError::new(INVALID_REQUEST, format!("Invalid Request: {e}")))
    }

    /// 没有 id 的消息是通知，不需要回复。
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

// ====== OUTGOING (server -> host) ======

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(INVALID_PARAMS, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(METHOD_NOT_FOUND, format!("Method not found: {method}"))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Response {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: Value,
}

impl Notification {
    /// `notifications/progress`；总大小未知时省略 `total`。
    pub fn progress(token: Value, progress: u64, total: Option<u64>) -> Self {
        let mut params = serde_json::Map::new();
        params.insert("progressToken".to_string(), token);
        params.insert("progress".to_string(), Value::from(progress));
        if let Some(total) = total {
            params.insert("total".to_string(), Value::from(total));
        }
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: "notifications/progress",
            params: Value::Object(params),
        }
    }

    /// `notifications/message` 日志消息。
    pub fn log(level: &str, logger: &str, data: &str) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            method: "notifications/message",
            params: serde_json::json!({
                "level": level,
                "logger": logger,
                "data": data,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Outgoing {
    Response(Response),
    Notification(Notification),
}

impl Outgoing {
    /// 序列化为单行 JSON（写入 stdout）。
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl From<Response> for Outgoing {
    fn from(value: Response) -> Self {
        Outgoing::Response(value)
    }
}

impl From<Notification> for Outgoing {
    fn from(value: Notification) -> Self {
        Outgoing::Notification(value)
    }
}
