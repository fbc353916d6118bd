//! Telegram MCP server.
//!
//! JSON-RPC over stdio (newline-delimited). Stdout carries only protocol
//! frames; all diagnostics go to stderr and the error log file. Each
//! `tools/call` runs on its own task so one slow Telegram round trip never
//! blocks the read loop, and a writer task serializes stdout access.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};

use tgmcp_core::port::TelegramPort;
use tgmcp_core::{config::Config, logging, registry};

const SERVER_NAME: &str = "tgmcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    id: Option<serde_json::Value>,
    method: String,
    params: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct RpcResponse<'a> {
    jsonrpc: &'a str,
    id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<serde_json::Value>,
}

fn respond_ok(id: serde_json::Value, result: serde_json::Value) -> RpcResponse<'static> {
    RpcResponse {
        jsonrpc: "2.0",
        id,
        result: Some(result),
        error: None,
    }
}

fn respond_err(id: serde_json::Value, code: i64, message: &str) -> RpcResponse<'static> {
    RpcResponse {
        jsonrpc: "2.0",
        id,
        result: None,
        error: Some(json!({ "code": code, "message": message })),
    }
}

/// Wraps tool output in an MCP text content result.
fn tool_result(text: String) -> serde_json::Value {
    json!({
        "content": [
            { "type": "text", "text": text }
        ]
    })
}

/// Handles the methods that need no Telegram access. Returns `None` when the
/// method is `tools/call` (handled on its own task) or a notification.
fn handle_local(req: &RpcRequest) -> Option<RpcResponse<'static>> {
    let id = req.id.clone()?;

    match req.method.as_str() {
        "initialize" => {
            let proto = req
                .params
                .as_ref()
                .and_then(|p| p.get("protocolVersion"))
                .and_then(|v| v.as_str())
                .unwrap_or("unknown");

            Some(respond_ok(
                id,
                json!({
                    "protocolVersion": proto,
                    "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
                    "capabilities": { "tools": {} }
                }),
            ))
        }

        "tools/list" => Some(respond_ok(id, json!({ "tools": registry::tool_specs() }))),

        "tools/call" => None,

        _ => Some(respond_err(id, -32601, "Method not found")),
    }
}

/// Runs one `tools/call` to completion. Dispatch never fails, so the response
/// is an error frame only when the params are structurally unusable.
async fn handle_tool_call(
    tg: &dyn TelegramPort,
    id: serde_json::Value,
    params: Option<serde_json::Value>,
) -> RpcResponse<'static> {
    let Some(params) = params else {
        return respond_err(id, -32602, "Missing params");
    };
    let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
        return respond_err(id, -32602, "Missing tool name");
    };
    let args = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| json!({}));

    let text = registry::dispatch(tg, name, &args).await;
    respond_ok(id, tool_result(text))
}

async fn serve(tg: Arc<dyn TelegramPort>) -> anyhow::Result<()> {
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();

    // All responses funnel through one writer so concurrent tool calls
    // cannot interleave partial frames.
    let (tx, mut rx) = mpsc::channel::<String>(32);
    let writer = tokio::spawn(async move {
        let mut stdout = tokio::io::stdout();
        while let Some(frame) = rx.recv().await {
            if stdout.write_all(frame.as_bytes()).await.is_err() {
                break;
            }
            if stdout.write_all(b"\n").await.is_err() {
                break;
            }
            let _ = stdout.flush().await;
        }
    });

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req = match serde_json::from_str::<RpcRequest>(&line) {
            Ok(req) => req,
            Err(err) => {
                error!(error = %err, "unparseable request line");
                continue;
            }
        };

        if let Some(resp) = handle_local(&req) {
            tx.send(serde_json::to_string(&resp)?).await?;
            continue;
        }

        // Notifications have no id and get no response.
        let Some(id) = req.id else { continue };

        if req.method == "tools/call" {
            let tg = Arc::clone(&tg);
            let tx = tx.clone();
            let params = req.params;
            tokio::spawn(async move {
                let resp = handle_tool_call(tg.as_ref(), id, params).await;
                match serde_json::to_string(&resp) {
                    Ok(frame) => {
                        let _ = tx.send(frame).await;
                    }
                    Err(err) => error!(error = %err, "failed to serialize response"),
                }
            });
        }
    }

    drop(tx);
    writer.await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("tgmcp: configuration error: {err}");
            std::process::exit(1);
        }
    };
    logging::init(&config.error_log_path)?;

    let client = match tgmcp_telegram::connect(&config).await {
        Ok(client) => client,
        Err(err) => {
            eprintln!("tgmcp: failed to connect to Telegram: {err}");
            std::process::exit(1);
        }
    };
    if !client.is_authorized().await? {
        eprintln!(
            "tgmcp: session is not authorized. Run tgmcp-login to generate a session first."
        );
        std::process::exit(1);
    }

    info!(version = SERVER_VERSION, "telegram MCP server running on stdio");
    let port: Arc<dyn TelegramPort> = Arc::new(tgmcp_telegram::GrammersPort::new(client));
    serve(port).await
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every port method defaults to `Unsupported`, which is all these
    /// protocol tests need.
    struct StubPort;

    #[async_trait::async_trait]
    impl TelegramPort for StubPort {}

    fn request(method: &str, params: Option<serde_json::Value>) -> RpcRequest {
        RpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: Some(json!(1)),
            method: method.to_string(),
            params,
        }
    }

    #[test]
    fn initialize_echoes_protocol_version() {
        let req = request("initialize", Some(json!({"protocolVersion": "2024-11-05"})));
        let resp = handle_local(&req).unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], SERVER_NAME);
    }

    #[test]
    fn tools_list_serves_the_full_registry() {
        let resp = handle_local(&request("tools/list", None)).unwrap();
        let tools = resp.result.unwrap()["tools"].as_array().unwrap().clone();
        assert_eq!(tools.len(), registry::tool_specs().len());
        assert!(tools
            .iter()
            .any(|t| t["name"].as_str() == Some("send_message")));
    }

    #[test]
    fn unknown_method_is_a_protocol_error() {
        let resp = handle_local(&request("prompts/list", None)).unwrap();
        let error = resp.error.unwrap();
        assert_eq!(error["code"], -32601);
    }

    #[test]
    fn notifications_get_no_response() {
        let req = RpcRequest {
            jsonrpc: Some("2.0".to_string()),
            id: None,
            method: "notifications/initialized".to_string(),
            params: None,
        };
        assert!(handle_local(&req).is_none());
    }

    #[tokio::test]
    async fn tool_call_without_params_is_rejected() {
        let resp = handle_tool_call(&StubPort, json!(1), None).await;
        assert_eq!(resp.error.unwrap()["code"], -32602);
    }

    #[tokio::test]
    async fn tool_call_failures_still_come_back_as_text_results() {
        let params = json!({"name": "get_me", "arguments": {}});
        let resp = handle_tool_call(&StubPort, json!(2), Some(params)).await;
        let result = resp.result.unwrap();
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.starts_with("An error occurred (code: "));
    }

    #[tokio::test]
    async fn unknown_tool_is_a_text_result_not_a_protocol_error() {
        let params = json!({"name": "warp_drive"});
        let resp = handle_tool_call(&StubPort, json!(3), Some(params)).await;
        let result = resp.result.unwrap();
        assert_eq!(result["content"][0]["text"], "Unknown tool: warp_drive");
    }
}
