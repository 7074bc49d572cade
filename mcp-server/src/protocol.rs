//! JSON-RPC 2.0 framing for the MCP stdio transport.
//!
//! # Design
//! One JSON message per line in each direction. `Server::handle_line` maps a
//! single input line to at most one response line, so the whole protocol
//! surface is testable without pipes. Notifications (messages without an
//! `id`) never get a response.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use reader_core::{CallContext, Client, Transport, UreqTransport};

use crate::tools::Tool;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "readwise-reader";

pub const PARSE_ERROR: i64 = -32700;
pub const INVALID_REQUEST: i64 = -32600;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Deserialize)]
pub struct Request {
    pub jsonrpc: String,
    #[serde(default)]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
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
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, error: RpcError) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

impl RpcError {
    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Map<String, Value>,
}

/// An MCP server bound to one Reader client.
pub struct Server<T = UreqTransport> {
    client: Client<T>,
}

impl<T: Transport> Server<T> {
    pub fn new(client: Client<T>) -> Self {
        Self { client }
    }

    /// Read requests from `input` until EOF, writing one response line per
    /// request. Only I/O failures end the loop.
    pub fn serve(&self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line.context("failed to read request")?;
            if line.trim().is_empty() {
                continue;
            }
            let Some(response) = self.handle_line(&line) else {
                continue;
            };
            serde_json::to_writer(&mut output, &response).context("failed to write response")?;
            output.write_all(b"\n").context("failed to write response")?;
            output.flush().context("failed to write response")?;
        }
        info!("input closed, shutting down");
        Ok(())
    }

    pub fn handle_line(&self, line: &str) -> Option<Response> {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "unparseable message");
                return Some(Response::failure(
                    Value::Null,
                    RpcError::new(PARSE_ERROR, format!("parse error: {err}")),
                ));
            }
        };

        let id = value.get("id").cloned().unwrap_or(Value::Null);
        let request: Request = match serde_json::from_value(value) {
            Ok(request) => request,
            Err(err) => {
                return Some(Response::failure(
                    id,
                    RpcError::new(INVALID_REQUEST, format!("invalid request: {err}")),
                ));
            }
        };
        if request.jsonrpc != "2.0" {
            return Some(Response::failure(
                id,
                RpcError::new(INVALID_REQUEST, "invalid request: jsonrpc must be \"2.0\""),
            ));
        }

        self.dispatch(request)
    }

    fn dispatch(&self, request: Request) -> Option<Response> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification");
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(initialize_result()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({
                "tools": Tool::ALL.iter().map(Tool::definition).collect::<Vec<_>>(),
            })),
            "tools/call" => self.call_tool(request.params),
            other => Err(RpcError::new(
                METHOD_NOT_FOUND,
                format!("method not found: {other}"),
            )),
        };

        Some(match outcome {
            Ok(result) => Response::success(id, result),
            Err(error) => Response::failure(id, error),
        })
    }

    fn call_tool(&self, params: Value) -> std::result::Result<Value, RpcError> {
        let params: CallParams = serde_json::from_value(params)
            .map_err(|err| RpcError::new(INVALID_PARAMS, format!("invalid params: {err}")))?;
        let tool = Tool::parse(&params.name).ok_or_else(|| {
            RpcError::new(INVALID_PARAMS, format!("unknown tool: {}", params.name))
        })?;

        info!(%tool, "calling tool");
        let result = tool.call(&self.client, &CallContext::background(), &params.arguments);
        serde_json::to_value(result)
            .map_err(|err| RpcError::new(INTERNAL_ERROR, format!("internal error: {err}")))
    }
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": {
            "tools": { "listChanged": false },
        },
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
    })
}
