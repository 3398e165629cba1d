//! abstat MCP Server
//!
//! MCP Server (protocol revision 2025-11-25) over newline-delimited JSON-RPC
//! on stdin/stdout. Logs go to stderr.
//!
//! Tools:
//! - one tool per registered calculator (proportion_test, mean_test,
//!   plan_proportion, plan_mean, snorm_cdf, snorm_inv, t_cdf, t_inv)
//! - help: Get documentation for a calculator
//! - list_functions: List available calculators

mod config;

use abstat_core::AbError;
use abstat_plugin::{CalcContext, FunctionMeta, PluginRegistry};
use config::ServerConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value as JsonValue};
use std::io::{self, BufRead, Write};

const PROTOCOL_VERSION: &str = "2025-11-25";
const SERVER_NAME: &str = "abstat";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

// MCP Protocol types
#[derive(Debug, Deserialize)]
struct McpRequest {
    jsonrpc: String,
    id: Option<JsonValue>,
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct McpResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<McpError>,
}

#[derive(Debug, Serialize)]
struct McpError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
}

impl McpError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self { code: -32602, message: message.into(), data: None }
    }
}

impl McpResponse {
    fn failure(id: Option<JsonValue>, error: McpError) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }
}

/// Calculator registry plus the defaults applied to every call
struct Server {
    registry: PluginRegistry,
    ctx: CalcContext,
}

impl Server {
    fn new(config: &ServerConfig) -> Self {
        Self {
            registry: abstat_stats::load_abtest_library(PluginRegistry::new()),
            ctx: config.calc_context(),
        }
    }

    fn handle_request(&self, request: &McpRequest) -> McpResponse {
        if request.jsonrpc != "2.0" {
            return McpResponse::failure(
                request.id.clone(),
                McpError {
                    code: -32600,
                    message: format!("Invalid request: unsupported jsonrpc version '{}'", request.jsonrpc),
                    data: None,
                },
            );
        }

        let result = match request.method.as_str() {
            // Lifecycle
            "initialize" => self.handle_initialize(&request.params),
            "initialized" => Ok(json!({})),
            "ping" => Ok(json!({})),

            // Tools
            "tools/list" => self.handle_tools_list(),
            "tools/call" => self.handle_tool_call(&request.params),

            _ => Err(McpError {
                code: -32601,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        match result {
            Ok(r) => McpResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id.clone(),
                result: Some(r),
                error: None,
            },
            Err(e) => McpResponse::failure(request.id.clone(), e),
        }
    }

    fn handle_initialize(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let client_info = params.as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(|n| n.as_str())
            .unwrap_or("unknown");

        // Use client's protocol version for compatibility
        let client_protocol = params.as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(|v| v.as_str())
            .unwrap_or(PROTOCOL_VERSION);

        tracing::info!(client = client_info, protocol = client_protocol, "client connected");

        Ok(json!({
            "protocolVersion": client_protocol,
            "serverInfo": {
                "name": SERVER_NAME,
                "version": SERVER_VERSION,
                "description": "Significance tests and sample-size planning for A/B experiments"
            },
            "capabilities": {
                "tools": {
                    "listChanged": false
                }
            },
            "instructions": format!(
                "abstat compares a control and a variant arm. Use proportion_test for conversion counts, mean_test for continuous metrics, and plan_proportion / plan_mean before an experiment starts. Omitted alpha defaults to {}, omitted power to {}. Call help for argument details.",
                self.ctx.default_alpha, self.ctx.default_power
            )
        }))
    }

    fn handle_tools_list(&self) -> Result<JsonValue, McpError> {
        let mut tools: Vec<JsonValue> = self.registry.metas().iter().map(tool_schema).collect();

        tools.push(json!({
            "name": "help",
            "description": "Get documentation for a calculator, or general help.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "name": {
                        "type": "string",
                        "description": "Calculator name. Omit for general help."
                    }
                }
            }
        }));
        tools.push(json!({
            "name": "list_functions",
            "description": "List all available calculators, optionally by category.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "description": "Filter by category",
                        "enum": ["abtest/significance", "abtest/planning", "stats/distribution"]
                    }
                }
            }
        }));

        Ok(json!({ "tools": tools }))
    }

    fn handle_tool_call(&self, params: &Option<JsonValue>) -> Result<JsonValue, McpError> {
        let params = params.as_ref().ok_or_else(|| McpError::invalid_params("Missing params"))?;

        let name = params.get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| McpError::invalid_params("Missing tool name"))?;

        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        match name {
            "help" => self.tool_help(&args),
            "list_functions" => self.tool_list_functions(&args),
            _ if self.registry.get_function(name).is_some() => Ok(self.tool_calculate(name, &args)),
            _ => Err(McpError::invalid_params(format!("Unknown tool: {}", name))),
        }
    }

    fn tool_calculate(&self, name: &str, args: &JsonValue) -> JsonValue {
        match self.registry.call_function(name, args, &self.ctx) {
            Ok(data) => json!({
                "content": [{ "type": "text", "text": summarize(name, &data) }],
                "data": data,
                "isError": false
            }),
            Err(err) => tool_error(&err),
        }
    }

    fn tool_help(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let name = args.get("name").and_then(|v| v.as_str());
        match self.registry.help(name) {
            Ok(help) => Ok(json!({
                "content": [{ "type": "text", "text": format_help(&help) }],
                "data": help
            })),
            Err(err) => Ok(tool_error(&err)),
        }
    }

    fn tool_list_functions(&self, args: &JsonValue) -> Result<JsonValue, McpError> {
        let category = args.get("category").and_then(|v| v.as_str());
        let functions = self.registry.list_functions(category);
        let count = functions.as_array().map_or(0, |a| a.len());
        Ok(json!({
            "content": [{ "type": "text", "text": format!("{} functions listed", count) }],
            "data": functions
        }))
    }
}

/// MCP tool descriptor derived from calculator metadata
fn tool_schema(meta: &FunctionMeta) -> JsonValue {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for arg in meta.args {
        let mut prop = json!({
            "type": arg.json_type(),
            "description": arg.description,
        });
        if let Some(default) = arg.default {
            prop["description"] = json!(format!("{} (default: {})", arg.description, default));
        }
        properties.insert(arg.name.to_string(), prop);
        if !arg.optional {
            required.push(arg.name);
        }
    }

    json!({
        "name": meta.name,
        "description": format!("{}. Usage: {}", meta.description, meta.usage),
        "inputSchema": {
            "type": "object",
            "properties": properties,
            "required": required
        }
    })
}

fn tool_error(err: &AbError) -> JsonValue {
    json!({
        "content": [{ "type": "text", "text": format!("Error: {}", err) }],
        "data": err,
        "isError": true
    })
}

/// One-line human summary of a calculator result
fn summarize(name: &str, data: &JsonValue) -> String {
    if let Some(p) = data.get("pValue").and_then(|v| v.as_f64()) {
        let statistic = data.get("statistic").and_then(|v| v.as_f64()).unwrap_or(f64::NAN);
        let effect = data.get("effectAbsolute").and_then(|v| v.as_f64()).unwrap_or(f64::NAN);
        let verdict = data.get("interpretation").and_then(|v| v.as_str()).unwrap_or("unknown");
        return format!(
            "{}: statistic = {:.4}, p = {:.4}, effect = {:.4} ({})",
            name, statistic, p, effect, verdict
        );
    }

    if let Some(n) = data.get("requiredSampleSizePerGroup").and_then(|v| v.as_u64()) {
        let mut out = format!("{}: {} per group", name, n);
        if let Some(days) = data.get("estimatedDurationDays").and_then(|v| v.as_f64()) {
            out.push_str(&format!(", about {} days", days));
        }
        return out;
    }

    format!("{} = {}", name, data)
}

fn format_help(help: &JsonValue) -> String {
    let mut out = String::new();
    if let Some(n) = help.get("name").and_then(|v| v.as_str()) {
        out.push_str(&format!("# {}\n\n", n));
    }
    if let Some(d) = help.get("description").and_then(|v| v.as_str()) {
        out.push_str(&format!("{}\n\n", d));
    }
    if let Some(u) = help.get("usage").and_then(|v| v.as_str()) {
        out.push_str(&format!("**Usage:** `{}`\n\n", u));
    }
    if let Some(cats) = help.get("functions").and_then(|v| v.as_object()) {
        for (cat, names) in cats {
            out.push_str(&format!("- {}: {}\n", cat, names));
        }
    }
    out
}

/// Write one JSON-RPC frame to stdout
fn send(response: &McpResponse) -> io::Result<()> {
    let frame = serde_json::to_string(response).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", frame)?;
    stdout.flush()
}

fn main() {
    let (config, filter) = match ServerConfig::from_env().and_then(|c| c.env_filter().map(|f| (c, f))) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("abstat-mcp: invalid configuration: {}", e);
            std::process::exit(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let server = Server::new(&config);

    tracing::info!(version = SERVER_VERSION, protocol = PROTOCOL_VERSION, "abstat MCP server started");
    tracing::info!(alpha = config.default_alpha, power = config.default_power, "calculation defaults");

    // Use BufReader for stdin (line-based protocol)
    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                // EOF - client disconnected
                tracing::info!("client disconnected");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                tracing::debug!(bytes = line.len(), "request received");

                let request: McpRequest = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        tracing::warn!(error = %e, "unparseable request");
                        let response = McpResponse::failure(
                            None,
                            McpError {
                                code: -32700,
                                message: format!("Parse error: {}", e),
                                data: None,
                            },
                        );
                        if let Err(e) = send(&response) {
                            tracing::error!(error = %e, "failed to write response");
                            break;
                        }
                        continue;
                    }
                };

                let response = server.handle_request(&request);

                // Notifications (no id) should NOT receive a response
                if request.id.is_none() {
                    tracing::debug!(method = %request.method, "notification processed");
                    continue;
                }

                if let Err(e) = send(&response) {
                    tracing::error!(error = %e, "failed to write response");
                    break;
                }
                tracing::debug!(method = %request.method, "response sent");
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to read input");
                break;
            }
        }
    }

    tracing::info!("server shutting down");
}
