use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{
    error_codes, InitializeParams, InitializeResult, Request, Response, MCP_VERSION,
    SERVER_CAPABILITIES,
};
use crate::tools::base::MCPTool;

/// 工具信息结构
#[derive(Debug, Clone)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// 工具容器：注册在启动阶段完成，之后只读。
pub struct MCPServer {
    tools: Arc<RwLock<Vec<Box<dyn MCPTool>>>>,
}

impl Default for MCPServer {
    fn default() -> Self {
        Self::new()
    }
}

impl MCPServer {
    pub fn new() -> Self {
        Self {
            tools: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn register_tool(&self, tool: Box<dyn MCPTool>) -> Result<()> {
        let mut tools = self.tools.write().await;
        if tools.iter().any(|t| t.name() == tool.name()) {
            anyhow::bail!("工具重复注册: {}", tool.name());
        }
        tools.push(tool);
        Ok(())
    }

    pub async fn execute_tool(&self, tool_name: &str, params: Value) -> Result<Value> {
        let tools = self.tools.read().await;

        for tool in tools.iter() {
            if tool.name() == tool_name {
                tool.validate_params(&params)?;
                return tool.execute(params).await;
            }
        }

        Err(anyhow::anyhow!("工具不存在: {}", tool_name))
    }

    /// 获取所有工具列表
    pub async fn list_tools(&self) -> Vec<ToolInfo> {
        let tools = self.tools.read().await;
        tools
            .iter()
            .map(|tool| ToolInfo {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: serde_json::to_value(tool.parameters_schema())
                    .unwrap_or(serde_json::json!({})),
            })
            .collect()
    }

    /// 获取工具数量
    pub async fn tool_count(&self) -> usize {
        self.tools.read().await.len()
    }
}

/// stdio 模式的 MCP 服务器：按行读请求、按行写响应。
pub struct Server {
    /// 服务器名称
    name: String,
    /// 服务器版本
    version: String,
    /// 是否已初始化
    initialized: bool,
    tools: MCPServer,
}

impl Server {
    pub fn new(name: String, version: String, tools: MCPServer) -> Self {
        Self {
            name,
            version,
            initialized: false,
            tools,
        }
    }

    /// 运行服务器，直到 stdin EOF。
    pub async fn run(&mut self) -> Result<()> {
        let stdin = tokio::io::stdin();
        let mut stdout = tokio::io::stdout();
        let mut reader = BufReader::new(stdin);

        info!("MCP 服务器已启动，等待请求...");

        loop {
            let mut request_line = String::new();
            match reader.read_line(&mut request_line).await {
                Ok(0) => {
                    info!("客户端断开连接");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!("读取 stdin 失败: {}", e);
                    break;
                }
            }
            if request_line.trim().is_empty() {
                continue;
            }

            let request: Request = match serde_json::from_str(&request_line) {
                Ok(req) => req,
                Err(e) => {
                    let response = Response::error(
                        String::new(),
                        error_codes::PARSE_ERROR,
                        format!("Parse error: {}", e),
                    );
                    Self::write_response(&mut stdout, &response).await?;
                    continue;
                }
            };

            debug!("收到请求: {} ({})", request.method, request.id);
            let response = self.handle_request(request).await;
            Self::write_response(&mut stdout, &response).await?;
        }

        info!("MCP 服务器关闭");
        Ok(())
    }

    async fn write_response(stdout: &mut tokio::io::Stdout, response: &Response) -> Result<()> {
        let response_json = serde_json::to_string(response)?;
        stdout.write_all(response_json.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
        Ok(())
    }

    /// 处理 MCP 请求
    async fn handle_request(&mut self, request: Request) -> Response {
        if request.version != MCP_VERSION {
            return Response::error(
                request.id,
                error_codes::INVALID_REQUEST,
                format!("Unsupported protocol version: {}", request.version),
            );
        }

        match request.method.as_str() {
            "initialize" => {
                if self.initialized {
                    return Response::error(
                        request.id,
                        error_codes::INVALID_REQUEST,
                        "Server already initialized".to_string(),
                    );
                }

                match self.handle_initialize(&request.params) {
                    Ok(result) => {
                        self.initialized = true;
                        Response::success(
                            request.id,
                            serde_json::to_value(result).unwrap_or(Value::Null),
                        )
                    }
                    Err(e) => {
                        Response::error(request.id, error_codes::INVALID_PARAMS, e.to_string())
                    }
                }
            }
            _ => {
                if !self.initialized {
                    return Response::error(
                        request.id,
                        error_codes::INVALID_REQUEST,
                        "Server not initialized".to_string(),
                    );
                }

                match request.method.as_str() {
                    "shutdown" => {
                        self.initialized = false;
                        Response::success(request.id, Value::Null)
                    }
                    "tools/list" => self.handle_list_tools(request.id).await,
                    "tools/call" => self.handle_tool_call(request.id, &request.params).await,
                    _ => Response::error(
                        request.id,
                        error_codes::METHOD_NOT_FOUND,
                        format!("Method not found: {}", request.method),
                    ),
                }
            }
        }
    }

    /// 处理初始化请求
    fn handle_initialize(&self, params: &Value) -> Result<InitializeResult> {
        let params: InitializeParams = serde_json::from_value(params.clone())?;

        info!(
            "客户端已连接: {} {}",
            params.client_name, params.client_version
        );

        Ok(InitializeResult {
            server_name: self.name.clone(),
            server_version: self.version.clone(),
            protocol_version: MCP_VERSION.to_string(),
            capabilities: SERVER_CAPABILITIES.iter().map(|&s| s.to_string()).collect(),
        })
    }

    /// 处理工具列表请求
    async fn handle_list_tools(&self, id: String) -> Response {
        let tool_list: Vec<Value> = self
            .tools
            .list_tools()
            .await
            .into_iter()
            .map(|tool| {
                serde_json::json!({
                    "name": tool.name,
                    "description": tool.description,
                    "inputSchema": tool.parameters,
                })
            })
            .collect();

        Response::success(id, serde_json::json!({ "tools": tool_list }))
    }

    /// 处理工具调用请求
    async fn handle_tool_call(&self, id: String, params: &Value) -> Response {
        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => {
                return Response::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing tool name".to_string(),
                );
            }
        };

        let tool_params = params
            .get("arguments")
            .cloned()
            .unwrap_or(serde_json::json!({}));

        match self.tools.execute_tool(tool_name, tool_params).await {
            Ok(result) => Response::success(
                id,
                serde_json::json!({
                    "content": [
                        {
                            "type": "text",
                            "text": result.to_string()
                        }
                    ]
                }),
            ),
            Err(e) => Response::error(
                id,
                error_codes::TOOL_EXECUTION_FAILED,
                format!("工具执行失败: {}", e),
            ),
        }
    }
}
