use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

mod cli;
mod config;
mod errors;
mod mcp;
mod tools;

use cli::{HomebrewClient, ToolRegistry, UpdateReconciler};
use config::GatewayConfig;
use mcp::server::MCPServer;
use tools::CliHelpTool;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载环境变量
    dotenv::dotenv().ok();

    // 初始化日志（stdout 留给 MCP 协议，日志走 stderr）
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "open_cli_mcp=info".to_string()),
        )
        .init();

    info!("启动 Open CLI MCP 网关...");

    let config = GatewayConfig::from_env();
    let registry = ToolRegistry::new();
    let brew = HomebrewClient::detect(config.clone());
    let reconciler = Arc::new(UpdateReconciler::new(registry, brew, config.clone()));

    let server = MCPServer::new();

    let mut all_tools: Vec<Box<dyn tools::MCPTool>> = Vec::new();
    all_tools.push(Box::new(CliHelpTool::new(registry, &config)));
    all_tools.extend(tools::proxy_tools(&registry, &config));
    all_tools.extend(tools::shortcut_tools(&config));
    all_tools.extend(tools::maintenance_tools(reconciler));

    for tool in all_tools {
        let name = tool.name().to_string();
        match server.register_tool(tool).await {
            Ok(_) => info!("已注册工具: {}", name),
            Err(e) => warn!("注册工具 {} 失败: {}", name, e),
        }
    }

    info!("服务器工具总数: {}", server.tool_count().await);

    let mut server = mcp::server::Server::new(
        "open-cli-mcp".to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
        server,
    );

    server.run().await?;

    Ok(())
}
