//! # Open CLI MCP
//!
//! 一个基于 MCP (Model Context Protocol) 的命令代理网关：把
//! open-cli-collective 的 CLI 工具集（Jira / Slack / Confluence /
//! New Relic / Google 只读）注册为可被 AI Agent 调用的 MCP 工具，
//! 以子进程方式单次执行并把结果归一化为结构化信封。
//!
//! ## 特性
//!
//! - **CLI 透传** - 每个注册 CLI 一个通用入口，外加常用操作的快捷包装
//! - **安全分词** - shell 风格引号解析但不做任何 shell 语义展开
//! - **结果信封** - stdout 自动分类为 JSON 结构化数据或原始文本
//! - **更新管理** - 对照 Homebrew 检测过期工具、批量升级与安装

pub mod cli;
pub mod config;
pub mod errors;
pub mod mcp;
pub mod tools;

pub use cli::{CommandOutput, CommandResult, ToolRegistry, UpdatePlan};
pub use config::GatewayConfig;
pub use errors::{GatewayError, Result};
