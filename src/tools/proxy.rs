use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::base::{MCPTool, Schema, SchemaInteger, SchemaObject, SchemaString};
use crate::cli::{executor, tokenize, ToolRegistry};
use crate::config::GatewayConfig;

/// 分词 -> 执行 -> 归一化，三步管道的公共入口。
///
/// `args` 是调用方提供的自由格式参数字符串；分词失败和一切执行期
/// 失败都编码进返回的 JSON 负载。
async fn run_cli(path: &str, args: &str, timeout: Duration) -> Value {
    let mut tokens = vec![path.to_string()];
    match tokenize(args) {
        Ok(parsed) => tokens.extend(parsed),
        Err(e) => return e.to_payload(),
    }
    executor::execute(&tokens, timeout).await.to_value()
}

fn string_prop(description: &str) -> Schema {
    Schema::String(SchemaString {
        description: Some(description.to_string()),
        enum_values: None,
    })
}

/// 通用透传工具：一个注册 CLI 对应一个 MCP 工具，完整开放该 CLI 的
/// 全部功能。
pub struct CliProxyTool {
    mcp_name: &'static str,
    description: String,
    cli_path: &'static str,
    timeout: Duration,
    schema: Schema,
}

impl CliProxyTool {
    fn new(
        mcp_name: &'static str,
        cli_name: &'static str,
        cli_path: &'static str,
        summary: &str,
        config: &GatewayConfig,
    ) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "args".to_string(),
            string_prop(&format!(
                "空格分隔的 {} 参数，带空格的值用引号包住（如 --summary \"Fix login bug\"）",
                cli_name
            )),
        );
        Self {
            mcp_name,
            description: format!(
                "{}。用 cli_help(\"{}\") 查看全部可用命令。",
                summary, cli_name
            ),
            cli_path,
            timeout: config.call_timeout(),
            schema: Schema::Object(SchemaObject {
                required: vec!["args".to_string()],
                properties,
                description: None,
            }),
        }
    }
}

#[async_trait]
impl MCPTool for CliProxyTool {
    fn name(&self) -> &str {
        self.mcp_name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let args = params.get("args").and_then(|v| v.as_str()).unwrap_or("");
        debug!("{} 透传: {}", self.mcp_name, args);
        Ok(run_cli(self.cli_path, args, self.timeout).await)
    }
}

/// 为注册表中的每个 CLI 构建一个透传工具。
pub fn proxy_tools(registry: &ToolRegistry, config: &GatewayConfig) -> Vec<Box<dyn MCPTool>> {
    // (注册表名, MCP 工具名, 功能摘要)
    let surface: &[(&str, &'static str, &str)] = &[
        (
            "jira-ticket-cli",
            "jira_cli",
            "执行任意 jira-ticket-cli 命令（issues/sprints/transitions/comments 等），完整访问 Jira",
        ),
        (
            "slck",
            "slack_cli",
            "执行任意 slck 命令（channels/messages/search/users 等），完整访问 Slack",
        ),
        (
            "cfl",
            "confluence_cli",
            "执行任意 cfl 命令（search/page/space/attachment 等），完整访问 Confluence",
        ),
        (
            "newrelic-cli",
            "newrelic_cli",
            "执行任意 newrelic-cli 命令（apps/logs/nerdgraph/alerts 等），完整访问 New Relic",
        ),
        (
            "gro",
            "google_cli",
            "执行任意 gro 命令（gmail/calendar/contacts/drive），只读访问 Google 服务",
        ),
    ];

    surface
        .iter()
        .filter_map(|&(cli_name, mcp_name, summary)| {
            let tool = registry.resolve(cli_name).ok()?;
            Some(Box::new(CliProxyTool::new(
                mcp_name, tool.name, tool.path, summary, config,
            )) as Box<dyn MCPTool>)
        })
        .collect()
}

/// 帮助查询工具：获取某个 CLI（或其子命令路径）的 --help 文档，
/// 供调用方发现可用命令。
pub struct CliHelpTool {
    registry: ToolRegistry,
    timeout: Duration,
    schema: Schema,
}

impl CliHelpTool {
    pub fn new(registry: ToolRegistry, config: &GatewayConfig) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "cli".to_string(),
            Schema::String(SchemaString {
                description: Some("CLI 工具名".to_string()),
                enum_values: Some(registry.names()),
            }),
        );
        properties.insert(
            "subcommand".to_string(),
            string_prop("可选的子命令路径，如 \"issues create\" 或 \"page list\""),
        );
        Self {
            registry,
            timeout: config.call_timeout(),
            schema: Schema::Object(SchemaObject {
                required: vec!["cli".to_string()],
                properties,
                description: None,
            }),
        }
    }
}

#[async_trait]
impl MCPTool for CliHelpTool {
    fn name(&self) -> &str {
        "cli_help"
    }

    fn description(&self) -> &str {
        "获取某个 CLI 或其子命令的帮助文档，用于发现可用命令和选项"
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let cli = params.get("cli").and_then(|v| v.as_str()).unwrap_or("");
        let tool = match self.registry.resolve(cli) {
            Ok(tool) => tool,
            Err(e) => return Ok(e.to_payload()),
        };

        let mut tokens = vec![tool.path.to_string()];
        if let Some(subcommand) = params.get("subcommand").and_then(|v| v.as_str()) {
            tokens.extend(subcommand.split_whitespace().map(str::to_string));
        }
        tokens.push("--help".to_string());

        Ok(executor::execute(&tokens, self.timeout).await.to_value())
    }
}

/// 快捷操作：常用调用模式的预填充包装，参数模板固定。
pub struct ShortcutTool {
    name: &'static str,
    description: &'static str,
    /// 注册表中的目标 CLI 名
    cli: &'static str,
    schema: Schema,
    timeout: Duration,
    /// 由参数渲染出完整参数字符串
    build_args: fn(&Value) -> String,
}

#[async_trait]
impl MCPTool for ShortcutTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        self.description
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let registry = ToolRegistry::new();
        let tool = match registry.resolve(self.cli) {
            Ok(tool) => tool,
            Err(e) => return Ok(e.to_payload()),
        };
        let args = (self.build_args)(&params);
        debug!("{} -> {} {}", self.name, tool.path, args);
        Ok(run_cli(tool.path, &args, self.timeout).await)
    }
}

fn query_schema(query_desc: &str, limit_key: &str, limit_default: i64) -> Schema {
    let mut properties = HashMap::new();
    properties.insert("query".to_string(), string_prop(query_desc));
    properties.insert(
        limit_key.to_string(),
        Schema::Integer(SchemaInteger {
            description: Some(format!("返回条数上限，默认 {}", limit_default)),
            minimum: Some(1),
            maximum: Some(1000),
        }),
    );
    Schema::Object(SchemaObject {
        required: vec!["query".to_string()],
        properties,
        description: None,
    })
}

fn str_param<'a>(params: &'a Value, key: &str) -> &'a str {
    params.get(key).and_then(|v| v.as_str()).unwrap_or("")
}

fn int_param(params: &Value, key: &str, default: i64) -> i64 {
    params.get(key).and_then(|v| v.as_i64()).unwrap_or(default)
}

fn jira_get_issue_args(params: &Value) -> String {
    format!("issues get {} --output json", str_param(params, "issue_key"))
}

fn slack_search_args(params: &Value) -> String {
    format!(
        "search messages \"{}\" --count {} --output json",
        str_param(params, "query"),
        int_param(params, "count", 20)
    )
}

fn confluence_search_args(params: &Value) -> String {
    format!(
        "search \"{}\" --limit {} --output json",
        str_param(params, "query"),
        int_param(params, "limit", 25)
    )
}

fn gmail_search_args(params: &Value) -> String {
    format!(
        "gmail search --query \"{}\" --limit {} --json",
        str_param(params, "query"),
        int_param(params, "limit", 20)
    )
}

fn calendar_today_args(_params: &Value) -> String {
    "calendar today --json".to_string()
}

fn drive_search_args(params: &Value) -> String {
    format!(
        "drive search \"{}\" --limit {} --json",
        str_param(params, "query"),
        int_param(params, "limit", 20)
    )
}

/// 全部快捷操作工具。
pub fn shortcut_tools(config: &GatewayConfig) -> Vec<Box<dyn MCPTool>> {
    let timeout = config.call_timeout();
    let issue_key_schema = {
        let mut properties = HashMap::new();
        properties.insert(
            "issue_key".to_string(),
            string_prop("Jira issue key，如 PROJ-1234"),
        );
        Schema::Object(SchemaObject {
            required: vec!["issue_key".to_string()],
            properties,
            description: None,
        })
    };

    let tools: Vec<ShortcutTool> = vec![
        ShortcutTool {
            name: "jira_get_issue",
            description: "按 key 获取一个 Jira issue",
            cli: "jira-ticket-cli",
            schema: issue_key_schema,
            timeout,
            build_args: jira_get_issue_args,
        },
        ShortcutTool {
            name: "slack_search_messages",
            description: "搜索 Slack 消息",
            cli: "slck",
            schema: query_schema("搜索关键词", "count", 20),
            timeout,
            build_args: slack_search_args,
        },
        ShortcutTool {
            name: "confluence_search",
            description: "搜索 Confluence 页面",
            cli: "cfl",
            schema: query_schema("搜索关键词", "limit", 25),
            timeout,
            build_args: confluence_search_args,
        },
        ShortcutTool {
            name: "gmail_search",
            description: "搜索 Gmail 邮件",
            cli: "gro",
            schema: query_schema("Gmail 查询语法，如 from:someone@example.com", "limit", 20),
            timeout,
            build_args: gmail_search_args,
        },
        ShortcutTool {
            name: "calendar_today",
            description: "获取今天的日历日程",
            cli: "gro",
            schema: Schema::Object(SchemaObject::default()),
            timeout,
            build_args: calendar_today_args,
        },
        ShortcutTool {
            name: "drive_search",
            description: "搜索 Google Drive 文件",
            cli: "gro",
            schema: query_schema("搜索关键词", "limit", 20),
            timeout,
            build_args: drive_search_args,
        },
    ];

    tools
        .into_iter()
        .map(|tool| Box::new(tool) as Box<dyn MCPTool>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_help_tool_unknown_cli_returns_payload() {
        let tool = CliHelpTool::new(ToolRegistry::new(), &GatewayConfig::default());
        let result = tool.execute(json!({"cli": "kubectl"})).await.unwrap();
        assert_eq!(result["code"], "UNKNOWN_TOOL");
        assert_eq!(result["available"].as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_proxy_tokenize_error_returns_payload() {
        let registry = ToolRegistry::new();
        let config = GatewayConfig::default();
        let tools = proxy_tools(&registry, &config);
        let jira = tools.iter().find(|t| t.name() == "jira_cli").unwrap();
        let result = jira
            .execute(json!({"args": "issues create --summary \"unterminated"}))
            .await
            .unwrap();
        assert_eq!(result["code"], "TOKENIZE_ERROR");
    }

    #[test]
    fn test_proxy_tools_cover_all_registered_clis() {
        let registry = ToolRegistry::new();
        let config = GatewayConfig::default();
        let names: Vec<String> = proxy_tools(&registry, &config)
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "jira_cli",
                "slack_cli",
                "confluence_cli",
                "newrelic_cli",
                "google_cli"
            ]
        );
    }

    #[test]
    fn test_shortcut_templates() {
        assert_eq!(
            jira_get_issue_args(&json!({"issue_key": "PROJ-1234"})),
            "issues get PROJ-1234 --output json"
        );
        assert_eq!(
            slack_search_args(&json!({"query": "deploy failed"})),
            "search messages \"deploy failed\" --count 20 --output json"
        );
        assert_eq!(
            gmail_search_args(&json!({"query": "from:boss", "limit": 5})),
            "gmail search --query \"from:boss\" --limit 5 --json"
        );
        assert_eq!(calendar_today_args(&json!({})), "calendar today --json");
    }

    #[test]
    fn test_shortcut_template_round_trips_through_tokenizer() {
        // 模板里带引号的值必须在分词后还原为单个 token
        let args = confluence_search_args(&json!({"query": "release notes"}));
        let tokens = tokenize(&args).unwrap();
        assert_eq!(
            tokens,
            vec!["search", "release notes", "--limit", "25", "--output", "json"]
        );
    }

    #[test]
    fn test_shortcut_tools_complete() {
        let names: Vec<String> = shortcut_tools(&GatewayConfig::default())
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "jira_get_issue",
                "slack_search_messages",
                "confluence_search",
                "gmail_search",
                "calendar_today",
                "drive_search"
            ]
        );
    }

    #[test]
    fn test_help_tool_validates_cli_enum() {
        let tool = CliHelpTool::new(ToolRegistry::new(), &GatewayConfig::default());
        assert!(tool.validate_params(&json!({"cli": "gro"})).is_ok());
        assert!(tool.validate_params(&json!({"cli": "unknown"})).is_err());
        assert!(tool.validate_params(&json!({})).is_err());
    }
}
