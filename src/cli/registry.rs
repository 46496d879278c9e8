use serde::Serialize;

use crate::errors::GatewayError;

/// 包来源。目前所有工具都通过 Homebrew cask 分发。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageSource {
    Cask,
}

/// 一个已注册 CLI 工具的调用元数据。
///
/// 进程启动时构造一次，之后只读。`path` 必须是经 PATH 解析的裸命令名，
/// 绝不接受调用方提供的路径——这挡住了任意二进制执行。
#[derive(Debug, Clone, Serialize)]
pub struct ToolDescriptor {
    /// 注册表主键
    pub name: &'static str,
    /// 可执行文件名（裸名，经 PATH 解析）
    pub path: &'static str,
    /// 版本查询参数
    pub version_args: &'static [&'static str],
    /// 请求结构化（JSON）输出时附加的参数
    pub json_flag: &'static [&'static str],
    pub source: PackageSource,
    /// 可安装单元标识，如 `open-cli-collective/tap/cfl`
    pub cask: &'static str,
}

impl ToolDescriptor {
    /// cask 标识的短名（最后一个 `/` 段），brew outdated 输出里用的就是它。
    pub fn cask_short_name(&self) -> &'static str {
        self.cask.rsplit('/').next().unwrap_or(self.cask)
    }

    /// cask 所属的 tap（去掉最后一段）。
    pub fn tap(&self) -> String {
        match self.cask.rsplit_once('/') {
            Some((tap, _)) => tap.to_string(),
            None => self.cask.to_string(),
        }
    }
}

/// 静态工具注册表：逻辑工具名 -> 调用元数据。
///
/// open-cli-collective 全家桶，均通过
/// `brew install --cask open-cli-collective/tap/<name>` 安装。
static TOOLS: &[ToolDescriptor] = &[
    ToolDescriptor {
        name: "jira-ticket-cli",
        path: "jira-ticket-cli",
        version_args: &["--version"],
        json_flag: &["--output", "json"],
        source: PackageSource::Cask,
        cask: "open-cli-collective/tap/jira-ticket-cli",
    },
    ToolDescriptor {
        name: "slck",
        path: "slck",
        version_args: &["--version"],
        json_flag: &["--output", "json"],
        source: PackageSource::Cask,
        cask: "open-cli-collective/tap/slack-chat-cli",
    },
    ToolDescriptor {
        name: "cfl",
        path: "cfl",
        version_args: &["--version"],
        json_flag: &["--output", "json"],
        source: PackageSource::Cask,
        cask: "open-cli-collective/tap/cfl",
    },
    ToolDescriptor {
        name: "newrelic-cli",
        path: "newrelic-cli",
        version_args: &["--version"],
        json_flag: &["--output", "json"],
        source: PackageSource::Cask,
        cask: "open-cli-collective/tap/newrelic-cli",
    },
    ToolDescriptor {
        name: "gro",
        path: "gro",
        version_args: &["--version"],
        json_flag: &["--json"],
        source: PackageSource::Cask,
        cask: "open-cli-collective/tap/google-readonly",
    },
];

/// 只读工具注册表。
#[derive(Debug, Clone, Copy, Default)]
pub struct ToolRegistry;

impl ToolRegistry {
    pub fn new() -> Self {
        Self
    }

    /// 按逻辑名解析工具；未注册的名字返回 `UnknownTool`，
    /// 错误负载中带上全部合法工具名。
    pub fn resolve(&self, name: &str) -> Result<&'static ToolDescriptor, GatewayError> {
        TOOLS
            .iter()
            .find(|tool| tool.name == name)
            .ok_or_else(|| GatewayError::UnknownTool {
                name: name.to_string(),
                available: self.names(),
            })
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static ToolDescriptor> {
        TOOLS.iter()
    }

    pub fn names(&self) -> Vec<String> {
        TOOLS.iter().map(|tool| tool.name.to_string()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        TOOLS.iter().any(|tool| tool.name == name)
    }
}
