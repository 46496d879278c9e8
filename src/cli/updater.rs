use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use super::brew::HomebrewClient;
use super::envelope::{CommandOutput, CommandResult};
use super::executor;
use super::registry::{PackageSource, ToolDescriptor, ToolRegistry};
use crate::config::GatewayConfig;
use crate::errors::GatewayError;

/// 一个可更新的工具：已装版本落后于包来源的最新版本。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateCandidate {
    pub cli: String,
    pub cask: String,
    pub current: String,
    pub latest: String,
    pub source: PackageSource,
}

/// 一轮更新检查的产物。每次检查新建，不持久化，用完即弃。
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdatePlan {
    pub candidates: Vec<UpdateCandidate>,
}

impl UpdatePlan {
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// 面向人的摘要；空计划是合法的非错误结果。
    pub fn message(&self) -> String {
        if self.is_empty() {
            "所有工具均为最新版本".to_string()
        } else {
            format!("{} 个工具有可用更新", self.candidates.len())
        }
    }

    pub fn to_value(&self) -> Value {
        json!({
            "updates_available": !self.is_empty(),
            "tools": self.candidates,
            "message": self.message(),
        })
    }
}

/// 从 `brew outdated` 的文本输出构建更新计划。
///
/// 行匹配沿用包来源的解析契约：cask 短名是行内任意字段的子串即视为
/// 匹配；字段按空白切分，>= 3 个字段时第二个是当前版本、最后一个是
/// 最新版本，否则两者都报 "unknown" 而不是报错。该启发式与 brew 的
/// 输出格式耦合，是已知的易碎点（见 DESIGN.md），为兼容性保留原样。
pub fn plan_from_outdated(registry: &ToolRegistry, outdated_text: &str) -> UpdatePlan {
    let mut candidates = Vec::new();

    for tool in registry.descriptors() {
        let short_name = tool.cask_short_name();
        for line in outdated_text.lines() {
            if !line.contains(short_name) {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            let (current, latest) = if parts.len() >= 3 {
                (parts[1].to_string(), parts[parts.len() - 1].to_string())
            } else {
                ("unknown".to_string(), "unknown".to_string())
            };
            candidates.push(UpdateCandidate {
                cli: tool.name.to_string(),
                cask: short_name.to_string(),
                current,
                latest,
                source: tool.source,
            });
            // 每个工具只取第一条匹配行
            break;
        }
    }

    UpdatePlan { candidates }
}

/// 一次批量 brew 调用的结果。整批只有一个成败位——批内的部分成功
/// 无法区分，这是设计上的已知限制。
#[derive(Debug, Clone, Serialize)]
pub struct BatchResult {
    pub tools: Vec<String>,
    pub source: &'static str,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BatchResult {
    fn from_command(tools: Vec<String>, result: CommandResult, truncate: bool) -> Self {
        if let Some(error) = result.launch_error {
            return Self {
                tools,
                source: "homebrew cask",
                success: false,
                output: None,
                error: Some(error),
            };
        }

        // 成功取 stdout，失败取 stderr（与包来源契约一致）
        let text = if result.success {
            match result.output {
                CommandOutput::Raw(text) => text,
                CommandOutput::Structured(value) => value.to_string(),
                CommandOutput::Empty => String::new(),
            }
        } else {
            result.stderr.unwrap_or_default()
        };
        let text = if truncate { truncate_chars(&text, 500) } else { text };

        Self {
            tools,
            source: "homebrew cask",
            success: result.success,
            output: Some(text),
            error: None,
        }
    }
}

fn truncate_chars(text: &str, limit: usize) -> String {
    text.chars().take(limit).collect()
}

/// 更新协调器：对照注册表与包来源，计算并执行更新/安装计划。
pub struct UpdateReconciler {
    registry: ToolRegistry,
    brew: HomebrewClient,
    config: GatewayConfig,
}

impl UpdateReconciler {
    pub fn new(registry: ToolRegistry, brew: HomebrewClient, config: GatewayConfig) -> Self {
        Self {
            registry,
            brew,
            config,
        }
    }

    /// 查询包来源并交叉比对注册表，产出更新计划。
    pub async fn check_updates(&self) -> Result<UpdatePlan, GatewayError> {
        let outdated = self.brew.list_outdated().await?;
        let plan = plan_from_outdated(&self.registry, &outdated);
        info!("更新检查完成: {}", plan.message());
        Ok(plan)
    }

    /// 应用更新。
    ///
    /// `names` 省略时重新计算 `check_updates` 并恰好应用该候选集；
    /// 给出时静默过滤掉注册表之外的名字——与 `resolve` 的报错行为
    /// 刻意不对称，因为这里是尽力而为的批量操作。
    pub async fn apply_updates(&self, names: Option<Vec<String>>) -> Value {
        let selected: Vec<String> = match names {
            Some(names) => names
                .into_iter()
                .filter(|name| self.registry.contains(name))
                .collect(),
            None => match self.check_updates().await {
                Ok(plan) => plan.candidates.into_iter().map(|c| c.cli).collect(),
                Err(e) => {
                    warn!("更新检查失败，无法计算更新集: {}", e);
                    return json!({
                        "updated": [],
                        "results": [],
                        "error": e.to_string(),
                    });
                }
            },
        };

        if selected.is_empty() {
            return json!({ "message": "没有需要更新的工具", "results": [] });
        }

        let casks = self.casks_for(&selected);
        let result = self.brew.upgrade(&casks).await;
        let batch = BatchResult::from_command(selected.clone(), result, false);

        json!({
            "updated": selected,
            "results": [batch],
        })
    }

    /// 安装所有缺失的工具。
    ///
    /// 用版本探测判断「缺失」：任何启动失败（不只是二进制不存在）都
    /// 算缺失——这是粗粒度但被确认保留的策略，「没装」和「装了但坏了」
    /// 在这里不做区分。
    pub async fn install_missing(&self) -> Value {
        let mut missing = Vec::new();
        for tool in self.registry.descriptors() {
            if self.probe(tool).await.launch_error.is_some() {
                missing.push(tool.name.to_string());
            }
        }

        if missing.is_empty() {
            return json!({ "message": "所有工具均已安装", "missing": [] });
        }
        info!("检测到缺失工具: {:?}", missing);

        // tap 注册是幂等的，失败忽略
        let mut taps: Vec<String> = self
            .registry
            .descriptors()
            .map(|tool| tool.tap())
            .collect();
        taps.sort();
        taps.dedup();
        for tap in &taps {
            self.brew.ensure_tap(tap).await;
        }

        let casks = self.casks_for(&missing);
        let result = self.brew.install(&casks).await;
        let batch = BatchResult::from_command(missing.clone(), result, true);

        json!({
            "missing_tools": missing,
            "results": [batch],
        })
    }

    /// 每个注册工具的安装/版本/更新状态。
    ///
    /// brew 查询失败时 `update_available` 为 null（未知）而不是悄悄
    /// 缺席——不可用性要在结果里可见。
    pub async fn tool_statuses(&self) -> Value {
        let outdated = self.brew.list_outdated().await;
        let mut status = serde_json::Map::new();

        for tool in self.registry.descriptors() {
            let mut entry = serde_json::Map::new();
            entry.insert("source".into(), json!("cask"));
            entry.insert("cask".into(), json!(tool.cask));

            let probe = self.probe(tool).await;
            if let Some(error) = probe.launch_error {
                entry.insert("installed".into(), json!(false));
                entry.insert("error".into(), json!(error));
                status.insert(tool.name.to_string(), Value::Object(entry));
                continue;
            }

            entry.insert("installed".into(), json!(true));
            // 版本文本可能走 stdout 也可能走 stderr，取第一行
            let version_text = match &probe.output {
                CommandOutput::Raw(text) => text.clone(),
                CommandOutput::Structured(value) => value.to_string(),
                CommandOutput::Empty => probe.stderr.clone().unwrap_or_default(),
            };
            let first_line = version_text.lines().next().unwrap_or("").to_string();
            entry.insert("version".into(), json!(first_line));
            if let Some(number) = extract_version(&version_text) {
                entry.insert("version_number".into(), json!(number));
            }

            match &outdated {
                Ok(text) => {
                    let available = text.contains(tool.cask_short_name());
                    entry.insert("update_available".into(), json!(available));
                }
                Err(_) => {
                    entry.insert("update_available".into(), Value::Null);
                }
            }

            status.insert(tool.name.to_string(), Value::Object(entry));
        }

        if let Err(e) = outdated {
            warn!("更新状态查询失败: {}", e);
        }

        Value::Object(status)
    }

    async fn probe(&self, tool: &ToolDescriptor) -> CommandResult {
        let mut tokens = vec![tool.path.to_string()];
        tokens.extend(tool.version_args.iter().map(|s| s.to_string()));
        executor::execute(&tokens, self.config.probe_timeout()).await
    }

    fn casks_for(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter_map(|name| self.registry.resolve(name).ok())
            .map(|tool| tool.cask.to_string())
            .collect()
    }
}

/// 从版本输出里提取形如 x.y.z 的版本号。
fn extract_version(output: &str) -> Option<String> {
    static VERSION_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"v?(\d+\.\d+(?:\.\d+)?(?:\.\d+)?)").unwrap());
    VERSION_RE
        .captures(output)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
}
