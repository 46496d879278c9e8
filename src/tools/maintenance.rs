use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use tracing::info;

use super::base::{MCPTool, Schema, SchemaArray, SchemaObject, SchemaString};
use crate::cli::UpdateReconciler;

/// 列出全部注册工具的安装状态、版本和更新情况。
pub struct ListToolStatusTool {
    reconciler: Arc<UpdateReconciler>,
    schema: Schema,
}

impl ListToolStatusTool {
    pub fn new(reconciler: Arc<UpdateReconciler>) -> Self {
        Self {
            reconciler,
            schema: Schema::Object(SchemaObject::default()),
        }
    }
}

#[async_trait]
impl MCPTool for ListToolStatusTool {
    fn name(&self) -> &str {
        "list_tools_status"
    }

    fn description(&self) -> &str {
        "列出所有注册 CLI 工具的安装状态、当前版本以及是否有可用更新"
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        Ok(self.reconciler.tool_statuses().await)
    }
}

/// 检查是否有工具可以更新。
pub struct CheckUpdatesTool {
    reconciler: Arc<UpdateReconciler>,
    schema: Schema,
}

impl CheckUpdatesTool {
    pub fn new(reconciler: Arc<UpdateReconciler>) -> Self {
        Self {
            reconciler,
            schema: Schema::Object(SchemaObject::default()),
        }
    }
}

#[async_trait]
impl MCPTool for CheckUpdatesTool {
    fn name(&self) -> &str {
        "check_for_updates"
    }

    fn description(&self) -> &str {
        "检查注册的 CLI 工具是否有可用更新，返回可更新工具的摘要"
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        match self.reconciler.check_updates().await {
            Ok(plan) => Ok(plan.to_value()),
            // 包来源不可用：更新状态未知，但不是协议层错误
            Err(e) => Ok(serde_json::json!({
                "updates_available": Value::Null,
                "tools": [],
                "error": e.to_string(),
            })),
        }
    }
}

/// 更新工具到最新版本。
pub struct UpdateToolsTool {
    reconciler: Arc<UpdateReconciler>,
    schema: Schema,
}

impl UpdateToolsTool {
    pub fn new(reconciler: Arc<UpdateReconciler>) -> Self {
        let mut properties = HashMap::new();
        properties.insert(
            "tools".to_string(),
            Schema::Array(SchemaArray {
                description: Some(
                    "要更新的工具名列表；省略时更新所有有可用更新的工具".to_string(),
                ),
                items: Box::new(Schema::String(SchemaString::default())),
            }),
        );
        Self {
            reconciler,
            schema: Schema::Object(SchemaObject {
                required: vec![],
                properties,
                description: None,
            }),
        }
    }
}

#[async_trait]
impl MCPTool for UpdateToolsTool {
    fn name(&self) -> &str {
        "update_tools"
    }

    fn description(&self) -> &str {
        "把 CLI 工具升级到最新版本（通过 Homebrew cask 批量执行）"
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, params: Value) -> Result<Value> {
        let names = params.get("tools").and_then(|v| v.as_array()).map(|list| {
            list.iter()
                .filter_map(|v| v.as_str())
                .map(str::to_string)
                .collect::<Vec<_>>()
        });
        info!("执行工具更新，指定集合: {:?}", names);
        Ok(self.reconciler.apply_updates(names).await)
    }
}

/// 安装缺失的 CLI 工具。
pub struct InstallMissingTool {
    reconciler: Arc<UpdateReconciler>,
    schema: Schema,
}

impl InstallMissingTool {
    pub fn new(reconciler: Arc<UpdateReconciler>) -> Self {
        Self {
            reconciler,
            schema: Schema::Object(SchemaObject::default()),
        }
    }
}

#[async_trait]
impl MCPTool for InstallMissingTool {
    fn name(&self) -> &str {
        "install_missing_tools"
    }

    fn description(&self) -> &str {
        "检测并安装所有缺失的 CLI 工具（通过 open-cli-collective tap 批量安装）"
    }

    fn parameters_schema(&self) -> &Schema {
        &self.schema
    }

    async fn execute(&self, _params: Value) -> Result<Value> {
        Ok(self.reconciler.install_missing().await)
    }
}

/// 构建全部维护类工具。
pub fn maintenance_tools(reconciler: Arc<UpdateReconciler>) -> Vec<Box<dyn MCPTool>> {
    vec![
        Box::new(ListToolStatusTool::new(Arc::clone(&reconciler))),
        Box::new(CheckUpdatesTool::new(Arc::clone(&reconciler))),
        Box::new(UpdateToolsTool::new(Arc::clone(&reconciler))),
        Box::new(InstallMissingTool::new(reconciler)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{HomebrewClient, ToolRegistry};
    use crate::config::GatewayConfig;
    use serde_json::json;

    fn test_reconciler() -> Arc<UpdateReconciler> {
        let config = GatewayConfig::default();
        Arc::new(UpdateReconciler::new(
            ToolRegistry::new(),
            HomebrewClient::detect(config.clone()),
            config,
        ))
    }

    #[test]
    fn test_maintenance_tool_names() {
        let names: Vec<String> = maintenance_tools(test_reconciler())
            .iter()
            .map(|t| t.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "list_tools_status",
                "check_for_updates",
                "update_tools",
                "install_missing_tools"
            ]
        );
    }

    #[test]
    fn test_update_tools_accepts_name_array() {
        let tool = UpdateToolsTool::new(test_reconciler());
        assert!(tool.validate_params(&json!({"tools": ["cfl", "gro"]})).is_ok());
        assert!(tool.validate_params(&json!({})).is_ok());
        assert!(tool.validate_params(&json!({"tools": [1, 2]})).is_err());
    }
}
