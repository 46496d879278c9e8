use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GatewayError;

/// JSON Schema 定义（参数描述用的最小子集）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Schema {
    Object(SchemaObject),
    String(SchemaString),
    Integer(SchemaInteger),
    Array(SchemaArray),
}

impl Schema {
    pub fn validate(&self, value: &Value) -> Result<()> {
        match self {
            Schema::Object(obj) => obj.validate(value),
            Schema::String(s) => s.validate(value),
            Schema::Integer(i) => i.validate(value),
            Schema::Array(a) => a.validate(value),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaObject {
    pub required: Vec<String>,
    pub properties: HashMap<String, Schema>,
    pub description: Option<String>,
}

impl SchemaObject {
    pub fn validate(&self, value: &Value) -> Result<()> {
        if !value.is_object() {
            return Err(GatewayError::InvalidParameter("期望对象类型参数".to_string()).into());
        }

        for req in &self.required {
            if value.get(req).is_none() {
                return Err(
                    GatewayError::InvalidParameter(format!("缺少必需参数 {}", req)).into(),
                );
            }
        }

        for (key, schema) in &self.properties {
            if let Some(prop) = value.get(key) {
                schema.validate(prop)?;
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaString {
    pub description: Option<String>,
    pub enum_values: Option<Vec<String>>,
}

impl SchemaString {
    pub fn validate(&self, value: &Value) -> Result<()> {
        let Some(text) = value.as_str() else {
            return Err(GatewayError::InvalidParameter("期望字符串类型".to_string()).into());
        };

        if let Some(enum_values) = &self.enum_values {
            if !enum_values.iter().any(|v| v == text) {
                return Err(GatewayError::InvalidParameter(format!(
                    "取值必须是其中之一: {:?}",
                    enum_values
                ))
                .into());
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaInteger {
    pub description: Option<String>,
    pub minimum: Option<i64>,
    pub maximum: Option<i64>,
}

impl SchemaInteger {
    pub fn validate(&self, value: &Value) -> Result<()> {
        let Some(num) = value.as_i64() else {
            return Err(GatewayError::InvalidParameter("期望整数类型".to_string()).into());
        };

        if let Some(min) = self.minimum {
            if num < min {
                return Err(
                    GatewayError::InvalidParameter(format!("取值必须 >= {}", min)).into(),
                );
            }
        }

        if let Some(max) = self.maximum {
            if num > max {
                return Err(
                    GatewayError::InvalidParameter(format!("取值必须 <= {}", max)).into(),
                );
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaArray {
    pub description: Option<String>,
    pub items: Box<Schema>,
}

impl SchemaArray {
    pub fn validate(&self, value: &Value) -> Result<()> {
        let Some(items) = value.as_array() else {
            return Err(GatewayError::InvalidParameter("期望数组类型".to_string()).into());
        };

        for item in items {
            self.items.validate(item)?;
        }

        Ok(())
    }
}

// Tool 的基础 trait 定义
#[async_trait]
pub trait MCPTool: Send + Sync {
    /// 获取工具名称
    fn name(&self) -> &str;

    /// 获取工具描述
    fn description(&self) -> &str;

    /// 获取工具参数Schema
    fn parameters_schema(&self) -> &Schema;

    /// 执行工具。
    ///
    /// 网关约定：被包装 CLI 的一切失败（启动失败、超时、非零退出、
    /// 未知工具名）都编码进返回的 JSON 负载；`Err` 只保留给参数
    /// 校验等协议层问题。
    async fn execute(&self, params: Value) -> Result<Value>;

    /// 验证输入参数
    fn validate_params(&self, params: &Value) -> Result<()> {
        self.parameters_schema()
            .validate(params)
            .map_err(|e| GatewayError::InvalidParameter(e.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args_schema() -> Schema {
        let mut properties = HashMap::new();
        properties.insert(
            "args".to_string(),
            Schema::String(SchemaString {
                description: Some("参数字符串".to_string()),
                enum_values: None,
            }),
        );
        Schema::Object(SchemaObject {
            required: vec!["args".to_string()],
            properties,
            description: None,
        })
    }

    #[test]
    fn test_required_property_enforced() {
        let schema = args_schema();
        assert!(schema.validate(&json!({"args": "issues list"})).is_ok());
        assert!(schema.validate(&json!({})).is_err());
        assert!(schema.validate(&json!({"args": 42})).is_err());
    }

    #[test]
    fn test_string_enum_validation() {
        let schema = Schema::String(SchemaString {
            description: None,
            enum_values: Some(vec!["cfl".to_string(), "gro".to_string()]),
        });
        assert!(schema.validate(&json!("gro")).is_ok());
        assert!(schema.validate(&json!("kubectl")).is_err());
    }

    #[test]
    fn test_integer_bounds() {
        let schema = Schema::Integer(SchemaInteger {
            description: None,
            minimum: Some(1),
            maximum: Some(100),
        });
        assert!(schema.validate(&json!(20)).is_ok());
        assert!(schema.validate(&json!(0)).is_err());
        assert!(schema.validate(&json!(101)).is_err());
    }
}
