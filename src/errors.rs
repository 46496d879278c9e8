use thiserror::Error;

pub type Result<T> = anyhow::Result<T>;

/// 网关内部错误分类。
///
/// 注意：这些错误从不直接抛到 MCP 边界——每个工具在自己的边界处
/// 把错误编码进返回的 JSON 负载（见 `GatewayError::to_payload`）。
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("未知的CLI工具: {name}，可用工具: {available:?}")]
    UnknownTool {
        name: String,
        available: Vec<String>,
    },

    #[error("参数解析失败: {0}")]
    Tokenize(String),

    #[error("进程启动失败: {0}")]
    LaunchFailure(String),

    #[error("命令执行超时: {0}")]
    Timeout(String),

    #[error("参数无效: {0}")]
    InvalidParameter(String),

    #[error("包管理器调用失败: {0}")]
    PackageSource(String),
}

impl GatewayError {
    pub fn error_code(&self) -> &'static str {
        match self {
            GatewayError::UnknownTool { .. } => "UNKNOWN_TOOL",
            GatewayError::Tokenize(_) => "TOKENIZE_ERROR",
            GatewayError::LaunchFailure(_) => "LAUNCH_FAILURE",
            GatewayError::Timeout(_) => "TIMEOUT",
            GatewayError::InvalidParameter(_) => "INVALID_PARAMETER",
            GatewayError::PackageSource(_) => "PACKAGE_SOURCE_ERROR",
        }
    }

    /// 把错误转换为工具返回的 JSON 负载。
    ///
    /// `UnknownTool` 额外携带完整的合法工具名列表，便于调用方自行纠正。
    pub fn to_payload(&self) -> serde_json::Value {
        match self {
            GatewayError::UnknownTool { name, available } => serde_json::json!({
                "error": format!("未知的CLI工具: {}", name),
                "code": self.error_code(),
                "available": available,
            }),
            other => serde_json::json!({
                "error": other.to_string(),
                "code": other.error_code(),
            }),
        }
    }
}
