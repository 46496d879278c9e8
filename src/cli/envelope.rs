use serde::{Deserialize, Serialize};
use serde_json::Value;

/// stdout 的分类结果。
///
/// 用变体而不是一对 Option 字段表达，使「结构化数据与原始文本互斥」
/// 这一不变量在构造层面就成立，而不是靠调用方自觉。
#[derive(Debug, Clone, PartialEq)]
pub enum CommandOutput {
    /// stdout 成功解码为 JSON（空数组、false 等同样算结构化输出）
    Structured(Value),
    /// stdout 非空但不是合法 JSON，保留裁剪后的原文
    Raw(String),
    /// stdout 为空
    Empty,
}

/// 一次子进程调用的归一化结果信封。
///
/// 每次调用新建、由调用方独占、序列化后即丢弃。线格式与字段名
/// 保持稳定：`success` / `exit_code` / `data` / `output` / `stderr` / `error`，
/// 缺失的字段在 JSON 中省略。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "WireResult", try_from = "WireResult")]
pub struct CommandResult {
    /// 进程退出码为 0
    pub success: bool,
    /// 启动失败时缺失
    pub exit_code: Option<i32>,
    pub output: CommandOutput,
    /// 裁剪后的 stderr，为空时省略
    pub stderr: Option<String>,
    /// 进程未能启动（二进制缺失、超时、权限不足等）的描述
    pub launch_error: Option<String>,
}

impl CommandResult {
    /// 由退出码和两个输出流构建信封。
    ///
    /// 两个流先裁剪首尾空白；stdout 先尝试 JSON 解码，失败则作为
    /// 原始文本保留（空 stdout 不是合法 JSON，归为 `Empty`）。
    pub fn build(exit_code: i32, stdout: &str, stderr: &str) -> Self {
        let stdout = stdout.trim();
        let stderr = stderr.trim();

        let output = if stdout.is_empty() {
            CommandOutput::Empty
        } else {
            match serde_json::from_str::<Value>(stdout) {
                Ok(value) => CommandOutput::Structured(value),
                Err(_) => CommandOutput::Raw(stdout.to_string()),
            }
        };

        Self {
            success: exit_code == 0,
            exit_code: Some(exit_code),
            output,
            stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
            launch_error: None,
        }
    }

    /// 进程未能启动（或超时被终止）时的信封：没有退出码，也没有部分输出。
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            exit_code: None,
            output: CommandOutput::Empty,
            stderr: None,
            launch_error: Some(message.into()),
        }
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Null)
    }
}

/// 线格式中间结构。`CommandOutput` 在线上拆成互斥的 `data` / `output` 字段。
#[derive(Serialize, Deserialize)]
struct WireResult {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    exit_code: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stderr: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl From<CommandResult> for WireResult {
    fn from(result: CommandResult) -> Self {
        let (data, output) = match result.output {
            CommandOutput::Structured(value) => (Some(value), None),
            CommandOutput::Raw(text) => (None, Some(text)),
            CommandOutput::Empty => (None, None),
        };
        Self {
            success: result.success,
            exit_code: result.exit_code,
            data,
            output,
            stderr: result.stderr,
            error: result.launch_error,
        }
    }
}

impl TryFrom<WireResult> for CommandResult {
    type Error = String;

    fn try_from(wire: WireResult) -> Result<Self, Self::Error> {
        let output = match (wire.data, wire.output) {
            (Some(_), Some(_)) => {
                return Err("data 与 output 字段互斥".to_string());
            }
            (Some(value), None) => CommandOutput::Structured(value),
            (None, Some(text)) => CommandOutput::Raw(text),
            (None, None) => CommandOutput::Empty,
        };
        Ok(Self {
            success: wire.success,
            exit_code: wire.exit_code,
            output,
            stderr: wire.stderr,
            launch_error: wire.error,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_stdout_becomes_structured() {
        let result = CommandResult::build(0, r#"{"issues": []}"#, "");
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(
            result.output,
            CommandOutput::Structured(json!({"issues": []}))
        );
    }

    #[test]
    fn test_empty_json_array_is_still_structured() {
        let result = CommandResult::build(0, "[]", "");
        assert_eq!(result.output, CommandOutput::Structured(json!([])));
        // 线格式里必须出现 data 字段而不是 output
        let wire = result.to_value();
        assert_eq!(wire["data"], json!([]));
        assert!(wire.get("output").is_none());
    }

    #[test]
    fn test_plain_text_stdout_becomes_raw() {
        let result = CommandResult::build(0, "  hello world \n", "");
        assert_eq!(result.output, CommandOutput::Raw("hello world".to_string()));
    }

    #[test]
    fn test_empty_stdout_is_empty_variant() {
        let result = CommandResult::build(0, "   \n", "");
        assert_eq!(result.output, CommandOutput::Empty);
        let wire = result.to_value();
        assert!(wire.get("data").is_none());
        assert!(wire.get("output").is_none());
    }

    #[test]
    fn test_nonzero_exit_is_not_success() {
        let result = CommandResult::build(2, "", "boom");
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(2));
        assert_eq!(result.stderr.as_deref(), Some("boom"));
    }

    #[test]
    fn test_empty_stderr_is_omitted() {
        let result = CommandResult::build(0, "x", "  ");
        assert!(result.stderr.is_none());
        assert!(result.to_value().get("stderr").is_none());
    }

    #[test]
    fn test_launch_failure_carries_no_output() {
        let result = CommandResult::launch_failure("未找到命令: gro");
        assert!(!result.success);
        assert!(result.exit_code.is_none());
        assert_eq!(result.output, CommandOutput::Empty);
        let wire = result.to_value();
        assert_eq!(wire["error"], "未找到命令: gro");
        assert!(wire.get("exit_code").is_none());
    }

    #[test]
    fn test_wire_round_trip() {
        for result in [
            CommandResult::build(0, r#"{"a": 1}"#, "warn"),
            CommandResult::build(1, "plain", ""),
            CommandResult::build(0, "", ""),
            CommandResult::launch_failure("命令执行超时 (60s)"),
        ] {
            let encoded = serde_json::to_string(&result).unwrap();
            let decoded: CommandResult = serde_json::from_str(&encoded).unwrap();
            assert_eq!(decoded, result);
        }
    }

    #[test]
    fn test_wire_rejects_both_data_and_output() {
        let err = serde_json::from_str::<CommandResult>(
            r#"{"success": true, "data": {}, "output": "x"}"#,
        );
        assert!(err.is_err());
    }
}
