use std::io::ErrorKind;
use std::time::Duration;

use tokio::process::Command;
use tracing::debug;

use super::envelope::CommandResult;

/// 以无 shell 方式执行一个 token 序列并在限定时间内收集结果。
///
/// 第一个 token 是可执行文件名（经 PATH 解析），其余 token 原样作为
/// 参数传入——参数内容不可能触发 shell 注入。任何启动期故障（二进制
/// 缺失、权限不足、超时）都被捕获进信封，绝不向宿主进程抛出；执行器
/// 不持有跨调用的可变状态，可被宿主并发调用。
pub async fn execute(tokens: &[String], timeout: Duration) -> CommandResult {
    let Some((program, args)) = tokens.split_first() else {
        return CommandResult::launch_failure("命令为空");
    };

    debug!("执行命令: {} {:?} (超时 {}s)", program, args, timeout.as_secs());

    let mut command = Command::new(program);
    command.args(args).kill_on_drop(true);

    let output = match tokio::time::timeout(timeout, command.output()).await {
        // 超时：kill_on_drop 负责终止子进程，不返回任何部分输出
        Err(_) => {
            return CommandResult::launch_failure(format!(
                "命令执行超时 ({}s)",
                timeout.as_secs()
            ));
        }
        Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
            return CommandResult::launch_failure(format!("未找到命令: {}", program));
        }
        // 其余启动故障（权限不足、资源耗尽等）一律进信封，不重试：
        // 启动失败按设计视为配置问题，立即上报调用方
        Ok(Err(e)) => {
            return CommandResult::launch_failure(format!("启动 {} 失败: {}", program, e));
        }
        Ok(Ok(output)) => output,
    };

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    CommandResult::build(exit_code, &stdout, &stderr)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::envelope::CommandOutput;

    fn tokens(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_token_sequence() {
        let result = execute(&[], Duration::from_secs(5)).await;
        assert!(!result.success);
        assert!(result.launch_error.is_some());
    }

    #[tokio::test]
    async fn test_missing_binary_names_the_program() {
        let result = execute(
            &tokens(&["open-cli-mcp-no-such-binary"]),
            Duration::from_secs(5),
        )
        .await;
        assert!(!result.success);
        let error = result.launch_error.unwrap();
        assert!(error.contains("open-cli-mcp-no-such-binary"), "{}", error);
        assert!(result.exit_code.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_captured_as_raw_text() {
        let result = execute(&tokens(&["echo", "hello world"]), Duration::from_secs(5)).await;
        assert!(result.success);
        assert_eq!(result.exit_code, Some(0));
        assert_eq!(result.output, CommandOutput::Raw("hello world".to_string()));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_json_stdout_classified_as_structured() {
        let result = execute(
            &tokens(&["echo", r#"{"ok": true}"#]),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(
            result.output,
            CommandOutput::Structured(serde_json::json!({"ok": true}))
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_reported_not_raised() {
        let result = execute(&tokens(&["sh", "-c", "exit 7"]), Duration::from_secs(5)).await;
        assert!(!result.success);
        assert_eq!(result.exit_code, Some(7));
        assert!(result.launch_error.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_argument_content_is_not_shell_interpreted() {
        let result = execute(
            &tokens(&["echo", "$HOME; rm -rf /", "*"]),
            Duration::from_secs(5),
        )
        .await;
        assert_eq!(
            result.output,
            CommandOutput::Raw("$HOME; rm -rf / *".to_string())
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_child_and_discards_output() {
        let result = execute(
            &tokens(&["sh", "-c", "echo partial; sleep 10"]),
            Duration::from_millis(300),
        )
        .await;
        assert!(!result.success);
        let error = result.launch_error.unwrap();
        assert!(error.contains("超时"), "{}", error);
        assert_eq!(result.output, CommandOutput::Empty);
        assert!(result.exit_code.is_none());
    }
}
