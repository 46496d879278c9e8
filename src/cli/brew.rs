use std::time::Duration;

use tracing::{debug, warn};

use super::envelope::{CommandOutput, CommandResult};
use super::executor;
use crate::config::GatewayConfig;
use crate::errors::GatewayError;

/// Homebrew 客户端：注册表中所有工具的包来源。
///
/// brew 自身的状态（已装包、tap 注册）在本进程之外被副作用修改，
/// 这里不加锁——并发的更新操作互相竞争是已知并接受的风险。
#[derive(Debug, Clone)]
pub struct HomebrewClient {
    brew_path: String,
    config: GatewayConfig,
}

impl HomebrewClient {
    /// 按宿主 CPU 架构选择 brew 安装前缀。
    pub fn detect(config: GatewayConfig) -> Self {
        let brew_path = if cfg!(target_arch = "aarch64") {
            "/opt/homebrew/bin/brew"
        } else {
            "/usr/local/bin/brew"
        };
        Self {
            brew_path: brew_path.to_string(),
            config,
        }
    }

    #[cfg(test)]
    pub fn with_path(brew_path: impl Into<String>, config: GatewayConfig) -> Self {
        Self {
            brew_path: brew_path.into(),
            config,
        }
    }

    /// `brew outdated --cask --greedy`，返回原始文本输出（每行一个过期包）。
    ///
    /// 查询失败不是静默吞掉而是显式返回错误，调用方据此把更新状态
    /// 标记为「未知」。
    pub async fn list_outdated(&self) -> Result<String, GatewayError> {
        let result = self
            .run(
                &["outdated", "--cask", "--greedy"],
                self.config.outdated_timeout(),
            )
            .await;

        if let Some(error) = result.launch_error {
            return Err(GatewayError::PackageSource(error));
        }
        if !result.success {
            return Err(GatewayError::PackageSource(format!(
                "brew outdated 退出码 {}: {}",
                result.exit_code.unwrap_or(-1),
                result.stderr.unwrap_or_default()
            )));
        }

        Ok(match result.output {
            CommandOutput::Raw(text) => text,
            // brew outdated 输出纯文本；恰好是合法 JSON 的行原样保留
            CommandOutput::Structured(value) => value.to_string(),
            CommandOutput::Empty => String::new(),
        })
    }

    /// 一次批量升级指定 cask，整批只发一次 brew 调用。
    pub async fn upgrade(&self, casks: &[String]) -> CommandResult {
        let mut args = vec!["upgrade", "--cask"];
        args.extend(casks.iter().map(String::as_str));
        self.run(&args, self.config.batch_timeout()).await
    }

    /// 一次批量安装指定 cask。
    pub async fn install(&self, casks: &[String]) -> CommandResult {
        let mut args = vec!["install", "--cask"];
        args.extend(casks.iter().map(String::as_str));
        self.run(&args, self.config.batch_timeout()).await
    }

    /// 注册 tap（幂等）。失败只记日志，不影响后续安装流程。
    pub async fn ensure_tap(&self, tap: &str) {
        let result = self.run(&["tap", tap], self.config.tap_timeout()).await;
        if !result.success {
            warn!(
                "注册 tap {} 失败（忽略）: {:?}",
                tap,
                result.launch_error.or(result.stderr)
            );
        } else {
            debug!("tap {} 已就绪", tap);
        }
    }

    async fn run(&self, args: &[&str], timeout: Duration) -> CommandResult {
        let mut tokens = Vec::with_capacity(args.len() + 1);
        tokens.push(self.brew_path.clone());
        tokens.extend(args.iter().map(|s| s.to_string()));
        executor::execute(&tokens, timeout).await
    }
}
