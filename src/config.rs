use std::time::Duration;

/// 网关超时配置。
///
/// 所有值单位为秒，可通过环境变量覆盖（`OPEN_CLI_MCP_TIMEOUT_SECS` 等）。
/// 进程启动时构造一次，之后只读。
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// 通用 CLI 调用超时
    pub call_timeout_secs: u64,
    /// 工具探测（版本检查）超时
    pub probe_timeout_secs: u64,
    /// `brew outdated` 查询超时
    pub outdated_timeout_secs: u64,
    /// `brew tap` 超时
    pub tap_timeout_secs: u64,
    /// 批量安装/升级超时
    pub batch_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            call_timeout_secs: 60,
            probe_timeout_secs: 5,
            outdated_timeout_secs: 30,
            tap_timeout_secs: 60,
            batch_timeout_secs: 300, // 5分钟
        }
    }
}

impl GatewayConfig {
    /// 从环境变量读取配置，未设置的项保持默认值。
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.call_timeout_secs = env_secs("OPEN_CLI_MCP_TIMEOUT_SECS", config.call_timeout_secs);
        config.probe_timeout_secs =
            env_secs("OPEN_CLI_MCP_PROBE_TIMEOUT_SECS", config.probe_timeout_secs);
        config.outdated_timeout_secs = env_secs(
            "OPEN_CLI_MCP_OUTDATED_TIMEOUT_SECS",
            config.outdated_timeout_secs,
        );
        config.tap_timeout_secs = env_secs("OPEN_CLI_MCP_TAP_TIMEOUT_SECS", config.tap_timeout_secs);
        config.batch_timeout_secs =
            env_secs("OPEN_CLI_MCP_BATCH_TIMEOUT_SECS", config.batch_timeout_secs);
        config
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn outdated_timeout(&self) -> Duration {
        Duration::from_secs(self.outdated_timeout_secs)
    }

    pub fn tap_timeout(&self) -> Duration {
        Duration::from_secs(self.tap_timeout_secs)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }
}

fn env_secs(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let config = GatewayConfig::default();
        assert_eq!(config.call_timeout(), Duration::from_secs(60));
        assert_eq!(config.probe_timeout(), Duration::from_secs(5));
        assert_eq!(config.batch_timeout(), Duration::from_secs(300));
    }
}
