use serde::{Deserialize, Serialize};

use crate::validation::{ConfigValidator, ValidationUtils};

/// HiLink网关设备配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub request_timeout_seconds: u64,
    pub probe_timeout_seconds: u64,
    /// 每次发送前是否先做存活探测
    pub probe_before_send: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "http://192.168.8.1".to_string(),
            request_timeout_seconds: 5,
            probe_timeout_seconds: 2,
            probe_before_send: true,
        }
    }
}

impl ConfigValidator for GatewayConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_http_url(&self.host, "gateway.host")?;
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "gateway.request_timeout_seconds",
        )?;
        ValidationUtils::validate_timeout_seconds(
            self.probe_timeout_seconds,
            "gateway.probe_timeout_seconds",
        )?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkerConfig {
    /// 投递失败后的固定等待时间，重试次数不设上限
    pub retry_delay_seconds: u64,
    /// start()之前是否接受提交
    pub accept_before_start: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            retry_delay_seconds: 15,
            accept_before_start: true,
        }
    }
}

impl ConfigValidator for WorkerConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.retry_delay_seconds,
            "worker.retry_delay_seconds",
        )
    }
}
