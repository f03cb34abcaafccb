//! 分发事件
//!
//! worker每次状态迁移都会产生一个事件，交给观察者记录日志或指标。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 投递失败原因，两者走同一条重试路径
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// 存活探测失败
    GatewayUnreachable,
    /// 网关拒绝了本次发送
    SendRejected,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::GatewayUnreachable => "gateway_unreachable",
            FailureReason::SendRejected => "send_rejected",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "event", content = "reason")]
pub enum DispatchEvent {
    /// 任务已入队
    Submitted,
    /// worker已停止，任务被拒绝
    Rejected,
    /// 网关确认发送成功
    Delivered,
    /// 手机号无效，任务被丢弃
    Dropped,
    /// 投递失败，任务已放回队尾
    Failed(FailureReason),
}

impl DispatchEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DispatchEvent::Submitted => "submitted",
            DispatchEvent::Rejected => "rejected",
            DispatchEvent::Delivered => "delivered",
            DispatchEvent::Dropped => "dropped",
            DispatchEvent::Failed(_) => "failed",
        }
    }
}
