use async_trait::async_trait;

/// 短信网关客户端
///
/// 每次调用都是一次完整的尝试，只有成功和失败两种结果。
#[async_trait]
pub trait GatewayClient: Send + Sync {
    /// 网关存活探测
    async fn probe_alive(&self) -> bool;

    /// 发送一条短信
    async fn send(&self, phone: &str, message: &str) -> bool;
}
