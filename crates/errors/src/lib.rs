use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("手机号校验失败: {0}")]
    Validation(String),
    #[error("Worker已停止，拒绝新任务")]
    LifecycleRejection,
    #[error("无效的任务数据: {0}")]
    MalformedInput(String),
    #[error("Worker已在运行")]
    AlreadyRunning,
    #[error("消息队列错误: {0}")]
    MessageQueue(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("网络错误: {0}")]
    Network(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type SmsResult<T> = Result<T, SmsError>;

impl SmsError {
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Self::Validation(msg.into())
    }
    pub fn malformed<S: Into<String>>(msg: S) -> Self {
        Self::MalformedInput(msg.into())
    }
}

impl From<serde_json::Error> for SmsError {
    fn from(err: serde_json::Error) -> Self {
        SmsError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for SmsError {
    fn from(err: anyhow::Error) -> Self {
        SmsError::Internal(err.to_string())
    }
}
