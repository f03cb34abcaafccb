use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sms_errors::{SmsError, SmsResult};
use uuid::Uuid;

/// 一条待发送的短信任务
///
/// 任务创建后不可修改：它只会在队列和worker之间移动，
/// 投递成功后被消费，失败后原样放回队尾。
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendTask {
    id: Uuid,
    phone: String,
    message: String,
    submitted_at: DateTime<Utc>,
}

impl SendTask {
    /// 创建新任务，手机号和内容都不能为空
    pub fn new(phone: impl Into<String>, message: impl Into<String>) -> SmsResult<Self> {
        let phone = phone.into();
        let message = message.into();

        if phone.trim().is_empty() {
            return Err(SmsError::malformed("phone不能为空"));
        }
        if message.is_empty() {
            return Err(SmsError::malformed("message不能为空"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            phone,
            message,
            submitted_at: Utc::now(),
        })
    }

    /// 从前端原始数据解码任务
    ///
    /// 接受 `{"phone": "...", "message": "..."}`，`text` 作为 `message` 的别名。
    /// 任何格式问题都返回 [`SmsError::MalformedInput`]，不会进入队列。
    pub fn decode(data: &[u8]) -> SmsResult<Self> {
        let payload: SendTaskPayload = serde_json::from_slice(data)
            .map_err(|e| SmsError::malformed(format!("解析任务数据失败: {e}")))?;
        Self::new(payload.phone, payload.message)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phone(&self) -> &str {
        &self.phone
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

impl fmt::Display for SendTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SendTask({} -> {})", self.id, self.phone)
    }
}

#[derive(Debug, Deserialize)]
struct SendTaskPayload {
    phone: String,
    #[serde(alias = "text")]
    message: String,
}

/// Worker生命周期状态
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    #[default]
    Stopped,
    Running,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerState::Stopped => write!(f, "stopped"),
            WorkerState::Running => write!(f, "running"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task() {
        let task = SendTask::new("+375257654321", "hello").unwrap();
        assert_eq!(task.phone(), "+375257654321");
        assert_eq!(task.message(), "hello");
        assert!(task.submitted_at() <= Utc::now());
    }

    #[test]
    fn test_new_task_rejects_empty_fields() {
        assert!(matches!(
            SendTask::new("", "hello"),
            Err(SmsError::MalformedInput(_))
        ));
        assert!(matches!(
            SendTask::new("   ", "hello"),
            Err(SmsError::MalformedInput(_))
        ));
        assert!(matches!(
            SendTask::new("+375257654321", ""),
            Err(SmsError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_task_ids_are_unique() {
        let a = SendTask::new("+375257654321", "hello").unwrap();
        let b = SendTask::new("+375257654321", "hello").unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(a, b);
    }

    #[test]
    fn test_decode_valid_payload() {
        let task = SendTask::decode(br#"{"phone": "+375257654321", "message": "hello"}"#).unwrap();
        assert_eq!(task.phone(), "+375257654321");
        assert_eq!(task.message(), "hello");
    }

    #[test]
    fn test_decode_accepts_text_alias() {
        let task = SendTask::decode(br#"{"phone": "+375257654321", "text": "hi"}"#).unwrap();
        assert_eq!(task.message(), "hi");
    }

    #[test]
    fn test_decode_malformed_input() {
        let cases: [&[u8]; 5] = [
            b"not json",
            br#"{"phone": "+375257654321"}"#,
            br#"{"message": "hello"}"#,
            br#"{"phone": "", "message": "hello"}"#,
            br#"{"phone": 375257654321, "message": "hello"}"#,
        ];

        for data in cases {
            let result = SendTask::decode(data);
            assert!(
                matches!(result, Err(SmsError::MalformedInput(_))),
                "expected MalformedInput for {:?}",
                String::from_utf8_lossy(data)
            );
        }
    }

    #[test]
    fn test_worker_state_display() {
        assert_eq!(WorkerState::Stopped.to_string(), "stopped");
        assert_eq!(WorkerState::Running.to_string(), "running");
        assert_eq!(WorkerState::default(), WorkerState::Stopped);
        assert_eq!(
            serde_json::to_string(&WorkerState::Running).unwrap(),
            "\"running\""
        );
    }
}
