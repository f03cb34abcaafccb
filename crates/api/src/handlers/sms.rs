use axum::{body::Bytes, extract::State, response::IntoResponse};
use serde::{Deserialize, Serialize};
use sms_domain::SendTask;
use sms_errors::SmsError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{error::ApiResult, response::success, routes::AppState};

#[derive(Debug, Serialize, Deserialize)]
pub struct SendSmsResponse {
    pub task_id: Uuid,
    pub pending: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskCountResponse {
    pub count: usize,
}

/// 提交一条短信
///
/// 请求体为 `{"phone": "...", "message": "..."}`。手机号在这里先校验一次，
/// worker发送前还会再校验。
pub async fn send_sms(State(state): State<AppState>, body: Bytes) -> ApiResult<impl IntoResponse> {
    let task = SendTask::decode(&body)?;

    if !state.validator.is_valid(task.phone()) {
        warn!(phone = %task.phone(), "拒绝无效手机号");
        return Err(SmsError::validation(format!("无效的手机号: {}", task.phone())).into());
    }

    let task_id = state.worker.try_submit(task)?;
    let pending = state.worker.pending_count();
    info!(task_id = %task_id, pending, "短信任务已提交");

    Ok(success(SendSmsResponse { task_id, pending }))
}

pub async fn get_task_count(State(state): State<AppState>) -> impl IntoResponse {
    success(TaskCountResponse {
        count: state.worker.pending_count(),
    })
}
