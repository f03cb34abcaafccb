use metrics::{describe_counter, describe_gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sms_errors::{SmsError, SmsResult};
use tracing::info;

/// 安装全局Prometheus recorder，返回的句柄用于 `/metrics` 渲染
///
/// 每个进程只能调用一次。
pub fn install_prometheus_recorder() -> SmsResult<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| SmsError::Internal(format!("安装Prometheus recorder失败: {e}")))?;

    describe_counter!("sms_tasks_submitted_total", "Tasks accepted into the queue");
    describe_counter!(
        "sms_tasks_rejected_total",
        "Submissions refused because the worker was stopped"
    );
    describe_counter!("sms_tasks_delivered_total", "Messages confirmed by the gateway");
    describe_counter!(
        "sms_tasks_dropped_total",
        "Tasks discarded because of an invalid phone number"
    );
    describe_counter!(
        "sms_delivery_failures_total",
        "Failed delivery attempts by reason"
    );
    describe_gauge!("sms_queue_depth", "Tasks waiting in the queue");

    info!("Prometheus metrics recorder installed");
    Ok(handle)
}
