use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sms_domain::PhoneValidator;
use sms_worker::WorkerHandle;

use crate::handlers::{
    health::health_check,
    metrics::prometheus_metrics,
    sms::{get_task_count, send_sms},
};
use crate::middleware::{cors_layer, trace_layer};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub worker: Arc<WorkerHandle>,
    pub validator: Arc<dyn PhoneValidator>,
    /// 未安装recorder时 `/metrics` 返回404
    pub metrics: Option<PrometheusHandle>,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(prometheus_metrics))
        .route("/api/v1/sms/send", post(send_sms))
        .route("/api/v1/sms/task_count", get(get_task_count))
        .with_state(state)
        .layer(cors_layer())
        .layer(trace_layer())
}
