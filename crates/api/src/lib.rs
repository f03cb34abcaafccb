//! # SMS API
//!
//! 短信网关的REST前端，基于Axum构建，只负责把HTTP请求转成worker提交。
//!
//! ## API 端点
//!
//! - `POST /api/v1/sms/send` - 提交一条短信
//! - `GET /api/v1/sms/task_count` - 当前排队任务数
//! - `GET /health` - 健康检查
//! - `GET /metrics` - Prometheus指标
//!
//! ## 响应格式
//!
//! ### 成功响应
//! ```json
//! {
//!   "success": true,
//!   "data": { "task_id": "0b6f...", "pending": 1 },
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```
//!
//! ### 错误响应
//! ```json
//! {
//!   "success": false,
//!   "error": { "code": "INVALID_PHONE", "message": "Invalid phone number" },
//!   "timestamp": "2024-01-01T00:00:00Z"
//! }
//! ```

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod resources;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use routes::{create_routes, AppState};
