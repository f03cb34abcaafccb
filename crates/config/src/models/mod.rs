pub mod api_observability;
pub mod app_config;
pub mod gateway_worker;
pub mod message_queue;

pub use api_observability::{ApiConfig, LogFormat, ObservabilityConfig};
pub use app_config::AppConfig;
pub use gateway_worker::{GatewayConfig, WorkerConfig};
pub use message_queue::MessageQueueConfig;
