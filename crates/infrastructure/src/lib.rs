pub mod hilink;
pub mod phone_validator;
pub mod prometheus;
pub mod rabbitmq;

pub use hilink::HiLinkGatewayClient;
pub use phone_validator::E164PhoneValidator;
pub use prometheus::install_prometheus_recorder;
pub use rabbitmq::{handle_payload, DeliveryDecision, RabbitMqConsumer};
