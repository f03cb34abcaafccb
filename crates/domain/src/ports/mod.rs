pub mod gateway;
pub mod observer;
pub mod validation;

pub use gateway::GatewayClient;
pub use observer::{DispatchObserver, NoopObserver};
pub use validation::PhoneValidator;
