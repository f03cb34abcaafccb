pub mod entities;
pub mod events;
pub mod messaging;
pub mod ports;

pub use entities::*;
pub use events::*;
pub use messaging::*;
pub use ports::*;
pub use sms_errors::{SmsError, SmsResult};
