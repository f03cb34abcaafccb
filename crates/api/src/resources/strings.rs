//! 对外返回的错误文案

pub const PHONE_NUMBER_INVALID_ERROR: &str = "Invalid phone number";
pub const MALFORMED_REQUEST_ERROR: &str = "Malformed request";
pub const SERVICE_TEMPORARY_UNAVAILABLE: &str = "SMS service temporarily unavailable";
pub const NOT_FOUND_ERROR: &str = "Resource not found";
pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";
