use crate::{ConfigError, ConfigResult};

/// 配置段校验
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

pub struct ValidationUtils;

impl ValidationUtils {
    pub fn validate_not_empty(value: &str, field: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(ConfigError::Validation(format!("{field} cannot be empty")));
        }
        Ok(())
    }

    pub fn validate_http_url(value: &str, field: &str) -> ConfigResult<()> {
        Self::validate_not_empty(value, field)?;
        if !value.starts_with("http://") && !value.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "{field} must start with http:// or https://, got: {value}"
            )));
        }
        Ok(())
    }

    pub fn validate_timeout_seconds(value: u64, field: &str) -> ConfigResult<()> {
        if value == 0 {
            return Err(ConfigError::Validation(format!(
                "{field} must be greater than 0"
            )));
        }
        if value > 3600 {
            return Err(ConfigError::Validation(format!(
                "{field} must not exceed 3600 seconds"
            )));
        }
        Ok(())
    }

    pub fn validate_socket_addr(value: &str, field: &str) -> ConfigResult<()> {
        value.parse::<std::net::SocketAddr>().map_err(|e| {
            ConfigError::Validation(format!("{field} is not a valid socket address ({value}): {e}"))
        })?;
        Ok(())
    }
}
