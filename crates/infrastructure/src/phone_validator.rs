use regex::Regex;
use sms_domain::PhoneValidator;
use sms_errors::{SmsError, SmsResult};
use tracing::warn;

/// E.164号码长度为8到15位，国家码不以0开头
const E164_PATTERN: &str = r"^[1-9][0-9]{7,14}$";

/// 国际格式手机号校验
///
/// 允许可选的前导 `+`，以及空格、`-`、括号作为分隔符。
/// 先做E.164长度检查，再按libphonenumber的号段元数据判断号码是否已分配，
/// 未分配的国家码或号段直接视为无效。
pub struct E164PhoneValidator {
    pattern: Regex,
}

impl E164PhoneValidator {
    pub fn new() -> SmsResult<Self> {
        let pattern = Regex::new(E164_PATTERN)
            .map_err(|e| SmsError::Internal(format!("编译手机号正则失败: {e}")))?;
        Ok(Self { pattern })
    }

    fn normalize(phone: &str) -> Option<String> {
        let trimmed = phone.trim();
        let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
        let digits: String = body
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
            .collect();

        if digits.is_empty() {
            None
        } else {
            Some(digits)
        }
    }
}

impl PhoneValidator for E164PhoneValidator {
    fn is_valid(&self, phone: &str) -> bool {
        let Some(digits) = Self::normalize(phone) else {
            warn!(phone = %phone, "手机号为空");
            return false;
        };

        if !self.pattern.is_match(&digits) {
            warn!(phone = %phone, "手机号格式无效");
            return false;
        }

        let number = match phonenumber::parse(None, format!("+{digits}")) {
            Ok(number) => number,
            Err(e) => {
                warn!(phone = %phone, "手机号解析失败: {}", e);
                return false;
            }
        };

        if !phonenumber::is_valid(&number) {
            warn!(phone = %phone, "手机号未分配或不存在");
            return false;
        }

        true
    }
}
