//! Huawei HiLink调制解调器的HTTP客户端
//!
//! 设备通过XML接口收发短信，这里只用到存活探测和发送两个接口。

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use sms_config::GatewayConfig;
use sms_domain::GatewayClient;
use sms_errors::{SmsError, SmsResult};
use tracing::{debug, warn};

const DEVICE_INFORMATION_PATH: &str = "/api/device/information";
const SEND_SMS_PATH: &str = "/api/sms/send-sms";

pub struct HiLinkGatewayClient {
    client: Client,
    host: String,
    probe_timeout: Duration,
}

impl HiLinkGatewayClient {
    pub fn new(config: &GatewayConfig) -> SmsResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| SmsError::Network(format!("创建HTTP客户端失败: {e}")))?;

        Ok(Self {
            client,
            host: config.host.trim_end_matches('/').to_string(),
            probe_timeout: Duration::from_secs(config.probe_timeout_seconds),
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.host, path)
    }
}

#[async_trait]
impl GatewayClient for HiLinkGatewayClient {
    async fn probe_alive(&self) -> bool {
        let result = self
            .client
            .get(self.url(DEVICE_INFORMATION_PATH))
            .timeout(self.probe_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status() == StatusCode::OK => true,
            Ok(response) => {
                warn!(host = %self.host, status = %response.status(), "网关探测返回异常状态");
                false
            }
            Err(e) => {
                warn!(host = %self.host, "网关不可达: {}", e);
                false
            }
        }
    }

    async fn send(&self, phone: &str, message: &str) -> bool {
        let body = build_send_request(phone, message, Local::now());

        let response = match self
            .client
            .post(self.url(SEND_SMS_PATH))
            .header(CONTENT_TYPE, "application/xml")
            .body(body)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(host = %self.host, phone = %phone, "发送请求失败: {}", e);
                return false;
            }
        };

        let status = response.status();
        if status != StatusCode::OK {
            warn!(host = %self.host, phone = %phone, status = %status, "网关拒绝发送请求");
            return false;
        }

        match response.text().await {
            Ok(text) if is_ok_response(&text) => {
                debug!(phone = %phone, "网关确认发送");
                true
            }
            Ok(text) => {
                warn!(phone = %phone, response = %text, "网关返回错误");
                false
            }
            Err(e) => {
                warn!(phone = %phone, "读取网关响应失败: {}", e);
                false
            }
        }
    }
}

/// 生成send-sms请求体，长度按字符数计算
pub fn build_send_request(phone: &str, message: &str, now: DateTime<Local>) -> String {
    format!(
        "<request><Index>-1</Index><Phones><Phone>{}</Phone></Phones><Sca></Sca>\
         <Content>{}</Content><Length>{}</Length><Reserved>1</Reserved>\
         <Date>{}</Date></request>",
        escape_xml(phone),
        escape_xml(message),
        message.chars().count(),
        now.format("%Y-%m-%d %H:%M:%S"),
    )
}

/// 成功响应形如 `<response>OK</response>`，失败时设备返回 `<error>`
fn is_ok_response(body: &str) -> bool {
    let Some(root) = skip_prolog(body) else {
        return false;
    };
    let Some(content) = root.strip_prefix("<response>") else {
        return false;
    };
    match content.find("</response>") {
        Some(end) => content[..end].trim() == "OK",
        None => false,
    }
}

/// 跳过XML声明和注释，返回根元素开始的位置
fn skip_prolog(body: &str) -> Option<&str> {
    let mut rest = body.trim_start();
    loop {
        if let Some(after) = rest.strip_prefix("<?") {
            let end = after.find("?>")?;
            rest = after[end + "?>".len()..].trim_start();
        } else if let Some(after) = rest.strip_prefix("<!--") {
            let end = after.find("-->")?;
            rest = after[end + "-->".len()..].trim_start();
        } else {
            return Some(rest);
        }
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
