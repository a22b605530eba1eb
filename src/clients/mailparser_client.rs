/// Mailparser 客户端
///
/// Mailparser 解析面板发来的 PIN 邮件，并通过下载链接提供 JSON 数组，
/// 数组第一项的 `pin` 字段即最新的 PIN
use crate::config::Config;
use crate::error::{AppResult, PinError};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

pub struct MailparserClient {
    http: Client,
    base_url: String,
}

impl MailparserClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            base_url: config.mailparser_base_url.clone(),
        }
    }

    /// 获取当前的 PIN
    ///
    /// # 返回
    /// 下载链接中还没有任何数据时返回 None
    pub async fn fetch_pin(&self, url_id: &str) -> AppResult<Option<String>> {
        let url = format!("{}{}", self.base_url, url_id);
        let payload: Value = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(PinError::RequestFailed)?
            .json()
            .await
            .map_err(PinError::RequestFailed)?;

        debug!("Mailparser 响应: {}", payload);
        parse_pin_payload(&payload)
    }
}

/// 解析 Mailparser 返回的 JSON
///
/// 空数组表示尚无数据；首项存在但没有 `pin` 字段视为错误。
/// `pin` 可能是字符串也可能是数字
pub fn parse_pin_payload(payload: &Value) -> AppResult<Option<String>> {
    let Some(first) = payload.as_array().and_then(|items| items.first()) else {
        return Ok(None);
    };
    let pin = match first.get("pin") {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => return Err(PinError::Missing.into()),
    };
    Ok(Some(pin))
}
