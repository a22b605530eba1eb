/// Telegram Bot 客户端
use crate::config::Config;
use crate::error::{AppResult, NotifyError};
use reqwest::Client;
use tracing::debug;

pub struct TelegramClient {
    http: Client,
    api_host: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    /// Bot token 或 chat id 缺失时返回 None
    pub fn from_config(http: Client, config: &Config) -> Option<Self> {
        Some(Self {
            http,
            api_host: config.tg_api_host.clone(),
            bot_token: config.tg_bot_token.clone()?,
            chat_id: config.tg_user_id.clone()?,
        })
    }

    /// 发送一条 HTML 格式的消息
    pub async fn send_message(&self, html: &str) -> AppResult<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_host, self.bot_token);
        let form = [
            ("chat_id", self.chat_id.as_str()),
            ("text", html),
            ("parse_mode", "HTML"),
            ("disable_web_page_preview", "true"),
        ];

        let resp = self
            .http
            .post(&url)
            .form(&form)
            .send()
            .await
            .map_err(|e| NotifyError::Telegram(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(NotifyError::Telegram(format!("HTTP {}: {}", status, body)).into());
        }
        debug!("Telegram 消息已发送 ({} 字符)", html.chars().count());
        Ok(())
    }
}
