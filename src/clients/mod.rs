pub mod email_client;
pub mod mailparser_client;
pub mod ocr_client;
pub mod portal_client;
pub mod telegram_client;

pub use email_client::EmailClient;
pub use mailparser_client::MailparserClient;
pub use ocr_client::{LocalOcrClient, OcrSpaceClient, TrueCaptchaClient};
pub use portal_client::PortalClient;
pub use telegram_client::TelegramClient;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// 第三方 API（OCR、Mailparser、Telegram）共用的 HTTP 客户端，不保存 cookie
pub fn api_client(config: &Config) -> AppResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
    if let Some(proxy) = &config.proxy_url {
        let proxy =
            reqwest::Proxy::all(proxy).map_err(|e| AppError::portal_request_failed("proxy", e))?;
        builder = builder.proxy(proxy);
    }
    builder
        .build()
        .map_err(|e| AppError::portal_request_failed("client", e))
}
