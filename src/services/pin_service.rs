//! PIN 获取服务 - 业务能力层
//!
//! 触发 PIN 邮件后按固定间隔轮询 Mailparser，直到出现一个新的 6 位 PIN

use crate::clients::MailparserClient;
use crate::config::Config;
use crate::error::{AppResult, PinError};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

pub struct PinService {
    client: MailparserClient,
    initial_wait: Duration,
    poll_interval: Duration,
    max_polls: u32,
}

impl PinService {
    pub fn new(client: MailparserClient, config: &Config) -> Self {
        Self {
            client,
            initial_wait: config.pin_wait,
            poll_interval: config.pin_poll_interval,
            max_polls: config.pin_max_polls.max(1),
        }
    }

    /// 记录触发前 Mailparser 中已有的 PIN，用于识别旧邮件
    pub async fn snapshot(&self, url_id: &str) -> Option<String> {
        match self.client.fetch_pin(url_id).await {
            Ok(pin) => pin,
            Err(e) => {
                debug!("获取旧 PIN 失败（忽略）: {}", e);
                None
            }
        }
    }

    /// 等待新的 PIN
    ///
    /// # 参数
    /// - `url_id`: Mailparser 下载 ID
    /// - `previous`: 触发前已存在的 PIN，与之相同的结果视为旧邮件
    pub async fn wait_for_pin(&self, url_id: &str, previous: Option<&str>) -> AppResult<String> {
        sleep(self.initial_wait).await;

        for poll in 1..=self.max_polls {
            match self.client.fetch_pin(url_id).await {
                Ok(Some(pin)) if is_fresh_pin(&pin, previous) => return Ok(pin),
                Ok(Some(pin)) => debug!(
                    "第 {}/{} 次轮询: PIN {} 无效或尚未更新",
                    poll, self.max_polls, pin
                ),
                Ok(None) => debug!("第 {}/{} 次轮询: Mailparser 暂无数据", poll, self.max_polls),
                Err(e) => warn!("第 {}/{} 次轮询失败: {}", poll, self.max_polls, e),
            }
            if poll < self.max_polls {
                sleep(self.poll_interval).await;
            }
        }

        Err(PinError::Timeout {
            polls: self.max_polls,
        }
        .into())
    }
}

/// PIN 为 6 位数字
pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 6 && pin.chars().all(|c| c.is_ascii_digit())
}

fn is_fresh_pin(pin: &str, previous: Option<&str>) -> bool {
    is_valid_pin(pin) && previous != Some(pin)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_pin() {
        assert!(is_valid_pin("012345"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("1234567"));
        assert!(!is_valid_pin("12a456"));
    }

    #[test]
    fn test_stale_pin_is_rejected() {
        assert!(is_fresh_pin("123456", None));
        assert!(is_fresh_pin("123456", Some("654321")));
        assert!(!is_fresh_pin("123456", Some("123456")));
    }
}
