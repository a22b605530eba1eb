//! 通知服务 - 业务能力层
//!
//! 把本次运行日志推送到 Telegram 和邮箱，推送失败只记录，不影响退出码

use crate::clients::{EmailClient, TelegramClient};
use crate::config::Config;
use crate::utils::RunLog;
use reqwest::Client;
use tracing::{error, info};

pub const TELEGRAM_TITLE: &str = "AutoEUServerless 日志";
pub const EMAIL_SUBJECT: &str = "EUserv 续费日志";
/// Telegram 单条消息的长度上限
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

pub struct Notifier {
    telegram: Option<TelegramClient>,
    email: Option<EmailClient>,
}

impl Notifier {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            telegram: TelegramClient::from_config(http, config),
            email: EmailClient::from_config(config),
        }
    }

    /// 是否配置了任何通知渠道
    pub fn is_enabled(&self) -> bool {
        self.telegram.is_some() || self.email.is_some()
    }

    /// 推送运行日志
    pub async fn notify(&self, log: &RunLog) {
        let text = log.text();

        if let Some(telegram) = &self.telegram {
            let mut sent = true;
            for message in format_telegram_messages(&text) {
                if let Err(e) = telegram.send_message(&message).await {
                    error!("❌ {}", e);
                    sent = false;
                    break;
                }
            }
            if sent {
                info!("✅ Telegram Bot 推送成功");
            }
        }

        if let Some(email) = &self.email {
            match email.send(EMAIL_SUBJECT, &text).await {
                Ok(()) => info!("✅ Email 发送成功"),
                Err(e) => error!("❌ {}", e),
            }
        }
    }
}

/// 转义 Telegram HTML 模式下的特殊字符
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        push_escaped(&mut out, c);
    }
    out
}

fn push_escaped(out: &mut String, c: char) {
    match c {
        '&' => out.push_str("&amp;"),
        '<' => out.push_str("&lt;"),
        '>' => out.push_str("&gt;"),
        _ => out.push(c),
    }
}

/// 转义后占用的字符数
fn escaped_len(c: char) -> usize {
    match c {
        '&' => 5,
        '<' | '>' => 4,
        _ => 1,
    }
}

/// 生成 Telegram 消息，超长时拆分为多条，每条都带标题
pub fn format_telegram_messages(log_text: &str) -> Vec<String> {
    let header = format!("<b>{}</b>\n\n", TELEGRAM_TITLE);
    let budget = TELEGRAM_MESSAGE_LIMIT - header.chars().count();
    split_escaped(log_text, budget)
        .into_iter()
        .map(|chunk| format!("{}{}", header, chunk))
        .collect()
}

/// 按行拆分原始文本并转义，每段转义后不超过 `limit` 个字符
///
/// 单行超长时按字符强制截断，实体（`&amp;` 等）不会被截开
pub fn split_escaped(text: &str, limit: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len: usize = line.chars().map(escaped_len).sum();
        let sep = usize::from(!current.is_empty());

        if current_len + sep + line_len <= limit {
            if sep == 1 {
                current.push('\n');
            }
            line.chars().for_each(|c| push_escaped(&mut current, c));
            current_len += sep + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        for c in line.chars() {
            let width = escaped_len(c);
            if current_len + width > limit && !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            push_escaped(&mut current, c);
            current_len += width;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b> & c"), "a&lt;b&gt; &amp; c");
    }

    #[test]
    fn test_short_message_single_chunk() {
        let messages = format_telegram_messages("🎉 ServerID: 1 已成功续订!\n🏁 所有工作完成");
        assert_eq!(messages.len(), 1);
        assert!(messages[0].starts_with("<b>AutoEUServerless 日志</b>\n\n"));
        assert!(messages[0].ends_with("所有工作完成"));
    }

    #[test]
    fn test_split_on_lines() {
        let chunks = split_escaped("aaaa\nbbbb\ncccc", 9);
        assert_eq!(chunks, vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn test_split_long_line() {
        let chunks = split_escaped("abcdefghij\nk", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij\nk"]);
        assert!(chunks.iter().all(|c| c.chars().count() <= 4));
    }

    #[test]
    fn test_split_counts_escaped_width() {
        assert_eq!(split_escaped("a&b", 6), vec!["a&amp;", "b"]);
        assert_eq!(split_escaped("<x>", 5), vec!["&lt;x", "&gt;"]);
    }

    #[test]
    fn test_long_line_never_cuts_entity() {
        let raw = format!("{}&&", "a".repeat(4090));
        let messages = format_telegram_messages(&raw);
        assert_eq!(messages.len(), 2);

        let header = format!("<b>{}</b>\n\n", TELEGRAM_TITLE);
        let mut body = String::new();
        for message in &messages {
            assert!(message.chars().count() <= TELEGRAM_MESSAGE_LIMIT);
            let chunk = message.strip_prefix(&header).unwrap();
            assert!(!chunk.starts_with("amp;"));
            body.push_str(chunk);
        }
        assert_eq!(body, escape_html(&raw));
        assert!(messages[1].ends_with("&amp;&amp;"));
    }

    #[test]
    fn test_notifier_disabled_without_config() {
        let notifier = Notifier::new(Client::new(), &Config::default());
        assert!(!notifier.is_enabled());
    }
}
