//! 运行日志缓冲
//!
//! 收集本次运行中需要推送给用户的日志，同时输出到 tracing

use phf::phf_ordered_map;
use tracing::info;

/// 关键字 → emoji，按顺序匹配第一个命中的关键字
static EMOJI_MAP: phf::OrderedMap<&'static str, &'static str> = phf_ordered_map! {
    "正在续费" => "🔄",
    "检测到" => "🔍",
    "无需更新" => "✅",
    "续订错误" => "⚠️",
    "续期失败" => "⚠️",
    "已成功续订" => "🎉",
    "所有工作完成" => "🏁",
    "登录失败" => "❗",
    "验证通过" => "✔️",
    "验证失败" => "❌",
    "验证码是" => "🔢",
    "登录尝试" => "🔑",
    "ServerID" => "🔗",
    "[MailParser]" => "📧",
    "[Captcha Solver]" => "🧩",
    "[AutoEUServerless]" => "🌐",
};

/// 本次运行的日志缓冲
#[derive(Debug, Default, Clone)]
pub struct RunLog {
    entries: Vec<String>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一条日志，并按关键字加上 emoji 前缀
    pub fn push(&mut self, message: impl Into<String>) {
        let message = decorate(message.into());
        info!("{}", message);
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// 拼接为完整文本
    pub fn text(&self) -> String {
        self.entries.join("\n")
    }
}

fn decorate(message: String) -> String {
    match EMOJI_MAP.entries().find(|(key, _)| message.contains(*key)) {
        Some((_, emoji)) => format!("{} {}", emoji, message),
        None => message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_matching_keyword_wins() {
        let mut log = RunLog::new();
        log.push("[AutoEUServerless] ServerID: 1234 无需更新");
        log.push("[MailParser] PIN: 123456");
        log.push("plain line");

        assert_eq!(log.entries()[0], "✅ [AutoEUServerless] ServerID: 1234 无需更新");
        assert_eq!(log.entries()[1], "📧 [MailParser] PIN: 123456");
        assert_eq!(log.entries()[2], "plain line");
    }

    #[test]
    fn test_text_joins_lines() {
        let mut log = RunLog::new();
        assert!(log.entries().is_empty());
        log.push("a");
        log.push("b");
        assert_eq!(log.text(), "a\nb");
    }
}
