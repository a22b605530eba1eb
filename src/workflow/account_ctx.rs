//! 账号处理上下文
//!
//! 封装"我正在处理第几个账号"这一信息

use std::fmt::Display;

/// 账号处理上下文
#[derive(Debug, Clone)]
pub struct AccountCtx {
    /// 账号序号（从1开始）
    pub index: usize,

    /// 账号总数
    pub total: usize,

    /// 用户名（仅用于日志显示）
    pub username: String,
}

impl AccountCtx {
    pub fn new(index: usize, total: usize, username: impl Into<String>) -> Self {
        Self {
            index,
            total,
            username: username.into(),
        }
    }
}

impl Display for AccountCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[账号 {}/{} {}]", self.index, self.total, self.username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let ctx = AccountCtx::new(2, 3, "a@x.com");
        assert_eq!(ctx.to_string(), "[账号 2/3 a@x.com]");
    }
}
