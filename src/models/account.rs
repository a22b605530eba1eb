use std::fmt;

/// 一个 EUserv 账号及其对应的 Mailparser 下载 ID
#[derive(Clone)]
pub struct Account {
    pub username: String,
    pub password: String,
    pub mailparser_id: String,
}

impl Account {
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        mailparser_id: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            mailparser_id: mailparser_id.into(),
        }
    }
}

// 密码不进日志
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("username", &self.username)
            .field("password", &"***")
            .field("mailparser_id", &self.mailparser_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_hides_password() {
        let account = Account::new("a@x.com", "hunter2", "mp");
        let debug = format!("{:?}", account);
        assert!(debug.contains("a@x.com"));
        assert!(!debug.contains("hunter2"));
    }
}
