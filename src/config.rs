use crate::error::{AppResult, ConfigError};
use crate::models::Account;
use std::time::Duration;

/// OCR 服务种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OcrProviderKind {
    /// OCR.space 云端 API
    OcrSpace,
    /// TrueCaptcha 云端 API
    TrueCaptcha,
    /// 本地 ddddocr 识别服务
    Local,
}

impl OcrProviderKind {
    /// 从配置字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "ocrspace" | "ocr.space" | "ocr_space" => Some(OcrProviderKind::OcrSpace),
            "truecaptcha" => Some(OcrProviderKind::TrueCaptcha),
            "local" | "ddddocr" => Some(OcrProviderKind::Local),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            OcrProviderKind::OcrSpace => "OCR.space",
            OcrProviderKind::TrueCaptcha => "TrueCaptcha",
            OcrProviderKind::Local => "ddddocr",
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    // --- 账号 ---
    /// 空白分隔的用户名列表
    pub usernames: String,
    /// 空白分隔的密码列表
    pub passwords: String,
    /// 空白分隔的 Mailparser 下载 ID 列表
    pub mailparser_ids: String,
    pub mailparser_base_url: String,
    // --- 面板 ---
    pub portal_base_url: String,
    pub proxy_url: Option<String>,
    pub request_timeout: Duration,
    pub login_max_retry: u32,
    // --- PIN ---
    /// 触发 PIN 邮件后的首次等待时间
    pub pin_wait: Duration,
    pub pin_poll_interval: Duration,
    pub pin_max_polls: u32,
    // --- 节奏 ---
    /// 续期结束后到复查前的等待时间
    pub check_delay: Duration,
    /// 复查后到下一个账号前的等待时间
    pub account_cooldown: Duration,
    /// 提交续期后等待面板处理的时间
    pub renew_settle: Duration,
    // --- OCR ---
    pub ocr_providers: String,
    pub ocr_space_api_key: Option<String>,
    pub truecaptcha_user_id: Option<String>,
    pub truecaptcha_api_key: Option<String>,
    pub check_captcha_solver_usage: bool,
    pub local_ocr_url: String,
    // --- 通知 ---
    pub tg_bot_token: Option<String>,
    pub tg_user_id: Option<String>,
    pub tg_api_host: String,
    pub receiver_email: Option<String>,
    pub smtp_user: Option<String>,
    pub smtp_password: Option<String>,
    pub smtp_host: String,
    pub smtp_port: u16,
    /// 上次运行记录文件，为空时不读写
    pub run_marker_file: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            usernames: String::new(),
            passwords: String::new(),
            mailparser_ids: String::new(),
            mailparser_base_url: "https://files.mailparser.io/d/".to_string(),
            portal_base_url: "https://support.euserv.com".to_string(),
            proxy_url: None,
            request_timeout: Duration::from_secs(30),
            login_max_retry: 5,
            pin_wait: Duration::from_secs(15),
            pin_poll_interval: Duration::from_secs(5),
            pin_max_polls: 6,
            check_delay: Duration::from_secs(15),
            account_cooldown: Duration::from_secs(5),
            renew_settle: Duration::from_secs(5),
            ocr_providers: "ocrspace,local".to_string(),
            ocr_space_api_key: None,
            truecaptcha_user_id: None,
            truecaptcha_api_key: None,
            check_captcha_solver_usage: true,
            local_ocr_url: "http://127.0.0.1:9898".to_string(),
            tg_bot_token: None,
            tg_user_id: None,
            tg_api_host: "https://api.telegram.org".to_string(),
            receiver_email: None,
            smtp_user: None,
            smtp_password: None,
            smtp_host: "smtp.yandex.ru".to_string(),
            smtp_port: 465,
            run_marker_file: Some(".euserv_last_run.toml".to_string()),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 从任意键值来源构建配置，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| lookup(k).filter(|v| !v.trim().is_empty()))
        };
        let secs = |key: &str, default: Duration| {
            get(&[key])
                .and_then(|v| v.trim().parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };
        let default = Self::default();

        Self {
            usernames: get(&["EUSERV_USERNAME", "USERNAME"]).unwrap_or(default.usernames),
            passwords: get(&["EUSERV_PASSWORD", "PASSWORD"]).unwrap_or(default.passwords),
            mailparser_ids: get(&["MAILPARSER_DOWNLOAD_URL_ID"]).unwrap_or(default.mailparser_ids),
            mailparser_base_url: get(&["MAILPARSER_DOWNLOAD_BASE_URL"]).unwrap_or(default.mailparser_base_url),
            portal_base_url: get(&["PORTAL_BASE_URL"])
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.portal_base_url),
            proxy_url: get(&["PROXY_URL"]),
            request_timeout: secs("REQUEST_TIMEOUT_SECS", default.request_timeout),
            login_max_retry: get(&["LOGIN_MAX_RETRY_COUNT"]).and_then(|v| v.trim().parse().ok()).unwrap_or(default.login_max_retry),
            pin_wait: secs("WAITING_TIME_OF_PIN", default.pin_wait),
            pin_poll_interval: secs("PIN_POLL_INTERVAL", default.pin_poll_interval),
            pin_max_polls: get(&["PIN_MAX_POLLS"]).and_then(|v| v.trim().parse().ok()).unwrap_or(default.pin_max_polls),
            check_delay: secs("CHECK_DELAY_SECS", default.check_delay),
            account_cooldown: secs("ACCOUNT_COOLDOWN_SECS", default.account_cooldown),
            renew_settle: secs("RENEW_SETTLE_SECS", default.renew_settle),
            ocr_providers: get(&["OCR_PROVIDER"]).unwrap_or(default.ocr_providers),
            ocr_space_api_key: get(&["OCR_SPACE_API_KEY", "OCRSPACE_API_KEY", "OCR_SPACE_APIKEY"]),
            truecaptcha_user_id: get(&["TRUECAPTCHA_USERID"]),
            truecaptcha_api_key: get(&["TRUECAPTCHA_APIKEY"]),
            check_captcha_solver_usage: get(&["CHECK_CAPTCHA_SOLVER_USAGE"])
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default.check_captcha_solver_usage),
            local_ocr_url: get(&["LOCAL_OCR_URL"])
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.local_ocr_url),
            tg_bot_token: get(&["TG_BOT_TOKEN"]),
            tg_user_id: get(&["TG_USER_ID"]),
            tg_api_host: get(&["TG_API_HOST"])
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(default.tg_api_host),
            receiver_email: get(&["RECEIVER_EMAIL"]),
            smtp_user: get(&["SMTP_USER", "YD_EMAIL"]),
            smtp_password: get(&["SMTP_PASSWORD", "YD_APP_PWD"]),
            smtp_host: get(&["SMTP_HOST"]).unwrap_or(default.smtp_host),
            smtp_port: get(&["SMTP_PORT"]).and_then(|v| v.trim().parse().ok()).unwrap_or(default.smtp_port),
            run_marker_file: match lookup("RUN_MARKER_FILE") {
                Some(v) if v.trim().is_empty() => None,
                Some(v) => Some(v),
                None => default.run_marker_file,
            },
        }
    }

    /// 解析账号列表
    ///
    /// 用户名、密码、Mailparser ID 三个列表按空白分隔，数量必须一致
    pub fn accounts(&self) -> AppResult<Vec<Account>> {
        let usernames: Vec<&str> = self.usernames.split_whitespace().collect();
        let passwords: Vec<&str> = self.passwords.split_whitespace().collect();
        let mailparser_ids: Vec<&str> = self.mailparser_ids.split_whitespace().collect();

        if usernames.is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "EUSERV_USERNAME".to_string(),
            }
            .into());
        }
        if passwords.is_empty() {
            return Err(ConfigError::EnvVarNotFound {
                var_name: "EUSERV_PASSWORD".to_string(),
            }
            .into());
        }
        if usernames.len() != passwords.len() {
            return Err(ConfigError::CountMismatch {
                left: "EUSERV_USERNAME",
                right: "EUSERV_PASSWORD",
                left_len: usernames.len(),
                right_len: passwords.len(),
            }
            .into());
        }
        if mailparser_ids.len() != usernames.len() {
            return Err(ConfigError::CountMismatch {
                left: "MAILPARSER_DOWNLOAD_URL_ID",
                right: "EUSERV_USERNAME",
                left_len: mailparser_ids.len(),
                right_len: usernames.len(),
            }
            .into());
        }

        Ok(usernames
            .into_iter()
            .zip(passwords)
            .zip(mailparser_ids)
            .map(|((u, p), m)| Account::new(u, p, m))
            .collect())
    }

    /// 按配置顺序解析 OCR 服务列表，重复项只保留第一次
    pub fn ocr_provider_kinds(&self) -> AppResult<Vec<OcrProviderKind>> {
        let mut kinds = Vec::new();
        for name in self.ocr_providers.split(',').filter(|s| !s.trim().is_empty()) {
            let kind = OcrProviderKind::parse(name)
                .ok_or_else(|| ConfigError::UnknownOcrProvider(name.trim().to_string()))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(kinds)
    }

    pub fn telegram_enabled(&self) -> bool {
        self.tg_bot_token.is_some() && self.tg_user_id.is_some()
    }

    pub fn email_enabled(&self) -> bool {
        self.receiver_email.is_some() && self.smtp_user.is_some() && self.smtp_password.is_some()
    }
}

/// 解析开关类环境变量，无法识别时返回 None
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;

    fn config_with(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = config_with(&[]);
        assert_eq!(config.login_max_retry, 5);
        assert_eq!(config.pin_wait, Duration::from_secs(15));
        assert_eq!(config.portal_base_url, "https://support.euserv.com");
        assert!(!config.telegram_enabled());
        assert!(!config.email_enabled());
    }

    #[test]
    fn test_legacy_aliases() {
        let config = config_with(&[
            ("USERNAME", "a@example.com"),
            ("PASSWORD", "secret"),
            ("OCRSPACE_API_KEY", "k"),
            ("YD_EMAIL", "me@yandex.ru"),
            ("YD_APP_PWD", "pwd"),
            ("RECEIVER_EMAIL", "you@example.com"),
        ]);
        assert_eq!(config.usernames, "a@example.com");
        assert_eq!(config.ocr_space_api_key.as_deref(), Some("k"));
        assert!(config.email_enabled());
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_with(&[("LOGIN_MAX_RETRY_COUNT", "many"), ("WAITING_TIME_OF_PIN", "20")]);
        assert_eq!(config.login_max_retry, 5);
        assert_eq!(config.pin_wait, Duration::from_secs(20));
    }

    #[test]
    fn test_accounts_zip_in_order() {
        let config = config_with(&[
            ("EUSERV_USERNAME", "a@x.com  b@x.com"),
            ("EUSERV_PASSWORD", "pa\npb"),
            ("MAILPARSER_DOWNLOAD_URL_ID", "ma mb"),
        ]);
        let accounts = config.accounts().unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].username, "b@x.com");
        assert_eq!(accounts[1].password, "pb");
        assert_eq!(accounts[1].mailparser_id, "mb");
    }

    #[test]
    fn test_accounts_count_mismatch() {
        let config = config_with(&[
            ("EUSERV_USERNAME", "a@x.com b@x.com"),
            ("EUSERV_PASSWORD", "pa"),
            ("MAILPARSER_DOWNLOAD_URL_ID", "ma mb"),
        ]);
        assert!(matches!(
            config.accounts(),
            Err(AppError::Config(ConfigError::CountMismatch { .. }))
        ));
    }

    #[test]
    fn test_accounts_missing_mailparser() {
        let config = config_with(&[("EUSERV_USERNAME", "a@x.com"), ("EUSERV_PASSWORD", "pa")]);
        assert!(config.accounts().is_err());
    }

    #[test]
    fn test_ocr_provider_order() {
        let config = config_with(&[("OCR_PROVIDER", "local, truecaptcha,local")]);
        assert_eq!(
            config.ocr_provider_kinds().unwrap(),
            vec![OcrProviderKind::Local, OcrProviderKind::TrueCaptcha]
        );

        let bad = config_with(&[("OCR_PROVIDER", "tesseract")]);
        assert!(bad.ocr_provider_kinds().is_err());
    }

    #[test]
    fn test_run_marker_can_be_disabled() {
        assert!(config_with(&[("RUN_MARKER_FILE", "")]).run_marker_file.is_none());
        assert_eq!(
            config_with(&[("RUN_MARKER_FILE", "/tmp/m.toml")]).run_marker_file.as_deref(),
            Some("/tmp/m.toml")
        );
    }

    #[test]
    fn test_captcha_usage_flag() {
        for off in ["False", "0", "no", "OFF"] {
            let config = config_with(&[("CHECK_CAPTCHA_SOLVER_USAGE", off)]);
            assert!(!config.check_captcha_solver_usage, "{}", off);
        }
        for on in ["TRUE", "1", "Yes"] {
            let config = config_with(&[("CHECK_CAPTCHA_SOLVER_USAGE", on)]);
            assert!(config.check_captcha_solver_usage, "{}", on);
        }
        let config = config_with(&[("CHECK_CAPTCHA_SOLVER_USAGE", "maybe")]);
        assert!(config.check_captcha_solver_usage);
    }

    #[test]
    fn test_pacing_delays() {
        let config = config_with(&[("CHECK_DELAY_SECS", "0"), ("RENEW_SETTLE_SECS", "2")]);
        assert_eq!(config.check_delay, Duration::ZERO);
        assert_eq!(config.account_cooldown, Duration::from_secs(5));
        assert_eq!(config.renew_settle, Duration::from_secs(2));
    }
}
