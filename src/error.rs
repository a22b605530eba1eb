use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 面板（support.euserv.com）相关错误
    #[error("面板错误: {0}")]
    Portal(#[from] PortalError),
    /// 验证码识别错误
    #[error("验证码错误: {0}")]
    Captcha(#[from] CaptchaError),
    /// PIN 获取错误
    #[error("PIN 错误: {0}")]
    Pin(#[from] PinError),
    /// 通知发送错误
    #[error("通知错误: {0}")]
    Notify(#[from] NotifyError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 文件操作错误
    #[error("文件错误 ({path}): {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 其他错误（用于包装第三方库错误）
    #[error("错误: {0}")]
    Other(String),
}

/// 面板相关错误
#[derive(Debug, Error)]
pub enum PortalError {
    /// 网络请求失败
    #[error("请求 {endpoint} 失败: {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    /// 无法从响应中取得 sess_id
    #[error("无法获取 sess_id")]
    SessionIdMissing,
    /// 账号或密码被拒绝
    #[error("登录被拒绝")]
    LoginRejected,
    /// 提交验证码后仍停留在验证码页面
    #[error("验证码校验未通过")]
    CaptchaRejected,
    /// 登录重试次数用尽
    #[error("登录失败，已尝试 {attempts} 次")]
    LoginExhausted { attempts: u32 },
    /// 获取续期 token 失败
    #[error("获取 token 失败 (ServerID: {order_id}): rs={rs:?}")]
    TokenRejected { order_id: String, rs: Option<String> },
    /// 返回内容无法解析
    #[error("响应解析失败 ({endpoint}): {source}")]
    BadResponse {
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 验证码识别错误
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// 下载验证码图片失败
    #[error("无法下载验证码图像: {0}")]
    DownloadFailed(#[source] reqwest::Error),
    /// 单个识别服务失败
    #[error("{provider} 识别失败: {message}")]
    RecognizeFailed { provider: String, message: String },
    /// 识别服务缺少配置
    #[error("{provider} 未配置: 缺少 {missing}")]
    NotConfigured {
        provider: String,
        missing: &'static str,
    },
    /// 所有识别服务均失败
    #[error("所有 OCR 服务均无法识别验证码")]
    AllProvidersFailed,
    /// 没有可用的识别服务
    #[error("没有可用的 OCR 服务")]
    NoProvider,
}

/// PIN 获取错误
#[derive(Debug, Error)]
pub enum PinError {
    /// 请求 Mailparser 失败
    #[error("请求 Mailparser 失败: {0}")]
    RequestFailed(#[source] reqwest::Error),
    /// Mailparser 返回内容不含 PIN
    #[error("Mailparser 返回内容中没有 pin 字段")]
    Missing,
    /// 等待新 PIN 超时
    #[error("等待 PIN 超时，已轮询 {polls} 次")]
    Timeout { polls: u32 },
}

/// 通知发送错误
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Telegram 推送失败
    #[error("Telegram 推送失败: {0}")]
    Telegram(String),
    /// 邮件发送失败
    #[error("邮件发送失败: {0}")]
    Email(String),
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
    /// 列表长度不一致
    #[error("{left} 与 {right} 的数量不匹配 ({left_len} != {right_len})")]
    CountMismatch {
        left: &'static str,
        right: &'static str,
        left_len: usize,
        right_len: usize,
    },
    /// 未知的 OCR 服务名
    #[error("未知的 OCR_PROVIDER: {0}")]
    UnknownOcrProvider(String),
}

// ========== 从常见错误类型转换 ==========

impl From<toml::de::Error> for AppError {
    fn from(err: toml::de::Error) -> Self {
        AppError::Other(format!("TOML 解析失败: {}", err))
    }
}

impl From<toml::ser::Error> for AppError {
    fn from(err: toml::ser::Error) -> Self {
        AppError::Other(format!("TOML 序列化失败: {}", err))
    }
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建面板请求失败错误
    pub fn portal_request_failed(endpoint: impl Into<String>, source: reqwest::Error) -> Self {
        AppError::Portal(PortalError::RequestFailed {
            endpoint: endpoint.into(),
            source,
        })
    }

    /// 创建文件读写错误
    pub fn file(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::File {
            path: path.into(),
            source,
        }
    }

    /// 创建单个 OCR 服务失败错误
    pub fn recognize_failed(provider: impl Into<String>, message: impl ToString) -> Self {
        AppError::Captcha(CaptchaError::RecognizeFailed {
            provider: provider.into(),
            message: message.to_string(),
        })
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_error_display() {
        let err = AppError::from(ConfigError::CountMismatch {
            left: "EUSERV_USERNAME",
            right: "EUSERV_PASSWORD",
            left_len: 2,
            right_len: 1,
        });
        assert_eq!(
            err.to_string(),
            "配置错误: EUSERV_USERNAME 与 EUSERV_PASSWORD 的数量不匹配 (2 != 1)"
        );
    }

    #[test]
    fn test_pin_timeout_display() {
        let err: AppError = PinError::Timeout { polls: 6 }.into();
        assert!(err.to_string().contains("6"));
    }
}
