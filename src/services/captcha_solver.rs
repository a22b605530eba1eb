//! 验证码识别服务 - 业务能力层
//!
//! 按配置顺序依次尝试各个 OCR 服务，第一个给出非空结果的服务胜出。
//! 识别结果若是 `12+7` 这样的算式，则返回计算结果

use crate::clients::{LocalOcrClient, OcrSpaceClient, TrueCaptchaClient};
use crate::config::{Config, OcrProviderKind};
use crate::error::{AppError, AppResult, CaptchaError};
use crate::utils::logging::truncate_text;
use crate::utils::RunLog;
use reqwest::Client;
use tracing::{debug, warn};

/// 写入运行日志的错误信息最大长度
const ERROR_DISPLAY_LEN: usize = 200;

/// 单个识别后端
pub enum Recognizer {
    OcrSpace(OcrSpaceClient),
    TrueCaptcha(TrueCaptchaClient),
    Local(LocalOcrClient),
}

impl Recognizer {
    pub fn kind(&self) -> OcrProviderKind {
        match self {
            Recognizer::OcrSpace(_) => OcrProviderKind::OcrSpace,
            Recognizer::TrueCaptcha(_) => OcrProviderKind::TrueCaptcha,
            Recognizer::Local(_) => OcrProviderKind::Local,
        }
    }

    pub async fn recognize(&self, image: &[u8]) -> AppResult<String> {
        match self {
            Recognizer::OcrSpace(c) => c.recognize(image).await,
            Recognizer::TrueCaptcha(c) => c.recognize(image).await,
            Recognizer::Local(c) => c.recognize(image).await,
        }
    }
}

/// 验证码识别服务
pub struct CaptchaSolver {
    recognizers: Vec<Recognizer>,
    check_usage: bool,
}

impl CaptchaSolver {
    /// 按 OCR_PROVIDER 的顺序创建识别后端，缺少凭据的后端会被跳过
    pub fn new(http: Client, config: &Config) -> AppResult<Self> {
        let mut recognizers = Vec::new();
        for kind in config.ocr_provider_kinds()? {
            let built = match kind {
                OcrProviderKind::OcrSpace => {
                    OcrSpaceClient::new(http.clone(), config).map(Recognizer::OcrSpace)
                }
                OcrProviderKind::TrueCaptcha => {
                    TrueCaptchaClient::new(http.clone(), config).map(Recognizer::TrueCaptcha)
                }
                OcrProviderKind::Local => {
                    Ok(Recognizer::Local(LocalOcrClient::new(http.clone(), config)))
                }
            };
            match built {
                Ok(r) => recognizers.push(r),
                Err(e) => warn!("跳过 OCR 服务 {}: {}", kind.name(), e),
            }
        }

        Ok(Self::with_recognizers(
            recognizers,
            config.check_captcha_solver_usage,
        ))
    }

    pub fn with_recognizers(recognizers: Vec<Recognizer>, check_usage: bool) -> Self {
        Self {
            recognizers,
            check_usage,
        }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.recognizers.iter().map(|r| r.kind().name()).collect()
    }

    /// 识别验证码图片
    ///
    /// # 参数
    /// - `image`: 验证码图片字节
    /// - `log`: 运行日志，失败信息会写入其中
    ///
    /// # 返回
    /// 可以直接提交的验证码（算式已求值）
    pub async fn solve(&self, image: &[u8], log: &mut RunLog) -> AppResult<String> {
        if self.recognizers.is_empty() {
            return Err(CaptchaError::NoProvider.into());
        }

        for recognizer in &self.recognizers {
            let name = recognizer.kind().name();
            match recognizer.recognize(image).await {
                Ok(text) if !text.is_empty() => {
                    debug!("{} 识别结果: {}", name, text);
                    if let Recognizer::TrueCaptcha(client) = recognizer {
                        if self.check_usage {
                            match client.usage().await {
                                Ok(usage) => log.push(usage_line(&usage)),
                                Err(e) => debug!("查询 TrueCaptcha 使用次数失败: {}", e),
                            }
                        }
                    }
                    return Ok(evaluate_captcha_text(&text));
                }
                Ok(_) => log.push(format!("[Captcha Solver] {} 返回空结果", name)),
                Err(e) => log.push(format!(
                    "[Captcha Solver] {} 失败: {}",
                    name,
                    truncate_text(&e.to_string(), ERROR_DISPLAY_LEN)
                )),
            }
        }

        Err(AppError::Captcha(CaptchaError::AllProvidersFailed))
    }
}

/// TrueCaptcha 使用情况原样写入日志
fn usage_line(usage: &serde_json::Value) -> String {
    format!(
        "[Captcha Solver] TrueCaptcha API 使用情况: {}",
        truncate_text(&usage.to_string(), ERROR_DISPLAY_LEN)
    )
}

/// 按顺序检查的运算符，`x` / `X` 表示乘法
const OPERATORS: [char; 5] = ['X', 'x', '*', '+', '-'];

/// 处理识别结果中的算式
///
/// 以第一个出现的运算符（按 [`OPERATORS`] 顺序检查）拆分，两侧都是数字时返回计算结果，
/// 否则原样返回识别文本
pub fn evaluate_captcha_text(text: &str) -> String {
    let text = text.trim();
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();

    for op in OPERATORS {
        let Some(pos) = compact.find(op) else {
            continue;
        };
        let (left, right) = (&compact[..pos], &compact[pos + op.len_utf8()..]);
        if !is_digits(left) || !is_digits(right) {
            return text.to_string();
        }
        let (Ok(l), Ok(r)) = (left.parse::<i64>(), right.parse::<i64>()) else {
            return text.to_string();
        };
        let value = match op {
            '+' => l.checked_add(r),
            '-' => l.checked_sub(r),
            _ => l.checked_mul(r),
        };
        return value.map(|v| v.to_string()).unwrap_or_else(|| text.to_string());
    }

    text.to_string()
}

fn is_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}
