/// OCR 服务客户端
///
/// 三种验证码识别后端：OCR.space、TrueCaptcha 云端 API，以及本地 ddddocr 识别服务。
/// 全部视为黑盒：图片字节进，文本出
use crate::config::Config;
use crate::error::{AppError, AppResult, CaptchaError};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

const OCR_SPACE_URL: &str = "https://api.ocr.space/parse/image";
const TRUECAPTCHA_URL: &str = "https://api.apitruecaptcha.org/one/gettext";
const TRUECAPTCHA_USAGE_URL: &str = "https://api.apitruecaptcha.org/one/getusage";

/// OCR.space 客户端
pub struct OcrSpaceClient {
    http: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceResponse {
    #[serde(default)]
    parsed_results: Option<Vec<OcrSpaceParsed>>,
    #[serde(default)]
    error_message: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OcrSpaceParsed {
    #[serde(default)]
    parsed_text: Option<String>,
}

impl OcrSpaceClient {
    pub fn new(http: Client, config: &Config) -> AppResult<Self> {
        let api_key = config
            .ocr_space_api_key
            .clone()
            .ok_or(CaptchaError::NotConfigured {
                provider: "OCR.space".to_string(),
                missing: "OCR_SPACE_API_KEY",
            })?;
        Ok(Self { http, api_key })
    }

    pub async fn recognize(&self, image: &[u8]) -> AppResult<String> {
        let base64_image = format!("data:image/jpeg;base64,{}", STANDARD.encode(image));
        let form = [
            ("apikey", self.api_key.as_str()),
            ("language", "eng"),
            ("isOverlayRequired", "false"),
            ("base64Image", base64_image.as_str()),
            ("isTable", "false"),
            ("scale", "true"),
            ("OCREngine", "2"),
        ];

        let resp: OcrSpaceResponse = self
            .http
            .post(OCR_SPACE_URL)
            .form(&form)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AppError::recognize_failed("OCR.space", e))?
            .json()
            .await
            .map_err(|e| AppError::recognize_failed("OCR.space", e))?;

        parse_ocr_space(resp)
    }
}

fn parse_ocr_space(resp: OcrSpaceResponse) -> AppResult<String> {
    match resp.parsed_results.as_ref().and_then(|results| results.first()) {
        Some(parsed) => Ok(parsed
            .parsed_text
            .as_deref()
            .unwrap_or_default()
            .trim()
            .to_string()),
        None => {
            let message = resp
                .error_message
                .map(|v| v.to_string())
                .unwrap_or_else(|| "无法识别文本".to_string());
            Err(AppError::recognize_failed("OCR.space", message))
        }
    }
}

/// TrueCaptcha 客户端
pub struct TrueCaptchaClient {
    http: Client,
    user_id: String,
    api_key: String,
}

impl TrueCaptchaClient {
    pub fn new(http: Client, config: &Config) -> AppResult<Self> {
        let not_configured = |missing| CaptchaError::NotConfigured {
            provider: "TrueCaptcha".to_string(),
            missing,
        };
        let user_id = config
            .truecaptcha_user_id
            .clone()
            .ok_or_else(|| not_configured("TRUECAPTCHA_USERID"))?;
        let api_key = config
            .truecaptcha_api_key
            .clone()
            .ok_or_else(|| not_configured("TRUECAPTCHA_APIKEY"))?;
        Ok(Self {
            http,
            user_id,
            api_key,
        })
    }

    pub async fn recognize(&self, image: &[u8]) -> AppResult<String> {
        let payload = json!({
            "userid": self.user_id,
            "apikey": self.api_key,
            "case": "mixed",
            "mode": "human",
            "data": STANDARD.encode(image),
        });

        let result: Value = self
            .http
            .post(TRUECAPTCHA_URL)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::recognize_failed("TrueCaptcha", e))?
            .json()
            .await
            .map_err(|e| AppError::recognize_failed("TrueCaptcha", e))?;

        debug!("TrueCaptcha 响应: {}", result);
        extract_result_field(&result, &["result"])
            .ok_or_else(|| AppError::recognize_failed("TrueCaptcha", result))
    }

    /// 查询 API 使用情况，返回原始 JSON
    pub async fn usage(&self) -> AppResult<Value> {
        let usage: Value = self
            .http
            .get(TRUECAPTCHA_USAGE_URL)
            .query(&[("username", &self.user_id), ("apikey", &self.api_key)])
            .send()
            .await
            .map_err(|e| AppError::recognize_failed("TrueCaptcha", e))?
            .json()
            .await
            .map_err(|e| AppError::recognize_failed("TrueCaptcha", e))?;

        debug!("TrueCaptcha 使用情况: {}", usage);
        Ok(usage)
    }
}

/// 本地 ddddocr 识别服务客户端
///
/// 请求 `POST {base}/ocr`，body 为 `{"image": <base64>}`，
/// 响应中的 `result` 或 `data` 字段即识别结果
pub struct LocalOcrClient {
    http: Client,
    endpoint: String,
}

impl LocalOcrClient {
    pub fn new(http: Client, config: &Config) -> Self {
        Self {
            http,
            endpoint: format!("{}/ocr", config.local_ocr_url),
        }
    }

    pub async fn recognize(&self, image: &[u8]) -> AppResult<String> {
        let result: Value = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "image": STANDARD.encode(image) }))
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AppError::recognize_failed("ddddocr", e))?
            .json()
            .await
            .map_err(|e| AppError::recognize_failed("ddddocr", e))?;

        extract_result_field(&result, &["result", "data"])
            .ok_or_else(|| AppError::recognize_failed("ddddocr", result))
    }
}

/// 取第一个存在的字符串字段
fn extract_result_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|k| value.get(*k).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ocr_space_success() {
        let resp: OcrSpaceResponse = serde_json::from_str(
            r#"{"ParsedResults":[{"ParsedText":" 12+7 \r\n","FileParseExitCode":1}],"OCRExitCode":1}"#,
        )
        .unwrap();
        assert_eq!(parse_ocr_space(resp).unwrap(), "12+7");
    }

    #[test]
    fn test_parse_ocr_space_error() {
        let resp: OcrSpaceResponse = serde_json::from_str(
            r#"{"ParsedResults":null,"OCRExitCode":99,"ErrorMessage":["Invalid API key"]}"#,
        )
        .unwrap();
        let err = parse_ocr_space(resp).unwrap_err();
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[test]
    fn test_extract_result_field() {
        let v = json!({"code": 200, "data": "ab3d"});
        assert_eq!(extract_result_field(&v, &["result", "data"]), Some("ab3d".to_string()));
        assert_eq!(extract_result_field(&json!({"error": "x"}), &["result"]), None);
    }

    #[test]
    fn test_missing_key_is_not_configured() {
        let config = Config::default();
        let err = OcrSpaceClient::new(Client::new(), &config).err().unwrap();
        assert!(matches!(
            err,
            AppError::Captcha(CaptchaError::NotConfigured { .. })
        ));
        assert!(TrueCaptchaClient::new(Client::new(), &config).is_err());
    }
}
