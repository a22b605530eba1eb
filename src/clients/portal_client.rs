/// EUserv 面板客户端
///
/// 封装所有对 support.euserv.com 的 HTTP 调用，一个实例对应一个会话（cookie jar）
use crate::config::Config;
use crate::error::{AppError, AppResult, PortalError};
use crate::services::page_parser::{self, LoginPage};
use reqwest::header::{HeaderMap, HeaderValue, HOST, ORIGIN, REFERER, SET_COOKIE};
use reqwest::{Client, Response, Url};
use tracing::debug;

pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/114.0.0.0 Safari/537.36";

const INDEX_PATH: &str = "/index.iphp";
const LOGO_PATH: &str = "/pic/logo_small.png";
const CAPTCHA_IMAGE_PATH: &str = "/securimage_show.php";
const LOGIN_ORIGIN: &str = "https://www.euserv.com";
const EXTEND_PREFIX: &str = "kc2_customer_contract_details_extend_contract_";

/// 面板客户端
pub struct PortalClient {
    http: Client,
    base_url: String,
}

impl PortalClient {
    /// 创建新的面板客户端（独立的 cookie jar）
    pub fn new(config: &Config) -> AppResult<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .user_agent(USER_AGENT)
            .timeout(config.request_timeout);
        if let Some(proxy) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|e| AppError::portal_request_failed("proxy", e))?;
            builder = builder.proxy(proxy);
        }
        let http = builder
            .build()
            .map_err(|e| AppError::portal_request_failed("client", e))?;

        Ok(Self {
            http,
            base_url: config.portal_base_url.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// 打开会话，返回 sess_id
    ///
    /// 获取首页后再请求一次 logo，模拟浏览器行为
    pub async fn open_session(&self) -> AppResult<String> {
        let url = self.url(INDEX_PATH);
        let resp = self
            .http
            .get(&url)
            .header(ORIGIN, LOGIN_ORIGIN)
            .send()
            .await
            .map_err(|e| AppError::portal_request_failed(&url, e))?;

        let cookies: Vec<String> = resp
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect();
        let html = read_text(resp, &url).await?;

        let sess_id = page_parser::extract_session_id(&cookies, &html)
            .ok_or(PortalError::SessionIdMissing)?;
        debug!("sess_id: {}", sess_id);

        if let Err(e) = self.http.get(self.url(LOGO_PATH)).send().await {
            debug!("请求 logo 失败（忽略）: {}", e);
        }

        Ok(sess_id)
    }

    /// 提交账号密码
    pub async fn submit_credentials(
        &self,
        sess_id: &str,
        username: &str,
        password: &str,
    ) -> AppResult<LoginPage> {
        let form = [
            ("email", username),
            ("password", password),
            ("form_selected_language", "en"),
            ("Submit", "Login"),
            ("subaction", "login"),
            ("sess_id", sess_id),
        ];
        let html = self.post_index(&form, false).await?;
        Ok(page_parser::classify_login_page(&html))
    }

    /// 下载验证码图片（与登录共用 cookie）
    pub async fn fetch_captcha_image(&self) -> AppResult<Vec<u8>> {
        let url = self.url(CAPTCHA_IMAGE_PATH);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(crate::error::CaptchaError::DownloadFailed)?;
        let bytes = resp
            .bytes()
            .await
            .map_err(crate::error::CaptchaError::DownloadFailed)?;
        Ok(bytes.to_vec())
    }

    /// 提交验证码
    ///
    /// # 返回
    /// 是否通过验证
    pub async fn submit_captcha(&self, sess_id: &str, code: &str) -> AppResult<bool> {
        let form = [
            ("subaction", "login"),
            ("sess_id", sess_id),
            ("captcha_code", code),
        ];
        let html = self.post_index(&form, false).await?;
        Ok(page_parser::captcha_passed(&html))
    }

    /// 获取订单页面 HTML
    pub async fn fetch_orders_page(&self, sess_id: &str) -> AppResult<String> {
        let url = format!("{}?sess_id={}", self.url(INDEX_PATH), sess_id);
        let resp = self
            .http
            .get(&url)
            .header(ORIGIN, LOGIN_ORIGIN)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| AppError::portal_request_failed(&url, e))?;
        read_text(resp, &url).await
    }

    /// 续期第 1 步：打开合同详情
    pub async fn show_contract_details(&self, sess_id: &str, order_id: &str) -> AppResult<()> {
        let form = [
            ("Submit", "Extend contract"),
            ("sess_id", sess_id),
            ("ord_no", order_id),
            ("subaction", "choose_order"),
            ("choose_order_subaction", "show_contract_details"),
        ];
        self.post_index(&form, true).await.map(|_| ())
    }

    /// 续期第 2 步：弹出 Security Check 窗口，面板会自动发送 PIN 邮件
    pub async fn request_security_pin(&self, sess_id: &str) -> AppResult<()> {
        let form = [
            ("sess_id", sess_id),
            ("subaction", "show_kc2_security_password_dialog"),
            ("prefix", EXTEND_PREFIX),
            ("type", "1"),
        ];
        self.post_index(&form, true).await.map(|_| ())
    }

    /// 续期第 3 步：用 PIN 换取 token
    pub async fn fetch_extension_token(
        &self,
        sess_id: &str,
        order_id: &str,
        pin: &str,
    ) -> AppResult<String> {
        let ident = format!("{}{}", EXTEND_PREFIX, order_id);
        let form = [
            ("auth", pin),
            ("sess_id", sess_id),
            ("subaction", "kc2_security_password_get_token"),
            ("prefix", EXTEND_PREFIX),
            ("type", "1"),
            ("ident", ident.as_str()),
        ];
        let body = self.post_index(&form, true).await?;
        debug!("token 响应: {}", body);
        page_parser::parse_token_response(&body, order_id)
    }

    /// 续期第 4 步：提交续期
    pub async fn extend_contract_term(
        &self,
        sess_id: &str,
        order_id: &str,
        token: &str,
    ) -> AppResult<()> {
        let form = [
            ("sess_id", sess_id),
            ("ord_id", order_id),
            ("subaction", "kc2_customer_contract_details_extend_contract_term"),
            ("token", token),
        ];
        self.post_index(&form, true).await.map(|_| ())
    }

    /// 向 index.iphp 提交表单并返回响应正文
    ///
    /// 续期相关的请求需要带上与面板一致的 Host / Origin / Referer
    async fn post_index(&self, form: &[(&str, &str)], portal_headers: bool) -> AppResult<String> {
        let url = self.url(INDEX_PATH);
        let headers = if portal_headers {
            self.portal_headers(&url)
        } else {
            let mut headers = HeaderMap::new();
            headers.insert(ORIGIN, HeaderValue::from_static(LOGIN_ORIGIN));
            headers
        };

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .form(form)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|e| AppError::portal_request_failed(&url, e))?;
        read_text(resp, &url).await
    }

    fn portal_headers(&self, index_url: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(parsed) = Url::parse(&self.base_url) {
            if let Some(host) = parsed.host_str() {
                let host = match parsed.port() {
                    Some(port) => format!("{}:{}", host, port),
                    None => host.to_string(),
                };
                if let Ok(v) = HeaderValue::from_str(&host) {
                    headers.insert(HOST, v);
                }
            }
        }
        if let Ok(v) = HeaderValue::from_str(&self.base_url) {
            headers.insert(ORIGIN, v);
        }
        if let Ok(v) = HeaderValue::from_str(index_url) {
            headers.insert(REFERER, v);
        }
        headers
    }
}

async fn read_text(resp: Response, url: &str) -> AppResult<String> {
    resp.text()
        .await
        .map_err(|e| AppError::portal_request_failed(url, e))
}
