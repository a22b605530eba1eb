//! 面板页面解析 - 业务能力层
//!
//! EUserv 面板的 HTML 结构经常变动，所有选择器和页面标记都集中在这里

use crate::error::{AppError, AppResult, PortalError};
use crate::models::ContractTable;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;

/// 订单表格的行
pub const ORDER_ROW_SELECTOR: &str =
    "#kc2_order_customer_orders_tab_content_1 .kc2_order_table.kc2_content_table tr";
/// 行内的 ServerID 单元格
pub const SERVER_ID_SELECTOR: &str = ".td-z1-sp1-kc";
/// 行内的操作提示容器
pub const ACTION_CONTAINER_SELECTOR: &str = ".td-z1-sp2-kc .kc2_order_action_container";
/// 出现该提示说明还未到续期时间
pub const EXTENSION_NOT_YET_MARKER: &str = "Contract extension possible from";

pub const LOGGED_IN_MARKERS: [&str; 2] = ["Hello", "Confirm or change your customer data here"];
pub const CAPTCHA_MARKER: &str = "To finish the login process please solve the following captcha.";

/// 提交登录表单后的页面状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginPage {
    /// 已登录
    LoggedIn,
    /// 需要验证码
    CaptchaRequired,
    /// 登录被拒绝
    Rejected,
}

/// 判断登录响应页面的状态
pub fn classify_login_page(html: &str) -> LoginPage {
    if LOGGED_IN_MARKERS.iter().any(|m| html.contains(m)) {
        LoginPage::LoggedIn
    } else if html.contains(CAPTCHA_MARKER) {
        LoginPage::CaptchaRequired
    } else {
        LoginPage::Rejected
    }
}

/// 提交验证码后页面是否已离开验证码步骤
pub fn captcha_passed(html: &str) -> bool {
    !html.contains(CAPTCHA_MARKER)
}

/// 从 Set-Cookie 中提取 PHPSESSID，取不到时回退到页面中的隐藏字段 sess_id
///
/// # 参数
/// - `cookies`: 响应头中所有 Set-Cookie 的值
/// - `html`: 响应正文
pub fn extract_session_id<S: AsRef<str>>(cookies: &[S], html: &str) -> Option<String> {
    let re = Regex::new(r"PHPSESSID=(\w{10,100})").ok()?;
    cookies
        .iter()
        .find_map(|c| re.captures(c.as_ref()).map(|caps| caps[1].to_string()))
        .or_else(|| hidden_session_id(html))
}

fn hidden_session_id(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let sel = selector(r#"input[name="sess_id"]"#)?;
    document
        .select(&sel)
        .filter_map(|el| el.value().attr("value"))
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(str::to_string)
}

/// 解析订单页面中的合同表格
///
/// 只有恰好包含一个 ServerID 单元格的行才计入
pub fn parse_contract_table(html: &str) -> ContractTable {
    let document = Html::parse_document(html);
    let mut table = ContractTable::new();

    let (Some(row_sel), Some(id_sel), Some(action_sel)) = (
        selector(ORDER_ROW_SELECTOR),
        selector(SERVER_ID_SELECTOR),
        selector(ACTION_CONTAINER_SELECTOR),
    ) else {
        return table;
    };

    for row in document.select(&row_sel) {
        let ids: Vec<ElementRef> = row.select(&id_sel).collect();
        if ids.len() != 1 {
            continue;
        }
        let server_id = element_text(&ids[0]);
        if server_id.is_empty() {
            continue;
        }

        // 找不到操作容器时检查整行文本
        let hint = row
            .select(&action_sel)
            .next()
            .map(|el| element_text(&el))
            .unwrap_or_else(|| element_text(&row));
        let needs_renewal = !hint.contains(EXTENSION_NOT_YET_MARKER);

        table.insert(server_id, needs_renewal);
    }

    table
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    rs: Option<String>,
    token: Option<TokenValue>,
}

#[derive(Debug, Deserialize)]
struct TokenValue {
    value: Option<String>,
}

/// 解析获取续期 token 的 JSON 响应
///
/// `rs` 不为 `success` 或缺少 token 时返回 [`PortalError::TokenRejected`]
pub fn parse_token_response(body: &str, order_id: &str) -> AppResult<String> {
    let resp: TokenResponse =
        serde_json::from_str(body).map_err(|source| PortalError::BadResponse {
            endpoint: "kc2_security_password_get_token".to_string(),
            source,
        })?;

    let rejected = || -> AppError {
        PortalError::TokenRejected {
            order_id: order_id.to_string(),
            rs: resp.rs.clone(),
        }
        .into()
    };

    if resp.rs.as_deref() != Some("success") {
        return Err(rejected());
    }
    resp.token
        .as_ref()
        .and_then(|t| t.value.clone())
        .filter(|v| !v.is_empty())
        .ok_or_else(rejected)
}

fn selector(s: &str) -> Option<Selector> {
    Selector::parse(s).ok()
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORDERS_HTML: &str = r#"
        <html><body>
        <div id="kc2_order_customer_orders_tab_content_1">
          <table class="kc2_order_table kc2_content_table">
            <tr><th>Order</th><th>Action</th></tr>
            <tr>
              <td class="td-z1-sp1-kc"> 1001234 </td>
              <td class="td-z1-sp2-kc"><div class="kc2_order_action_container">Extend contract</div></td>
            </tr>
            <tr>
              <td class="td-z1-sp1-kc">1005678</td>
              <td class="td-z1-sp2-kc"><div class="kc2_order_action_container">Contract extension possible from 2026-11-01</div></td>
            </tr>
            <tr>
              <td class="td-z1-sp1-kc">1009999</td>
              <td class="td-z1-sp2-kc">Contract extension possible from 2026-12-01</td>
            </tr>
          </table>
        </div>
        <div id="kc2_order_customer_orders_tab_content_2">
          <table class="kc2_order_table kc2_content_table">
            <tr><td class="td-z1-sp1-kc">2000000</td></tr>
          </table>
        </div>
        </body></html>
    "#;

    #[test]
    fn test_parse_contract_table() {
        let table = parse_contract_table(ORDERS_HTML);
        assert_eq!(table.len(), 3);
        assert_eq!(table.get("1001234"), Some(true));
        assert_eq!(table.get("1005678"), Some(false));
        // 缺少操作容器时按整行文本判断
        assert_eq!(table.get("1009999"), Some(false));
        assert_eq!(table.get("2000000"), None);
    }

    #[test]
    fn test_parse_contract_table_empty_page() {
        assert!(parse_contract_table("<html><body>Hello</body></html>").is_empty());
    }

    #[test]
    fn test_classify_login_page() {
        assert_eq!(classify_login_page("<p>Hello John</p>"), LoginPage::LoggedIn);
        assert_eq!(
            classify_login_page("Confirm or change your customer data here"),
            LoginPage::LoggedIn
        );
        assert_eq!(
            classify_login_page(&format!("<p>{}</p>", CAPTCHA_MARKER)),
            LoginPage::CaptchaRequired
        );
        assert_eq!(classify_login_page("wrong password"), LoginPage::Rejected);
        assert!(captcha_passed("<p>Hello</p>"));
        assert!(!captcha_passed(CAPTCHA_MARKER));
    }

    #[test]
    fn test_extract_session_id_from_cookie() {
        let cookies = vec!["PHPSESSID=abcdef0123456789; path=/; HttpOnly".to_string()];
        assert_eq!(
            extract_session_id(&cookies, ""),
            Some("abcdef0123456789".to_string())
        );
    }

    #[test]
    fn test_extract_session_id_hidden_field_fallback() {
        let cookies: Vec<String> = vec!["lang=en; path=/".to_string()];
        let html = r#"<form><input type="hidden" name="sess_id" value="xyz987654321"></form>"#;
        assert_eq!(
            extract_session_id(&cookies, html),
            Some("xyz987654321".to_string())
        );
        assert_eq!(extract_session_id(&cookies, "<form></form>"), None);
    }

    #[test]
    fn test_session_id_too_short_is_ignored() {
        let cookies = vec!["PHPSESSID=abc; path=/"];
        assert_eq!(extract_session_id(&cookies, ""), None);
    }

    #[test]
    fn test_parse_token_response() {
        let body = r#"{"rs":"success","token":{"value":"tok-123"}}"#;
        assert_eq!(parse_token_response(body, "100").unwrap(), "tok-123");

        let failed = r#"{"rs":"error","error":"wrong pin"}"#;
        assert!(matches!(
            parse_token_response(failed, "100"),
            Err(AppError::Portal(PortalError::TokenRejected { .. }))
        ));

        let no_token = r#"{"rs":"success"}"#;
        assert!(parse_token_response(no_token, "100").is_err());

        assert!(matches!(
            parse_token_response("<html>", "100"),
            Err(AppError::Portal(PortalError::BadResponse { .. }))
        ));
    }
}
