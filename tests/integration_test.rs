use euserv_autorenew::clients::mailparser_client::parse_pin_payload;
use euserv_autorenew::config::Config;
use euserv_autorenew::orchestrator::account_processor::report_check;
use euserv_autorenew::services::notifier::format_telegram_messages;
use euserv_autorenew::services::page_parser::{
    classify_login_page, extract_session_id, parse_contract_table, LoginPage,
};
use euserv_autorenew::services::{evaluate_captcha_text, CaptchaSolver};
use euserv_autorenew::utils::logging;
use euserv_autorenew::workflow::{AccountCtx, LoginFlow};
use euserv_autorenew::RunLog;
use std::collections::HashMap;

const ORDERS_PAGE: &str = include_str!("fixtures/orders.html");

fn config_from(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<&str, &str> = pairs.iter().copied().collect();
    Config::from_lookup(|k| map.get(k).map(|v| v.to_string()))
}

#[test]
fn test_orders_page_fixture() {
    assert_eq!(classify_login_page(ORDERS_PAGE), LoginPage::LoggedIn);

    let contracts = parse_contract_table(ORDERS_PAGE);
    let rows: Vec<(&str, bool)> = contracts
        .iter()
        .map(|c| (c.server_id.as_str(), c.needs_renewal))
        .collect();
    assert_eq!(rows, vec![("1234567", true), ("7654321", false)]);

    let no_cookie: [&str; 0] = [];
    assert_eq!(
        extract_session_id(&no_cookie, ORDERS_PAGE).as_deref(),
        Some("a1b2c3d4e5f6a7b8c9d0")
    );
}

#[test]
fn test_check_report_feeds_notification() {
    let mut log = RunLog::new();
    log.push("[AutoEUServerless] 正在续费第 1 个账号");
    log.push("[MailParser] PIN: 123456");

    let contracts = parse_contract_table(ORDERS_PAGE);
    assert!(!report_check(&contracts, &mut log));

    let messages = format_telegram_messages(&log.text());
    assert_eq!(messages.len(), 1);
    assert!(messages[0].contains("🔄 [AutoEUServerless] 正在续费第 1 个账号"));
    assert!(messages[0].contains("ServerID: 1234567 续期失败!"));
}

#[test]
fn test_accounts_from_env_lists() {
    let config = config_from(&[
        ("EUSERV_USERNAME", "one@example.com two@example.com"),
        ("EUSERV_PASSWORD", "p1 p2"),
        ("MAILPARSER_DOWNLOAD_URL_ID", "m1 m2"),
        ("OCR_PROVIDER", "local"),
    ]);
    let accounts = config.accounts().unwrap();
    assert_eq!(accounts.len(), 2);
    assert_eq!(accounts[0].mailparser_id, "m1");

    let solver = CaptchaSolver::new(reqwest::Client::new(), &config).unwrap();
    assert_eq!(solver.provider_names(), vec!["ddddocr"]);
}

#[test]
fn test_captcha_and_pin_parsing() {
    assert_eq!(evaluate_captcha_text("7 x 8"), "56");
    let payload = serde_json::json!([{ "pin": "402913" }]);
    assert_eq!(
        parse_pin_payload(&payload).unwrap().as_deref(),
        Some("402913")
    );
}

/// 需要真实账号，手动运行：cargo test -- --ignored
#[tokio::test]
#[ignore]
async fn test_live_login() {
    logging::init();

    let config = Config::from_env();
    let accounts = config.accounts().expect("请设置账号环境变量");
    let http = reqwest::Client::new();
    let solver = CaptchaSolver::new(http, &config).expect("OCR 配置无效");
    let flow = LoginFlow::new(&config, solver);

    let mut log = RunLog::new();
    let ctx = AccountCtx::new(1, accounts.len(), &accounts[0].username);
    let session = flow
        .login(&accounts[0], &ctx, &mut log)
        .await
        .expect("登录失败");

    let html = session
        .client
        .fetch_orders_page(&session.sess_id)
        .await
        .expect("获取订单页面失败");
    let contracts = parse_contract_table(&html);
    println!("找到 {} 台 VPS", contracts.len());
    println!("{}", log.text());
}
