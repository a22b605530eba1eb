pub mod captcha_solver;
pub mod notifier;
pub mod page_parser;
pub mod pin_service;

pub use captcha_solver::{evaluate_captcha_text, CaptchaSolver, Recognizer};
pub use notifier::Notifier;
pub use page_parser::{parse_contract_table, LoginPage};
pub use pin_service::PinService;
