//! # EUserv 自动续期
//!
//! 登录 EUserv 面板，抓取 VPS 合同列表，对可以续期的合同走完
//! "合同详情 → Security Check → PIN → token → 提交" 的表单流程，
//! 最后把运行日志推送到 Telegram 或邮箱。
//!
//! ## 架构设计
//!
//! ### ① 客户端层（Clients）
//! - `clients/` - 只负责 HTTP 调用：面板、OCR、Mailparser、Telegram、SMTP
//!
//! ### ② 业务能力层（Services）
//! - `page_parser` - 面板页面解析，所有选择器集中于此
//! - `CaptchaSolver` - 多个 OCR 服务依次兜底，并处理算式验证码
//! - `PinService` - 轮询 Mailparser 获取新的 PIN
//! - `Notifier` - 推送运行日志
//!
//! ### ③ 流程层（Workflow）
//! - `LoginFlow` - 带重试的登录流程
//! - `RenewFlow` - 单个合同的续期流程
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/batch_processor` - 多账号顺序处理、通知、运行记录
//! - `orchestrator/account_processor` - 单个账号的续期与复查
//!
//! ## 模块结构

pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{Account, ContractTable, RunMarker, RunStats};
pub use orchestrator::App;
pub use utils::RunLog;
pub use workflow::{AccountCtx, LoginFlow, RenewFlow};
