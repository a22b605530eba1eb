//! 多账号处理器 - 编排层
//!
//! ## 职责
//!
//! 本模块是整个应用的入口，负责多账号的顺序处理和资源管理。
//!
//! ## 核心功能
//!
//! 1. **应用初始化**：校验账号配置，创建 OCR、Mailparser、通知等客户端
//! 2. **顺序处理**：逐个账号执行登录、续期、复查，账号之间互不影响
//! 3. **全局统计**：汇总所有账号的处理结果
//! 4. **通知**：把运行日志推送到 Telegram / 邮箱
//! 5. **运行记录**：读写上次运行记录文件

use crate::clients::{self, MailparserClient};
use crate::config::Config;
use crate::models::{Account, RunMarker, RunStats};
use crate::orchestrator::account_processor;
use crate::services::{CaptchaSolver, Notifier, PinService};
use crate::utils::{logging, RunLog};
use crate::workflow::{AccountCtx, LoginFlow, RenewFlow};
use anyhow::{Context, Result};
use chrono::Local;
use std::path::PathBuf;
use tracing::{info, warn};

/// 应用主结构
pub struct App {
    config: Config,
    accounts: Vec<Account>,
    login_flow: LoginFlow,
    renew_flow: RenewFlow,
    notifier: Notifier,
    marker_path: Option<PathBuf>,
}

impl App {
    /// 初始化应用
    ///
    /// 账号配置有误时返回错误，程序应直接退出
    pub async fn initialize(config: Config) -> Result<Self> {
        let accounts = config.accounts().context("账号配置无效")?;

        let http = clients::api_client(&config).context("无法创建 HTTP 客户端")?;
        let solver = CaptchaSolver::new(http.clone(), &config).context("OCR 配置无效")?;
        if solver.provider_names().is_empty() {
            warn!("⚠️ 没有可用的 OCR 服务，遇到验证码时将无法登录");
        }
        logging::log_startup(accounts.len(), &solver.provider_names());

        let pin_service = PinService::new(MailparserClient::new(http.clone(), &config), &config);
        let notifier = Notifier::new(http, &config);
        if !notifier.is_enabled() {
            info!("未配置 Telegram 或邮件通知，运行日志只输出到控制台");
        }

        Ok(Self {
            accounts,
            login_flow: LoginFlow::new(&config, solver),
            renew_flow: RenewFlow::new(pin_service, &config),
            notifier,
            marker_path: config.run_marker_file.as_ref().map(PathBuf::from),
            config,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> Result<RunStats> {
        self.log_last_run().await;

        let mut log = RunLog::new();
        let mut stats = RunStats::default();
        let total = self.accounts.len();

        for (i, account) in self.accounts.iter().enumerate() {
            let ctx = AccountCtx::new(i + 1, total, &account.username);
            logging::log_account_start(ctx.index, total);

            let account_stats = account_processor::process_account(
                &self.config,
                &self.login_flow,
                &self.renew_flow,
                account,
                &ctx,
                &mut log,
            )
            .await;
            stats.merge(account_stats);
        }

        logging::print_final_stats(&stats);

        if self.notifier.is_enabled() {
            self.notifier.notify(&log).await;
        }

        self.save_marker(&stats).await;
        Ok(stats)
    }

    async fn log_last_run(&self) {
        let Some(path) = &self.marker_path else {
            return;
        };
        match RunMarker::load(path).await {
            Ok(Some(marker)) => info!(
                "🕒 上次运行: {} (账号 {}, 续期成功 {}, 失败 {})",
                marker.finished_at.format("%Y-%m-%d %H:%M:%S"),
                marker.accounts,
                marker.renewed,
                marker.failed
            ),
            Ok(None) => info!("🕒 没有上次运行记录"),
            Err(e) => warn!("读取运行记录失败: {}", e),
        }
    }

    async fn save_marker(&self, stats: &RunStats) {
        let Some(path) = &self.marker_path else {
            return;
        };
        let marker = RunMarker {
            finished_at: Local::now(),
            accounts: stats.accounts,
            renewed: stats.renewed,
            failed: stats.failed + stats.login_failed,
        };
        if let Err(e) = marker.save(path).await {
            warn!("写入运行记录失败: {}", e);
        }
    }
}
