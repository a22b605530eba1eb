//! 登录流程 - 流程层
//!
//! 一次尝试：新建会话 → 提交账号密码 → （可选）验证码 → 登录成功。
//! 任何一步出错都算一次失败，最多尝试 LOGIN_MAX_RETRY_COUNT 次

use crate::clients::PortalClient;
use crate::config::Config;
use crate::error::{AppResult, PortalError};
use crate::models::Account;
use crate::services::{CaptchaSolver, LoginPage};
use crate::utils::RunLog;
use crate::workflow::AccountCtx;
use tracing::{info, warn};

/// 已登录的面板会话
pub struct PortalSession {
    pub client: PortalClient,
    pub sess_id: String,
}

/// 登录流程
pub struct LoginFlow {
    config: Config,
    solver: CaptchaSolver,
}

impl LoginFlow {
    pub fn new(config: &Config, solver: CaptchaSolver) -> Self {
        Self {
            config: config.clone(),
            solver,
        }
    }

    /// 登录，失败时重试
    pub async fn login(
        &self,
        account: &Account,
        ctx: &AccountCtx,
        log: &mut RunLog,
    ) -> AppResult<PortalSession> {
        let attempts = self.config.login_max_retry.max(1);

        for attempt in 1..=attempts {
            if attempt > 1 {
                log.push(format!("[AutoEUServerless] 登录尝试第 {} 次", attempt));
            }
            match self.attempt(account, log).await {
                Ok(session) => {
                    info!("{} ✓ 登录成功", ctx);
                    return Ok(session);
                }
                Err(e) => warn!("{} 第 {}/{} 次登录失败: {}", ctx, attempt, attempts, e),
            }
        }

        Err(PortalError::LoginExhausted { attempts }.into())
    }

    async fn attempt(&self, account: &Account, log: &mut RunLog) -> AppResult<PortalSession> {
        let client = PortalClient::new(&self.config)?;
        let sess_id = client.open_session().await?;

        match client
            .submit_credentials(&sess_id, &account.username, &account.password)
            .await?
        {
            LoginPage::LoggedIn => {}
            LoginPage::Rejected => return Err(PortalError::LoginRejected.into()),
            LoginPage::CaptchaRequired => {
                log.push("[Captcha Solver] 正在进行验证码识别...");
                let code = match self.solve_captcha(&client, log).await {
                    Ok(code) => code,
                    Err(e) => {
                        log.push(format!("[Captcha Solver] {}", e));
                        return Err(e);
                    }
                };
                log.push(format!("[Captcha Solver] 识别的验证码是: {}", code));

                if !client.submit_captcha(&sess_id, &code).await? {
                    log.push("[Captcha Solver] 验证失败");
                    return Err(PortalError::CaptchaRejected.into());
                }
                log.push("[Captcha Solver] 验证通过");
            }
        }

        Ok(PortalSession { client, sess_id })
    }

    async fn solve_captcha(&self, client: &PortalClient, log: &mut RunLog) -> AppResult<String> {
        let image = client.fetch_captcha_image().await?;
        self.solver.solve(&image, log).await
    }
}
