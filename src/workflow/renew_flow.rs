//! 续期流程 - 流程层
//!
//! 单个合同的续期顺序：
//! 1. 打开合同详情
//! 2. 弹出 Security Check（面板发送 PIN 邮件）
//! 3. 从 Mailparser 取 PIN，换取 token
//! 4. 提交续期

use crate::config::Config;
use crate::error::AppResult;
use crate::models::Account;
use crate::services::PinService;
use crate::utils::RunLog;
use crate::workflow::PortalSession;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

pub struct RenewFlow {
    pin_service: PinService,
    /// 提交续期后等待面板处理的时间
    settle: Duration,
}

impl RenewFlow {
    pub fn new(pin_service: PinService, config: &Config) -> Self {
        Self {
            pin_service,
            settle: config.renew_settle,
        }
    }

    /// 续期一个合同
    ///
    /// token 被拒绝、PIN 超时或任何请求失败都返回错误
    pub async fn run(
        &self,
        session: &PortalSession,
        account: &Account,
        order_id: &str,
        log: &mut RunLog,
    ) -> AppResult<()> {
        let client = &session.client;
        let sess_id = session.sess_id.as_str();

        let previous_pin = self.pin_service.snapshot(&account.mailparser_id).await;
        debug!("ServerID {} 触发前的 PIN: {:?}", order_id, previous_pin);

        client.show_contract_details(sess_id, order_id).await?;
        client.request_security_pin(sess_id).await?;

        let pin = self
            .pin_service
            .wait_for_pin(&account.mailparser_id, previous_pin.as_deref())
            .await?;
        log.push(format!("[MailParser] PIN: {}", pin));

        let token = client.fetch_extension_token(sess_id, order_id, &pin).await?;
        client.extend_contract_term(sess_id, order_id, &token).await?;

        sleep(self.settle).await;
        Ok(())
    }
}
