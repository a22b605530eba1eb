/// SMTP 邮件客户端
use crate::config::Config;
use crate::error::{AppResult, NotifyError};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

pub struct EmailClient {
    host: String,
    port: u16,
    user: String,
    password: String,
    receiver: String,
}

impl EmailClient {
    /// 收件人、SMTP 账号或密码缺失时返回 None
    pub fn from_config(config: &Config) -> Option<Self> {
        Some(Self {
            host: config.smtp_host.clone(),
            port: config.smtp_port,
            user: config.smtp_user.clone()?,
            password: config.smtp_password.clone()?,
            receiver: config.receiver_email.clone()?,
        })
    }

    /// 构建纯文本邮件
    pub fn build_message(&self, subject: &str, body: &str) -> AppResult<Message> {
        let from: Mailbox = self
            .user
            .parse()
            .map_err(|e| NotifyError::Email(format!("发件人地址无效: {}", e)))?;
        let to: Mailbox = self
            .receiver
            .parse()
            .map_err(|e| NotifyError::Email(format!("收件人地址无效: {}", e)))?;

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| NotifyError::Email(e.to_string()))?;
        Ok(message)
    }

    /// 通过 SMTPS（隐式 TLS）发送邮件
    pub async fn send(&self, subject: &str, body: &str) -> AppResult<()> {
        let message = self.build_message(subject, body)?;

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
            .map_err(|e| NotifyError::Email(e.to_string()))?
            .port(self.port)
            .credentials(Credentials::new(self.user.clone(), self.password.clone()))
            .build();

        mailer
            .send(message)
            .await
            .map_err(|e| NotifyError::Email(e.to_string()))?;
        Ok(())
    }
}
