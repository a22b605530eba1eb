use anyhow::Result;
use euserv_autorenew::utils::logging;
use euserv_autorenew::{App, Config};

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    logging::init();

    // 加载配置
    let config = Config::from_env();

    // 初始化并运行应用
    let stats = App::initialize(config).await?.run().await?;
    if stats.has_failures() {
        tracing::warn!("⚠️ 本次运行存在失败项，详见上方日志");
    }

    Ok(())
}
