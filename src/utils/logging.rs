//! 日志工具模块
//!
//! 提供 tracing 初始化和横幅、统计信息的输出

use crate::models::RunStats;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing，默认级别 info，可通过 RUST_LOG 覆盖
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `accounts`: 账号数量
/// - `providers`: OCR 服务名称列表
pub fn log_startup(accounts: usize, providers: &[&str]) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - EUserv 自动续期");
    info!("👤 账号数量: {}", accounts);
    info!("🧩 OCR 服务顺序: {}", providers.join(" → "));
    info!("{}", "=".repeat(60));
}

/// 记录单个账号开始处理
pub fn log_account_start(index: usize, total: usize) {
    info!("\n{}", "*".repeat(30));
    info!("📦 开始处理第 {}/{} 个账号", index, total);
}

/// 打印最终统计信息
pub fn print_final_stats(stats: &RunStats) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("👤 账号: {} (登录失败 {})", stats.accounts, stats.login_failed);
    info!("✅ 续期成功: {}", stats.renewed);
    info!("❌ 续期失败: {}", stats.failed);
    info!("⏭️ 无需续期: {}", stats.skipped);
    info!("{}", "=".repeat(60));
}

/// 按字符数截断文本，超出部分以 `...` 代替
///
/// 第三方服务的错误响应可能很长，写入运行日志前先截断
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abc", 3), "abc");
        assert_eq!(truncate_text("验证码识别结果", 3), "验证码...");
    }
}
