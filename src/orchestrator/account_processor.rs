//! 单个账号处理器 - 编排层
//!
//! 登录 → 抓取 VPS 列表 → 逐个续期 → 复查。
//! 登录失败或单个合同续期失败都只记录日志，不中断整体流程

use crate::config::Config;
use crate::error::AppResult;
use crate::models::{Account, ContractTable, RunStats};
use crate::services::parse_contract_table;
use crate::utils::logging::truncate_text;
use crate::utils::RunLog;
use crate::workflow::{AccountCtx, LoginFlow, PortalSession, RenewFlow};
use tokio::time::sleep;
use tracing::{info, warn};

/// 写入运行日志的错误信息最大长度
const ERROR_DISPLAY_LEN: usize = 200;

/// 处理单个账号
///
/// # 返回
/// 该账号的统计
pub async fn process_account(
    config: &Config,
    login_flow: &LoginFlow,
    renew_flow: &RenewFlow,
    account: &Account,
    ctx: &AccountCtx,
    log: &mut RunLog,
) -> RunStats {
    let mut stats = RunStats {
        accounts: 1,
        ..Default::default()
    };

    log.push(format!("[AutoEUServerless] 正在续费第 {} 个账号", ctx.index));

    let session = match login_flow.login(account, ctx, log).await {
        Ok(session) => session,
        Err(e) => {
            warn!("{} {}", ctx, e);
            log.push(format!(
                "[AutoEUServerless] 第 {} 个账号登录失败，请检查登录信息",
                ctx.index
            ));
            stats.login_failed = 1;
            return stats;
        }
    };

    let contracts = match fetch_contracts(&session).await {
        Ok(contracts) => contracts,
        Err(e) => {
            log.push(format!(
                "[AutoEUServerless] 第 {} 个账号获取 VPS 列表失败: {}",
                ctx.index, e
            ));
            return stats;
        }
    };
    log.push(format!(
        "[AutoEUServerless] 检测到第 {} 个账号有 {} 台 VPS，正在尝试续期",
        ctx.index,
        contracts.len()
    ));

    for contract in contracts.iter() {
        let server_id = contract.server_id.as_str();
        if !contract.needs_renewal {
            log.push(format!("[AutoEUServerless] ServerID: {} 无需更新", server_id));
            stats.skipped += 1;
            continue;
        }

        info!("{} 🔄 ServerID {} 开始续期", ctx, server_id);
        match renew_flow.run(&session, account, server_id, log).await {
            Ok(()) => {
                log.push(format!("[AutoEUServerless] ServerID: {} 已成功续订!", server_id));
                stats.renewed += 1;
            }
            Err(e) => {
                log.push(format!(
                    "[AutoEUServerless] ServerID: {} 续订错误! {}",
                    server_id,
                    truncate_text(&e.to_string(), ERROR_DISPLAY_LEN)
                ));
                stats.failed += 1;
            }
        }
    }

    sleep(config.check_delay).await;
    check(&session, ctx, log).await;
    sleep(config.account_cooldown).await;

    stats
}

async fn fetch_contracts(session: &PortalSession) -> AppResult<ContractTable> {
    let html = session.client.fetch_orders_page(&session.sess_id).await?;
    Ok(parse_contract_table(&html))
}

/// 复查：重新抓取列表，仍需续期的合同视为续期失败
///
/// # 返回
/// 是否全部完成
pub async fn check(session: &PortalSession, ctx: &AccountCtx, log: &mut RunLog) -> bool {
    info!("{} Checking.......", ctx);
    let contracts = match fetch_contracts(session).await {
        Ok(contracts) => contracts,
        Err(e) => {
            log.push(format!("[AutoEUServerless] 第 {} 个账号复查失败: {}", ctx.index, e));
            return false;
        }
    };
    report_check(&contracts, log)
}

/// 根据复查结果写日志
pub fn report_check(contracts: &ContractTable, log: &mut RunLog) -> bool {
    let mut all_done = true;
    for contract in contracts.pending() {
        all_done = false;
        log.push(format!(
            "[AutoEUServerless] ServerID: {} 续期失败!",
            contract.server_id
        ));
    }
    if all_done {
        log.push("[AutoEUServerless] 所有工作完成！尽情享受~");
    }
    all_done
}
