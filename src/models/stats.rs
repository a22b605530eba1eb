/// 单次运行的统计
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// 处理过的账号数
    pub accounts: usize,
    /// 登录失败的账号数
    pub login_failed: usize,
    /// 续期成功的合同数
    pub renewed: usize,
    /// 续期失败的合同数
    pub failed: usize,
    /// 无需续期的合同数
    pub skipped: usize,
}

impl RunStats {
    /// 合并另一个账号的统计
    pub fn merge(&mut self, other: RunStats) {
        self.accounts += other.accounts;
        self.login_failed += other.login_failed;
        self.renewed += other.renewed;
        self.failed += other.failed;
        self.skipped += other.skipped;
    }

    /// 本次运行是否有需要关注的失败
    pub fn has_failures(&self) -> bool {
        self.login_failed > 0 || self.failed > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge() {
        let mut total = RunStats::default();
        total.merge(RunStats {
            accounts: 1,
            renewed: 2,
            ..Default::default()
        });
        total.merge(RunStats {
            accounts: 1,
            login_failed: 1,
            ..Default::default()
        });
        assert_eq!(total.accounts, 2);
        assert_eq!(total.renewed, 2);
        assert!(total.has_failures());
    }
}
