//! 合同（VPS）列表
//!
//! 面板订单表格中抓取到的 ServerID 及其是否需要续期

/// 单个合同
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// 订单号，即表格中的 ServerID
    pub server_id: String,
    /// 是否需要续期（表格中没有 "Contract extension possible from" 提示）
    pub needs_renewal: bool,
}

/// 按表格顺序保存的 ServerID → 是否需要续期
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractTable {
    contracts: Vec<Contract>,
}

impl ContractTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入一条记录，ServerID 重复时保留第一次出现的值
    ///
    /// # 返回
    /// 是否插入成功
    pub fn insert(&mut self, server_id: impl Into<String>, needs_renewal: bool) -> bool {
        let server_id = server_id.into();
        if self.get(&server_id).is_some() {
            return false;
        }
        self.contracts.push(Contract {
            server_id,
            needs_renewal,
        });
        true
    }

    pub fn get(&self, server_id: &str) -> Option<bool> {
        self.contracts
            .iter()
            .find(|c| c.server_id == server_id)
            .map(|c| c.needs_renewal)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter()
    }

    /// 仍需续期的合同
    pub fn pending(&self) -> impl Iterator<Item = &Contract> {
        self.contracts.iter().filter(|c| c.needs_renewal)
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_first_value() {
        let mut table = ContractTable::new();
        assert!(table.insert("200", true));
        assert!(table.insert("100", false));
        assert!(!table.insert("200", false));

        let ids: Vec<&str> = table.iter().map(|c| c.server_id.as_str()).collect();
        assert_eq!(ids, vec!["200", "100"]);
        assert_eq!(table.get("200"), Some(true));
        assert_eq!(table.pending().count(), 1);
    }
}
