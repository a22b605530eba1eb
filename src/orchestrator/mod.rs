//! 编排层（Orchestration Layer）
//!
//! ## 模块划分
//!
//! ### `batch_processor` - 多账号处理器
//! - 管理应用生命周期（初始化、运行、通知）
//! - 顺序遍历所有账号
//! - 输出全局统计信息
//!
//! ### `account_processor` - 单个账号处理器
//! - 登录、抓取 VPS 列表
//! - 遍历合同并调用续期流程
//! - 复查续期结果
//!
//! ## 层次关系
//!
//! ```text
//! batch_processor (处理 Vec<Account>)
//!     ↓
//! account_processor (处理 ContractTable)
//!     ↓
//! workflow::LoginFlow / RenewFlow (处理单次登录、单个合同)
//!     ↓
//! services (能力层：captcha / pin / page_parser / notifier)
//!     ↓
//! clients (HTTP 客户端)
//! ```

pub mod account_processor;
pub mod batch_processor;

pub use account_processor::process_account;
pub use batch_processor::App;
