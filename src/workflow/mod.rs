pub mod account_ctx;
pub mod login_flow;
pub mod renew_flow;

pub use account_ctx::AccountCtx;
pub use login_flow::{LoginFlow, PortalSession};
pub use renew_flow::RenewFlow;
