pub mod account;
pub mod contract;
pub mod run_marker;
pub mod stats;

pub use account::Account;
pub use contract::{Contract, ContractTable};
pub use run_marker::RunMarker;
pub use stats::RunStats;
