pub mod logging;
pub mod run_log;

pub use run_log::RunLog;
