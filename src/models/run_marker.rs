//! 上次运行记录
//!
//! 以 TOML 格式保存在磁盘上，仅用于日志展示，不影响续期逻辑

use crate::error::{AppError, AppResult};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// 上次运行记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMarker {
    pub finished_at: DateTime<Local>,
    pub accounts: usize,
    pub renewed: usize,
    pub failed: usize,
}

impl RunMarker {
    /// 读取记录文件，文件不存在时返回 None
    pub async fn load(path: &Path) -> AppResult<Option<Self>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AppError::file(path.display().to_string(), e)),
        };
        let marker: RunMarker = toml::from_str(&content)?;
        Ok(Some(marker))
    }

    /// 写入记录文件
    pub async fn save(&self, path: &Path) -> AppResult<()> {
        let content = toml::to_string(self)?;
        fs::write(path, content)
            .await
            .map_err(|e| AppError::file(path.display().to_string(), e))
    }
}
