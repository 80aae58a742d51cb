pub mod error;

pub use error::*;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 設定ファイルを直接指定する環境変数
pub const CONFIG_PATH_ENV: &str = "BYOCFLOW_CONFIG_PATH";
pub const CREATE_TIMEOUT_ENV: &str = "BYOCFLOW_CREATE_TIMEOUT_MINUTES";
pub const DELETE_TIMEOUT_ENV: &str = "BYOCFLOW_DELETE_TIMEOUT_MINUTES";
pub const AGENT_TIMEOUT_ENV: &str = "BYOCFLOW_AGENT_TIMEOUT_MINUTES";

const SETTINGS_FILE: &str = "settings.yaml";

/// byocflow の動作設定
///
/// ```yaml
/// timeouts:
///   create_minutes: 120
///   delete_minutes: 60
/// backoff:
///   network:
///     min_wait_ms: 2000
///     max_wait_ms: 120000
/// network_retries: 3
/// ```
///
/// 省略したフィールドはデフォルト値になります。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub timeouts: TimeoutSettings,
    pub backoff: BackoffSettings,

    /// describe 呼び出しがネットワークエラーで失敗したときの再試行回数
    /// (0 の場合は即座に失敗扱い)
    pub network_retries: u32,
}

/// 操作ごとのタイムアウト (分)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub create_minutes: u64,
    pub delete_minutes: u64,
    pub agent_minutes: u64,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            create_minutes: 120,
            delete_minutes: 60,
            agent_minutes: 60,
        }
    }
}

/// バックオフの待機時間の範囲
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffWindow {
    pub min_wait_ms: u64,
    pub max_wait_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffSettings {
    /// ステータス待機用
    pub generic: BackoffWindow,
    /// ネットワーク再試行用
    pub network: BackoffWindow,
}

impl Default for BackoffSettings {
    fn default() -> Self {
        Self {
            generic: BackoffWindow {
                min_wait_ms: 500,
                max_wait_ms: 10_000,
            },
            network: BackoffWindow {
                min_wait_ms: 2_000,
                max_wait_ms: 120_000,
            },
        }
    }
}

impl Settings {
    /// 設定を読み込む
    ///
    /// 以下の優先順位で解決:
    /// 1. 環境変数 BYOCFLOW_*_TIMEOUT_MINUTES による個別上書き
    /// 2. 設定ファイル (find_settings_file)
    /// 3. デフォルト値
    pub fn load() -> Result<Self> {
        let mut settings = match find_settings_file() {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env_overrides()?;
        settings.validate()?;
        Ok(settings)
    }

    /// YAML ファイルから読み込む (環境変数は適用しない)
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        // 空ファイルは null になるのでデフォルト扱い
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Settings = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// 環境変数によるタイムアウトの上書きを適用
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Some(minutes) = read_minutes_env(CREATE_TIMEOUT_ENV)? {
            self.timeouts.create_minutes = minutes;
        }
        if let Some(minutes) = read_minutes_env(DELETE_TIMEOUT_ENV)? {
            self.timeouts.delete_minutes = minutes;
        }
        if let Some(minutes) = read_minutes_env(AGENT_TIMEOUT_ENV)? {
            self.timeouts.agent_minutes = minutes;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.timeouts.create_minutes == 0 {
            return Err(ConfigError::InvalidTimeout("create_minutes"));
        }
        if self.timeouts.delete_minutes == 0 {
            return Err(ConfigError::InvalidTimeout("delete_minutes"));
        }
        if self.timeouts.agent_minutes == 0 {
            return Err(ConfigError::InvalidTimeout("agent_minutes"));
        }

        for (name, window) in [
            ("generic", &self.backoff.generic),
            ("network", &self.backoff.network),
        ] {
            if window.min_wait_ms == 0 || window.max_wait_ms == 0 {
                return Err(ConfigError::InvalidBackoff(format!(
                    "{}: min_wait_ms と max_wait_ms は 1 以上である必要があります",
                    name
                )));
            }
            if window.min_wait_ms > window.max_wait_ms {
                return Err(ConfigError::InvalidBackoff(format!(
                    "{}: min_wait_ms ({}) が max_wait_ms ({}) を超えています",
                    name, window.min_wait_ms, window.max_wait_ms
                )));
            }
        }

        Ok(())
    }
}

/// byocflow の設定ディレクトリを取得 (~/.config/byocflow)
pub fn get_config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join("byocflow"))
        .ok_or(ConfigError::ConfigDirNotFound)
}

/// 設定ファイルを探す
///
/// 1. 環境変数 BYOCFLOW_CONFIG_PATH (直接パス指定)
/// 2. ~/.config/byocflow/settings.yaml
///
/// どちらも存在しなければ None
pub fn find_settings_file() -> Option<PathBuf> {
    if let Ok(config_path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(config_path);
        if path.exists() {
            return Some(path);
        }
    }

    let global = get_config_dir().ok()?.join(SETTINGS_FILE);
    global.exists().then_some(global)
}

fn read_minutes_env(key: &str) -> Result<Option<u64>> {
    let Ok(value) = std::env::var(key) else {
        return Ok(None);
    };

    match value.trim().parse::<u64>() {
        Ok(minutes) if minutes > 0 => Ok(Some(minutes)),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value,
        }),
    }
}
