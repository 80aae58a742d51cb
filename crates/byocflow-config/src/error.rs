use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("設定ディレクトリが見つかりません")]
    ConfigDirNotFound,

    #[error("環境変数 {key} の値が不正です: {value:?} (1 以上の整数を指定してください)")]
    InvalidValue { key: String, value: String },

    #[error("バックオフ設定が不正です: {0}")]
    InvalidBackoff(String),

    #[error("タイムアウト設定が不正です: {0} は 1 分以上にしてください")]
    InvalidTimeout(&'static str),

    #[error("YAML パースエラー: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO エラー: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;
