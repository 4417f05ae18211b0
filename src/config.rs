use chrono::Duration;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// 初回起動時の管理者パスワードの既定値（本番では必ず変更すること）
pub const DEFAULT_ADMIN_PASSWORD: &str = "123456";

/// ストレージの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    /// プロセス内メモリ（再起動で消える）
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("unknown storage backend: {s}")),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// アプリケーション設定
///
/// 環境変数から読み込む。未設定の項目は既定値を使う。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub max_connections: u32,
    pub storage: StorageBackend,
    pub session_ttl: Duration,
    pub secure_cookies: bool,
    pub admin_username: String,
    pub admin_password: String,
    /// 画面用の静的ファイル（app.js, style.css）を置くディレクトリ
    pub static_dir: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    ///
    /// プロセスの環境変数を書き換えずにテストできるようにするため。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_ttl_hours: i64 = parse_or(&lookup, "SESSION_TTL_HOURS", 12)?;
        if session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                key: "SESSION_TTL_HOURS",
                value: session_ttl_hours.to_string(),
            });
        }

        Ok(Self {
            database_url: lookup("DATABASE_URL")
                .unwrap_or_else(|| "postgres://localhost/library".into()),
            port: parse_or(&lookup, "PORT", 3000)?,
            max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 5)?,
            storage: parse_or(&lookup, "STORAGE_BACKEND", StorageBackend::Postgres)?,
            session_ttl: Duration::hours(session_ttl_hours),
            secure_cookies: parse_or(&lookup, "SECURE_COOKIES", false)?,
            admin_username: lookup("ADMIN_USERNAME").unwrap_or_else(|| "admin".into()),
            admin_password: lookup("ADMIN_PASSWORD")
                .unwrap_or_else(|| DEFAULT_ADMIN_PASSWORD.into()),
            static_dir: lookup("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("static")),
        })
    }

    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password == DEFAULT_ADMIN_PASSWORD
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value: raw }),
    }
}
