use crate::ports::StoreError;
use thiserror::Error;

/// 認証のエラー
#[derive(Debug, Error)]
pub enum AuthError {
    /// 利用者名またはパスワードが違う（どちらかは区別しない）
    #[error("invalid username or password")]
    InvalidCredentials,

    /// パスワードハッシュの生成・解析に失敗
    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// ストレージのエラー
    #[error("storage error")]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, AuthError>;
