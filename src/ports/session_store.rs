use crate::domain::{Session, SessionToken};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;

/// セッションストアポート
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn insert(&self, session: &Session) -> Result<()>;

    async fn get(&self, token: SessionToken) -> Result<Option<Session>>;

    /// 存在しないトークンの削除は成功扱い
    async fn delete(&self, token: SessionToken) -> Result<()>;

    /// 期限切れのセッションを削除し、削除件数を返す
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}
