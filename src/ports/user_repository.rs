use crate::domain::{User, UserId};
use async_trait::async_trait;

use super::Result;

/// 利用者リポジトリポート
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn insert(&self, username: &str, password_hash: &str, is_admin: bool) -> Result<User>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>>;

    async fn count(&self) -> Result<u64>;
}
