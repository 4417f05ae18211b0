use crate::domain::{Session, SessionToken, User, UserId};
use crate::ports::{Result, SessionStore, StoreError, UserRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct AccountState {
    last_user_id: i64,
    users: BTreeMap<UserId, User>,
    sessions: HashMap<SessionToken, Session>,
}

/// 利用者とセッションのインメモリストア
#[derive(Debug, Default)]
pub struct AccountStore {
    state: Mutex<AccountState>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for AccountStore {
    async fn insert(&self, username: &str, password_hash: &str, is_admin: bool) -> Result<User> {
        let mut state = self.state.lock().await;
        if state.users.values().any(|user| user.username == username) {
            return Err(StoreError::backend(format!(
                "username already taken: {username}"
            )));
        }

        state.last_user_id += 1;
        let user = User {
            user_id: UserId::from_i64(state.last_user_id),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            is_admin,
        };
        state.users.insert(user.user_id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn get_by_id(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.lock().await.users.get(&user_id).cloned())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.state.lock().await.users.len() as u64)
    }
}

#[async_trait]
impl SessionStore for AccountStore {
    async fn insert(&self, session: &Session) -> Result<()> {
        let mut state = self.state.lock().await;
        state.sessions.insert(session.token, session.clone());
        Ok(())
    }

    async fn get(&self, token: SessionToken) -> Result<Option<Session>> {
        Ok(self.state.lock().await.sessions.get(&token).cloned())
    }

    async fn delete(&self, token: SessionToken) -> Result<()> {
        self.state.lock().await.sessions.remove(&token);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - state.sessions.len()) as u64)
    }
}
