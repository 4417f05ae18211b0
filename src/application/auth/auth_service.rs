use crate::application::ServiceDependencies;
use crate::domain::{CurrentUser, Session, SessionToken, commands::Login};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};

use super::errors::{AuthError, Result};

/// パスワードをArgon2でハッシュ化する（PHC文字列）
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// パスワードを検証する
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(password_hash)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// ログインしてセッションを発行する
///
/// 利用者が存在しない場合とパスワードが違う場合は同じエラーを返す。
pub async fn login(
    deps: &ServiceDependencies,
    cmd: Login,
    session_ttl: Duration,
) -> Result<Session> {
    let user = deps
        .users
        .find_by_username(cmd.username.trim())
        .await?
        .ok_or(AuthError::InvalidCredentials)?;

    if !verify_password(&cmd.password, &user.password_hash)? {
        tracing::warn!(username = %user.username, "login rejected");
        return Err(AuthError::InvalidCredentials);
    }

    let session = Session {
        token: SessionToken::generate(),
        user_id: user.user_id,
        created_at: cmd.logged_in_at,
        expires_at: cmd.logged_in_at + session_ttl,
    };
    deps.sessions.insert(&session).await?;

    let purged = deps.sessions.delete_expired(cmd.logged_in_at).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }

    tracing::info!(username = %user.username, "user logged in");
    Ok(session)
}

/// セッショントークンから認証済みの利用者を解決する
///
/// 期限切れのセッションは削除して`None`を返す。
pub async fn authenticate(
    deps: &ServiceDependencies,
    token: SessionToken,
    now: DateTime<Utc>,
) -> Result<Option<CurrentUser>> {
    let Some(session) = deps.sessions.get(token).await? else {
        return Ok(None);
    };

    if session.is_expired(now) {
        deps.sessions.delete(token).await?;
        return Ok(None);
    }

    let user = deps.users.get_by_id(session.user_id).await?;
    Ok(user.as_ref().map(CurrentUser::from))
}

/// ログアウトする（存在しないトークンでも成功）
pub async fn logout(deps: &ServiceDependencies, token: SessionToken) -> Result<()> {
    deps.sessions.delete(token).await?;
    Ok(())
}

/// 初回起動時に管理者アカウントを作成する
///
/// 利用者が1人でも存在する場合は何もしない。作成した場合は`true`。
pub async fn ensure_admin_account(
    deps: &ServiceDependencies,
    username: &str,
    password: &str,
) -> Result<bool> {
    if deps.users.count().await? > 0 {
        return Ok(false);
    }

    let password_hash = hash_password(password)?;
    let user = deps.users.insert(username, &password_hash, true).await?;
    tracing::info!(username = %user.username, "admin account created");
    Ok(true)
}
