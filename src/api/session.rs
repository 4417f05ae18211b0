use crate::application::auth::{self, AuthError};
use crate::domain::{CurrentUser, SessionToken, commands::Login};
use axum::{
    Form,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, request::Parts},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use super::{error::ApiError, handlers::AppState, pages};

/// セッションCookieの名前
pub const SESSION_COOKIE: &str = "session";

/// 認証済みの利用者（セッションCookieから解決）
///
/// 有効なセッションがない場合は401で拒否する。
/// ページのようにリダイレクトしたい場合は`Option<Authenticated>`で受ける。
#[derive(Debug, Clone)]
pub struct Authenticated(pub CurrentUser);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Authenticated {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = session_token(&jar).ok_or(ApiError::Unauthorized)?;

        auth::authenticate(&state.service_deps, token, Utc::now())
            .await?
            .map(Authenticated)
            .ok_or(ApiError::Unauthorized)
    }
}

fn session_token(jar: &CookieJar) -> Option<SessionToken> {
    jar.get(SESSION_COOKIE)
        .and_then(|cookie| SessionToken::parse(cookie.value()))
}

/// ログイン後の遷移先として安全なパスか
///
/// 同一オリジンの絶対パスのみ許可する（`//host`や`/\host`は外部に飛ぶため不可）。
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") =>
        {
            path
        }
        _ => "/",
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    pub next: Option<String>,
}

/// GET /login - ログインページ
///
/// ログイン済みなら遷移先へリダイレクトする。
pub async fn login_page(
    user: Option<Authenticated>,
    Query(query): Query<NextQuery>,
) -> Response {
    let next = safe_next(query.next.as_deref());
    if user.is_some() {
        return Redirect::to(next).into_response();
    }
    Html(pages::login_page(None, next)).into_response()
}

/// POST /login - フォームでログイン
///
/// 成功するとセッションCookieを設定して遷移先へリダイレクトする。
/// 失敗した場合は401でログインページを再表示する。
pub async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Response {
    let next = safe_next(form.next.as_deref()).to_string();
    let cmd = Login {
        username: form.username,
        password: form.password,
        logged_in_at: Utc::now(),
    };

    match auth::login(&state.service_deps, cmd, state.session_ttl).await {
        Ok(session) => {
            let cookie = Cookie::build((SESSION_COOKIE, session.token.to_string()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .secure(state.secure_cookies);
            (jar.add(cookie), Redirect::to(&next)).into_response()
        }
        Err(AuthError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Html(pages::login_page(Some("Invalid username or password"), &next)),
        )
            .into_response(),
        Err(err) => ApiError::from(err).into_response(),
    }
}

/// GET|POST /logout - セッションを破棄してログインページへ
pub async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(token) = session_token(&jar) {
        if let Err(err) = auth::logout(&state.service_deps, token).await {
            return ApiError::from(err).into_response();
        }
    }

    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path("/"));
    (jar, Redirect::to("/login")).into_response()
}

/// GET / - トップページ
pub async fn index(user: Option<Authenticated>) -> Response {
    match user {
        Some(Authenticated(user)) => Html(pages::index_page(&user)).into_response(),
        None => Redirect::to("/login?next=/").into_response(),
    }
}
