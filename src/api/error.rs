use crate::application::auth::AuthError;
use crate::application::catalog::{CatalogError, ErrorKind};
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub enum ApiError {
    Catalog(CatalogError),
    Auth(AuthError),
    /// 有効なセッションがない
    Unauthorized,
    /// リクエストの形式が不正（JSON・クエリ・パスの解析失敗）
    BadRequest(String),
}

impl From<CatalogError> for ApiError {
    fn from(err: CatalogError) -> Self {
        ApiError::Catalog(err)
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

fn catalog_error_code(err: &CatalogError) -> &'static str {
    match err {
        CatalogError::Validation(_) => "VALIDATION_ERROR",
        CatalogError::BookNotFound => "BOOK_NOT_FOUND",
        CatalogError::LoanNotFound => "LOAN_NOT_FOUND",
        CatalogError::BookAlreadyOnLoan => "BOOK_ALREADY_ON_LOAN",
        CatalogError::LoanAlreadyReturned => "LOAN_ALREADY_RETURNED",
        CatalogError::BookOnLoan => "BOOK_ON_LOAN",
        CatalogError::Store(_) => "STORAGE_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match self {
            ApiError::Catalog(ref err) => {
                let status = match err.kind() {
                    // 400 Bad Request - 入力値の不正
                    ErrorKind::Validation => StatusCode::BAD_REQUEST,
                    // 404 Not Found - 参照先が存在しない
                    ErrorKind::NotFound => StatusCode::NOT_FOUND,
                    // 409 Conflict - 貸出の不変条件に反する操作
                    ErrorKind::Conflict => StatusCode::CONFLICT,
                    // 500 Internal Server Error - 詳細はログのみに残す
                    ErrorKind::Internal => {
                        tracing::error!(error = ?err, "catalog operation failed");
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
                    "An unexpected error occurred".to_string()
                } else {
                    err.to_string()
                };
                (status, catalog_error_code(err), message)
            }
            ApiError::Auth(AuthError::InvalidCredentials) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid username or password".to_string(),
            ),
            ApiError::Auth(ref err) => {
                tracing::error!(error = ?err, "authentication failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "AUTH_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", message),
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
