use crate::application::{ServiceDependencies, catalog};
use crate::domain::{
    BookId, BookListing, LoanId, ValidationError,
    commands::{CreateBook, CreateLoan, ReturnLoan, UpdateBook},
};
use axum::{Json, extract::State, http::StatusCode};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::Arc;

use super::{
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    session::Authenticated,
    types::{
        BookListResponse, BookRequest, BookResponse, ErrorResponse, ListBooksQuery,
        LoanHistoryEntry, LoanRequest, LoanResponse,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
    /// ログインで発行するセッションの有効期間
    pub session_ttl: chrono::Duration,
    /// セッションCookieにSecure属性を付けるか
    pub secure_cookies: bool,
    /// `/static`で配信するファイルのディレクトリ
    pub static_dir: PathBuf,
}

// ============================================================================
// Book handlers
// ============================================================================

/// GET /api/books - 書籍一覧
///
/// クエリパラメータ:
/// - q: 書名・著者の部分一致（大文字小文字を区別しない）
/// - page: ページ番号（1始まり、範囲外は丸める）
/// - limit: 1ページの件数（1〜100、既定10）
/// - sort_by: title, author, year, id
/// - order: asc, desc
#[utoipa::path(
    get,
    path = "/api/books",
    tag = "books",
    security(("session_cookie" = [])),
    params(ListBooksQuery),
    responses(
        (status = 200, description = "Page of catalog entries", body = BookListResponse),
        (status = 400, description = "Invalid sort field or order", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn list_books(
    State(state): State<Arc<AppState>>,
    Authenticated(_user): Authenticated,
    ApiQuery(query): ApiQuery<ListBooksQuery>,
) -> Result<Json<BookListResponse>, ApiError> {
    let listing = BookListing::parse(
        query.q.as_deref(),
        query.page,
        query.limit,
        query.sort_by.as_deref(),
        query.order.as_deref(),
    )
    .map_err(catalog::CatalogError::from)?;

    let page = catalog::list_books(&state.service_deps, listing).await?;
    Ok(Json(BookListResponse::from(page)))
}

/// POST /api/books - 書籍を登録
#[utoipa::path(
    post,
    path = "/api/books",
    tag = "books",
    security(("session_cookie" = [])),
    request_body = BookRequest,
    responses(
        (status = 201, description = "Book created", body = BookResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse)
    )
)]
pub async fn create_book(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    ApiJson(req): ApiJson<BookRequest>,
) -> Result<(StatusCode, Json<BookResponse>), ApiError> {
    let (title, author, year) = req.into_fields().map_err(catalog::CatalogError::from)?;

    let cmd = CreateBook {
        title,
        author,
        year,
        requested_at: Utc::now(),
    };
    let entry = catalog::create_book(&state.service_deps, cmd).await?;
    tracing::debug!(username = %user.username, book_id = %entry.book.book_id, "create_book");

    Ok((StatusCode::CREATED, Json(BookResponse::from(entry))))
}

/// GET /api/books/:id - 書籍1件
#[utoipa::path(
    get,
    path = "/api/books/{id}",
    tag = "books",
    security(("session_cookie" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Catalog entry", body = BookResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Authenticated(_user): Authenticated,
    ApiPath(book_id): ApiPath<i64>,
) -> Result<Json<BookResponse>, ApiError> {
    let entry = catalog::get_book(&state.service_deps, BookId::from_i64(book_id)).await?;
    Ok(Json(BookResponse::from(entry)))
}

/// PUT /api/books/:id - 書籍を更新
///
/// 貸出記録は変更しない。
#[utoipa::path(
    put,
    path = "/api/books/{id}",
    tag = "books",
    security(("session_cookie" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    request_body = BookRequest,
    responses(
        (status = 200, description = "Book updated", body = BookResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn update_book(
    State(state): State<Arc<AppState>>,
    Authenticated(_user): Authenticated,
    ApiPath(book_id): ApiPath<i64>,
    ApiJson(req): ApiJson<BookRequest>,
) -> Result<Json<BookResponse>, ApiError> {
    let (title, author, year) = req.into_fields().map_err(catalog::CatalogError::from)?;

    let cmd = UpdateBook {
        book_id: BookId::from_i64(book_id),
        title,
        author,
        year,
        requested_at: Utc::now(),
    };
    let entry = catalog::update_book(&state.service_deps, cmd).await?;

    Ok(Json(BookResponse::from(entry)))
}

/// DELETE /api/books/:id - 書籍を削除
///
/// 貸出中の書籍は409。
#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    tag = "books",
    security(("session_cookie" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book and its closed loans deleted"),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "Book is on loan", body = ErrorResponse)
    )
)]
pub async fn delete_book(
    State(state): State<Arc<AppState>>,
    Authenticated(_user): Authenticated,
    ApiPath(book_id): ApiPath<i64>,
) -> Result<StatusCode, ApiError> {
    catalog::delete_book(&state.service_deps, BookId::from_i64(book_id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/books/:id/loans - 貸出履歴（新しい順）
#[utoipa::path(
    get,
    path = "/api/books/{id}/loans",
    tag = "loans",
    security(("session_cookie" = [])),
    params(("id" = i64, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Loans of the book, newest first", body = Vec<LoanHistoryEntry>),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse)
    )
)]
pub async fn loan_history(
    State(state): State<Arc<AppState>>,
    Authenticated(_user): Authenticated,
    ApiPath(book_id): ApiPath<i64>,
) -> Result<Json<Vec<LoanHistoryEntry>>, ApiError> {
    let loans = catalog::loan_history(&state.service_deps, BookId::from_i64(book_id)).await?;
    Ok(Json(loans.into_iter().map(LoanHistoryEntry::from).collect()))
}

// ============================================================================
// Loan handlers
// ============================================================================

/// POST /api/loans - 書籍を貸し出す
///
/// 強制されるビジネスルール:
/// - 書籍が存在すること
/// - 借り手の名前が空でないこと
/// - 書籍に未返却の貸出がないこと（違反は409）
#[utoipa::path(
    post,
    path = "/api/loans",
    tag = "loans",
    security(("session_cookie" = [])),
    request_body = LoanRequest,
    responses(
        (status = 201, description = "Loan opened", body = LoanResponse),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "Book not found", body = ErrorResponse),
        (status = 409, description = "Book already on loan", body = ErrorResponse)
    )
)]
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    Authenticated(user): Authenticated,
    ApiJson(req): ApiJson<LoanRequest>,
) -> Result<(StatusCode, Json<LoanResponse>), ApiError> {
    let book_id = req
        .book_id
        .ok_or(ValidationError::MissingField("book_id"))
        .map_err(catalog::CatalogError::from)?;
    let borrower_name = req
        .borrower_name
        .ok_or(ValidationError::MissingField("borrower_name"))
        .map_err(catalog::CatalogError::from)?;

    let cmd = CreateLoan {
        book_id: BookId::from_i64(book_id),
        borrower_name,
        loaned_at: Utc::now(),
    };
    let loan = catalog::create_loan(&state.service_deps, cmd).await?;
    tracing::debug!(username = %user.username, loan_id = %loan.loan_id, "create_loan");

    Ok((
        StatusCode::CREATED,
        Json(LoanResponse::from(crate::domain::Loan::Open(loan))),
    ))
}

/// PATCH /api/loans/:id/return - 貸出を返却
///
/// 返却済みの貸出は409。
#[utoipa::path(
    patch,
    path = "/api/loans/{id}/return",
    tag = "loans",
    security(("session_cookie" = [])),
    params(("id" = i64, Path, description = "Loan ID")),
    responses(
        (status = 200, description = "Loan closed", body = LoanResponse),
        (status = 401, description = "No valid session", body = ErrorResponse),
        (status = 404, description = "Loan not found", body = ErrorResponse),
        (status = 409, description = "Loan already returned", body = ErrorResponse)
    )
)]
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    Authenticated(_user): Authenticated,
    ApiPath(loan_id): ApiPath<i64>,
) -> Result<Json<LoanResponse>, ApiError> {
    let cmd = ReturnLoan {
        loan_id: LoanId::from_i64(loan_id),
        returned_at: Utc::now(),
    };
    let loan = catalog::return_loan(&state.service_deps, cmd).await?;

    Ok(Json(LoanResponse::from(loan)))
}
