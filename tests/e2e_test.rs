use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use library_catalog::api::types::*;
use serde_json::{Value, json};
use tower::ServiceExt;

mod common;

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> axum::response::Response {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_string(&json).unwrap())
        }
        None => Body::empty(),
    };

    app.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn create_clean_code(app: &axum::Router, cookie: &str) -> BookResponse {
    let response = send(
        app,
        "POST",
        "/api/books",
        Some(cookie),
        Some(json!({ "title": "Clean Code", "author": "R. Martin", "year": 2008 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json(response).await
}

// ============================================================================
// 認証
// ============================================================================

#[tokio::test]
async fn test_health_needs_no_session() {
    let app = common::setup_app().await;

    let response = send(&app, "GET", "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_requires_session() {
    let app = common::setup_app().await;

    let response = send(&app, "GET", "/api/books", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "UNAUTHORIZED");

    let response = send(
        &app,
        "GET",
        "/api/books",
        Some("session=00000000-0000-0000-0000-000000000000"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_index_redirects_to_login_without_session() {
    let app = common::setup_app().await;

    let response = send(&app, "GET", "/", None, None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login?next=/");

    let cookie = common::login(&app).await;
    let response = send(&app, "GET", "/", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    // ログイン済みならログインページから戻される
    let response = send(&app, "GET", "/login", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_login_with_wrong_password_fails() {
    let app = common::setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from("username=admin&password=wrong"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
}

#[tokio::test]
async fn test_login_ignores_external_next() {
    let app = common::setup_app().await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(
                    "username=admin&password=123456&next=%2F%2Fevil.example",
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;

    let response = send(&app, "GET", "/api/books", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "POST", "/logout", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/login");

    // 古いCookieを送り続けても通らない
    let response = send(&app, "GET", "/api/books", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

// ============================================================================
// 画面とAPIドキュメント
// ============================================================================

async fn read_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

#[tokio::test]
async fn test_index_page_offers_catalog_controls() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;

    let response = send(&app, "GET", "/", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let html = read_text(response).await;

    for control in [
        r#"id="form-new-book""#,
        r#"id="form-edit-book""#,
        r#"id="form-loan""#,
        r#"id="history-dialog""#,
        r#"id="search-input""#,
        r#"data-sort-by="year""#,
        r#"id="prev-page""#,
        r#"id="next-page""#,
    ] {
        assert!(html.contains(control), "index page lacks {control}");
    }
}

#[tokio::test]
async fn test_static_assets_are_served_without_session() {
    let app = common::setup_app().await;

    let response = send(&app, "GET", "/static/app.js", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let script = read_text(response).await;
    assert!(script.contains("/loans/"));
    assert!(script.contains("sort_by"));

    let response = send(&app, "GET", "/static/style.css", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, "GET", "/static/missing.js", None, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_is_public() {
    let app = common::setup_app().await;

    let response = send(&app, "GET", "/api-docs/openapi.json", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let doc: Value = read_json(response).await;
    assert!(doc["paths"]["/api/books/{id}"]["delete"].is_object());
    assert!(doc["paths"]["/api/loans/{id}/return"]["patch"].is_object());
    assert!(doc["components"]["securitySchemes"]["session_cookie"].is_object());
}

// ============================================================================
// 書籍
// ============================================================================

#[tokio::test]
async fn test_book_crud() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;

    let book = create_clean_code(&app, &cookie).await;
    assert_eq!(book.title, "Clean Code");
    assert!(book.available);
    assert_eq!(book.borrowed_to, None);

    let response = send(&app, "GET", &format!("/api/books/{}", book.id), Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: BookResponse = read_json(response).await;
    assert_eq!(fetched.id, book.id);

    // ポルトガル語のフィールド名と文字列の出版年
    let response = send(
        &app,
        "PUT",
        &format!("/api/books/{}", book.id),
        Some(&cookie),
        Some(json!({ "titulo": "Clean Code 2e", "autor": "Robert C. Martin", "ano": "2009" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: BookResponse = read_json(response).await;
    assert_eq!(updated.title, "Clean Code 2e");
    assert_eq!(updated.author, "Robert C. Martin");
    assert_eq!(updated.year, 2009);

    let response = send(&app, "DELETE", &format!("/api/books/{}", book.id), Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = send(&app, "GET", &format!("/api/books/{}", book.id), Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_NOT_FOUND");
}

#[tokio::test]
async fn test_book_validation_errors() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;

    for body in [
        json!({ "title": "Old", "author": "Someone", "year": 500 }),
        json!({ "title": " ", "author": "Someone", "year": 2000 }),
        json!({ "title": "No year", "author": "Someone" }),
        json!({ "title": "Bad year", "author": "Someone", "year": "soon" }),
    ] {
        let response = send(&app, "POST", "/api/books", Some(&cookie), Some(body)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let error: ErrorResponse = read_json(response).await;
        assert_eq!(error.error, "VALIDATION_ERROR");
    }

    // JSONとして壊れている
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/books")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_books_query_parameters() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;

    create_clean_code(&app, &cookie).await;
    send(
        &app,
        "POST",
        "/api/books",
        Some(&cookie),
        Some(json!({ "title": "Estruturas de Dados", "author": "N. Wirth", "year": 1976 })),
    )
    .await;

    let response = send(
        &app,
        "GET",
        "/api/books?sort_by=year&order=desc&limit=1&page=2",
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let list: BookListResponse = read_json(response).await;
    assert_eq!(list.total_items, 2);
    assert_eq!(list.total_pages, 2);
    assert_eq!(list.current_page, 2);
    assert_eq!(list.limit, 1);
    assert_eq!(list.items[0].title, "Estruturas de Dados");

    let response = send(&app, "GET", "/api/books?q=wirth", Some(&cookie), None).await;
    let list: BookListResponse = read_json(response).await;
    assert_eq!(list.total_items, 1);

    for uri in [
        "/api/books?sort_by=price",
        "/api/books?order=sideways",
        "/api/books?limit=0",
        "/api/books?page=abc",
    ] {
        let response = send(&app, "GET", uri, Some(&cookie), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
    }
}

// ============================================================================
// 貸出
// ============================================================================

#[tokio::test]
async fn test_loan_flow() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;
    let book = create_clean_code(&app, &cookie).await;

    // Step 1: 貸出（旧クライアントのフィールド名）
    let response = send(
        &app,
        "POST",
        "/api/loans",
        Some(&cookie),
        Some(json!({ "livro_id": book.id, "nome_usuario": "Alice" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let loan: LoanResponse = read_json(response).await;
    assert_eq!(loan.book_id, book.id);
    assert_eq!(loan.borrower_name, "Alice");
    assert_eq!(loan.return_date, None);

    let response = send(&app, "GET", &format!("/api/books/{}", book.id), Some(&cookie), None).await;
    let fetched: BookResponse = read_json(response).await;
    assert!(!fetched.available);
    assert_eq!(fetched.borrowed_to.as_deref(), Some("Alice"));

    // Step 2: 貸出中は貸出も削除もできない
    let response = send(
        &app,
        "POST",
        "/api/loans",
        Some(&cookie),
        Some(json!({ "book_id": book.id, "borrower_name": "Bob" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "BOOK_ALREADY_ON_LOAN");

    let response = send(&app, "DELETE", &format!("/api/books/{}", book.id), Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Step 3: 返却
    let response = send(
        &app,
        "PATCH",
        &format!("/api/loans/{}/return", loan.id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let returned: LoanResponse = read_json(response).await;
    assert!(returned.return_date.is_some());

    // 二重返却
    let response = send(
        &app,
        "POST",
        &format!("/api/loans/{}/return", loan.id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "LOAN_ALREADY_RETURNED");

    // Step 4: 履歴
    let response = send(
        &app,
        "GET",
        &format!("/api/books/{}/loans", book.id),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let history: Vec<LoanHistoryEntry> = read_json(response).await;
    assert_eq!(history.len(), 1);
    assert!(!history[0].open);
    assert_eq!(history[0].loan.id, loan.id);

    let response = send(&app, "GET", &format!("/api/books/{}", book.id), Some(&cookie), None).await;
    let fetched: BookResponse = read_json(response).await;
    assert!(fetched.available);
}

#[tokio::test]
async fn test_loan_request_errors() {
    let app = common::setup_app().await;
    let cookie = common::login(&app).await;

    let response = send(
        &app,
        "POST",
        "/api/loans",
        Some(&cookie),
        Some(json!({ "book_id": 999, "borrower_name": "Alice" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(
        &app,
        "POST",
        "/api/loans",
        Some(&cookie),
        Some(json!({ "borrower_name": "Alice" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = send(&app, "PATCH", "/api/loans/999/return", Some(&cookie), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let error: ErrorResponse = read_json(response).await;
    assert_eq!(error.error, "LOAN_NOT_FOUND");
}
