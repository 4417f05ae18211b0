use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};

use super::handlers::{
    AppState, create_book, create_loan, delete_book, get_book, list_books, loan_history,
    return_loan, update_book,
};
use super::openapi::create_openapi_router;
use super::session::{index, login, login_page, logout};

/// Creates the application router
///
/// Pages and session endpoints:
/// - GET /health - Liveness check (no session required)
/// - GET|POST /login, GET|POST /logout
/// - GET / - Index page
/// - GET /static/* - Scripts and styles for the pages
/// - GET /swagger-ui, GET /api-docs/openapi.json - API documentation (no session required)
///
/// JSON API (session required, nested under /api):
/// - GET|POST /books
/// - GET|PUT|DELETE /books/:id
/// - GET /books/:id/loans
/// - POST /loans
/// - PATCH|POST /loans/:id/return
pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Pages
        .route("/", get(index))
        .route("/login", get(login_page).post(login))
        .route("/logout", get(logout).post(logout))
        .nest("/api", api_routes())
        .nest_service("/static", static_files)
        // Add application state
        .with_state(state)
        .merge(create_openapi_router())
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/books", get(list_books).post(create_book))
        .route(
            "/books/:id",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/books/:id/loans", get(loan_history))
        .route("/loans", post(create_loan))
        .route("/loans/:id/return", post(return_loan).patch(return_loan))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
