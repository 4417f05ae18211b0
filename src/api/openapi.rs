//! OpenAPIドキュメントとSwagger UI

use axum::Router;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

use super::handlers;
use super::session::SESSION_COOKIE;
use super::types::{
    BookListResponse, BookRequest, BookResponse, ErrorResponse, LoanHistoryEntry, LoanRequest,
    LoanResponse,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Library Catalog API",
        version = "0.1.0",
        description = "Book catalog and loan ledger. Every endpoint requires a session cookie from POST /login."
    ),
    paths(
        handlers::list_books,
        handlers::create_book,
        handlers::get_book,
        handlers::update_book,
        handlers::delete_book,
        handlers::loan_history,
        handlers::create_loan,
        handlers::return_loan,
    ),
    components(
        schemas(
            BookRequest,
            BookResponse,
            BookListResponse,
            LoanRequest,
            LoanResponse,
            LoanHistoryEntry,
            ErrorResponse,
        )
    ),
    modifiers(&SessionCookie),
    tags(
        (name = "books", description = "Catalog management"),
        (name = "loans", description = "Lending and returns")
    )
)]
pub struct ApiDoc;

/// ログインで発行されるセッションCookieを認証方式として登録する
struct SessionCookie;

impl Modify for SessionCookie {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new(SESSION_COOKIE))),
            );
        }
    }
}

/// Swagger UIとOpenAPI JSONのルーター（セッション不要）
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_documents_every_api_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/books",
            "/api/books/{id}",
            "/api/books/{id}/loans",
            "/api/loans",
            "/api/loans/{id}/return",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }

    #[test]
    fn test_openapi_registers_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("session_cookie"));
        assert!(components.schemas.contains_key("BookResponse"));
    }
}
