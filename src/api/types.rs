use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::{CatalogEntry, Loan, Page, ValidationError};

/// 書籍の登録・更新リクエスト
///
/// 旧クライアントのフィールド名（titulo, autor, ano）も受け付ける。
/// 必須項目の欠落はJSONの解析エラーではなくバリデーションエラーとして返すため、
/// すべてOptionで受ける。
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BookRequest {
    #[serde(alias = "titulo")]
    #[schema(example = "Clean Code")]
    pub title: Option<String>,
    #[serde(alias = "autor")]
    #[schema(example = "Robert C. Martin")]
    pub author: Option<String>,
    /// 整数または数字の文字列
    #[serde(alias = "ano")]
    #[schema(value_type = Option<i64>, example = 2008)]
    pub year: Option<serde_json::Value>,
}

impl BookRequest {
    /// 必須項目を取り出す（書名, 著者, 出版年）
    pub fn into_fields(self) -> Result<(String, String, i64), ValidationError> {
        let title = self.title.ok_or(ValidationError::MissingField("title"))?;
        let author = self.author.ok_or(ValidationError::MissingField("author"))?;
        let year = self.year.ok_or(ValidationError::MissingField("year"))?;
        Ok((title, author, parse_year(&year)?))
    }
}

fn parse_year(value: &serde_json::Value) -> Result<i64, ValidationError> {
    let parsed = match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ValidationError::NotAnInteger {
        field: "year",
        value: value.to_string(),
    })
}

/// 貸出作成リクエスト
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LoanRequest {
    #[serde(alias = "livro_id")]
    pub book_id: Option<i64>,
    #[serde(alias = "nome_usuario")]
    pub borrower_name: Option<String>,
}

/// 書籍一覧のクエリパラメータ
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBooksQuery {
    /// 書名・著者の部分一致検索
    pub q: Option<String>,
    /// ページ番号（1始まり）
    pub page: Option<i64>,
    /// 1ページの件数（1〜100）
    pub limit: Option<i64>,
    /// id, title, author, year
    pub sort_by: Option<String>,
    /// asc, desc
    pub order: Option<String>,
}

/// 書籍レスポンス
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookResponse {
    pub id: i64,
    pub title: String,
    pub author: String,
    pub year: i32,
    pub available: bool,
    pub borrowed_to: Option<String>,
}

impl From<CatalogEntry> for BookResponse {
    fn from(entry: CatalogEntry) -> Self {
        let available = entry.is_available();
        let borrowed_to = entry.borrowed_to().map(str::to_string);
        Self {
            id: entry.book.book_id.value(),
            title: entry.book.title,
            author: entry.book.author,
            year: entry.book.year,
            available,
            borrowed_to,
        }
    }
}

/// 書籍一覧レスポンス
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookListResponse {
    pub items: Vec<BookResponse>,
    pub total_items: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub limit: u32,
}

impl From<Page<CatalogEntry>> for BookListResponse {
    fn from(page: Page<CatalogEntry>) -> Self {
        Self {
            items: page.items.into_iter().map(BookResponse::from).collect(),
            total_items: page.total_items,
            total_pages: page.total_pages,
            current_page: page.current_page,
            limit: page.limit,
        }
    }
}

/// 貸出レスポンス
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanResponse {
    pub id: i64,
    pub book_id: i64,
    pub borrower_name: String,
    pub loan_date: DateTime<Utc>,
    pub return_date: Option<DateTime<Utc>>,
}

impl From<Loan> for LoanResponse {
    fn from(loan: Loan) -> Self {
        let return_date = loan.returned_at();
        let core = loan.core();
        Self {
            id: core.loan_id.value(),
            book_id: core.book_id.value(),
            borrower_name: core.borrower_name.clone(),
            loan_date: core.loaned_at,
            return_date,
        }
    }
}

/// 貸出履歴の1件
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoanHistoryEntry {
    #[serde(flatten)]
    pub loan: LoanResponse,
    pub open: bool,
}

impl From<Loan> for LoanHistoryEntry {
    fn from(loan: Loan) -> Self {
        let open = loan.is_open();
        Self {
            loan: LoanResponse::from(loan),
            open,
        }
    }
}

/// エラーレスポンス
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
