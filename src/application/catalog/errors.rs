use crate::domain::ValidationError;
use crate::ports::StoreError;
use thiserror::Error;

/// カタログ・貸出台帳のエラー
#[derive(Debug, Error)]
pub enum CatalogError {
    /// 入力値が不正
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// 書籍が見つからない
    #[error("book not found")]
    BookNotFound,

    /// 貸出が見つからない
    #[error("loan not found")]
    LoanNotFound,

    /// 書籍は既に貸出中（貸出作成時）
    #[error("book already on loan")]
    BookAlreadyOnLoan,

    /// 貸出は既に返却済み
    #[error("loan already returned")]
    LoanAlreadyReturned,

    /// 書籍が貸出中のため削除できない
    #[error("book is currently on loan")]
    BookOnLoan,

    /// ストレージのエラー
    #[error("storage error")]
    Store(#[source] StoreError),
}

/// エラーの分類
///
/// HTTP層はこの分類だけを見てステータスコードを決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

impl CatalogError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CatalogError::Validation(_) => ErrorKind::Validation,
            CatalogError::BookNotFound | CatalogError::LoanNotFound => ErrorKind::NotFound,
            CatalogError::BookAlreadyOnLoan
            | CatalogError::LoanAlreadyReturned
            | CatalogError::BookOnLoan => ErrorKind::Conflict,
            CatalogError::Store(_) => ErrorKind::Internal,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingBook(_) => CatalogError::BookNotFound,
            StoreError::MissingLoan(_) => CatalogError::LoanNotFound,
            StoreError::OpenLoanExists(_) => CatalogError::BookAlreadyOnLoan,
            StoreError::LoanClosed(_) => CatalogError::LoanAlreadyReturned,
            err @ StoreError::Backend(_) => CatalogError::Store(err),
        }
    }
}

/// カタログ層の Result型
pub type Result<T> = std::result::Result<T, CatalogError>;
