pub mod book_repository;
pub mod loan_repository;
pub mod session_store;
pub mod user_repository;

pub use book_repository::*;
pub use loan_repository::*;
pub use session_store::*;
pub use user_repository::*;

use crate::domain::{BookId, LoanId};
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// ストレージ層のエラー
///
/// 不変条件違反（一意制約・外部キー・条件付き更新の失敗）は
/// アダプターがこの列挙子に変換し、アプリケーション層で意味のあるエラーになる。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 参照先の書籍が存在しない
    #[error("book {0} does not exist")]
    MissingBook(BookId),

    /// 参照先の貸出が存在しない
    #[error("loan {0} does not exist")]
    MissingLoan(LoanId),

    /// 書籍に未返却の貸出が既にある（一意制約違反）
    #[error("book {0} already has an open loan")]
    OpenLoanExists(BookId),

    /// 貸出は既に返却済み
    #[error("loan {0} is already closed")]
    LoanClosed(LoanId),

    /// 接続断・SQLエラーなどの基盤エラー
    #[error("storage backend error")]
    Backend(#[source] BoxError),
}

impl StoreError {
    pub fn backend(message: impl Into<String>) -> Self {
        let message: String = message.into();
        StoreError::Backend(message.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
