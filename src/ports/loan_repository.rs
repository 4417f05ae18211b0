use crate::domain::{BookId, ClosedLoan, Loan, LoanId, NewLoan, OpenLoan};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;

/// 貸出リポジトリポート
///
/// 1冊につき未返却の貸出は1件まで、という不変条件の最終的な守り手。
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// 未返却の貸出を登録する
    ///
    /// 確認と挿入は不可分でなければならない。
    ///
    /// # エラー
    /// - `StoreError::MissingBook`: 書籍が存在しない
    /// - `StoreError::OpenLoanExists`: 未返却の貸出が既にある
    async fn insert_open(&self, new_loan: &NewLoan) -> Result<OpenLoan>;

    /// 書籍の未返却の貸出を取得する
    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<OpenLoan>>;

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>>;

    /// 貸出を返却済みにする（条件付き更新）
    ///
    /// # エラー
    /// - `StoreError::MissingLoan`: 貸出が存在しない
    /// - `StoreError::LoanClosed`: 既に返却済み
    async fn close(&self, loan_id: LoanId, returned_at: DateTime<Utc>) -> Result<ClosedLoan>;

    /// 書籍の貸出履歴（貸出日時の降順）
    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>>;
}
