use chrono::{DateTime, Utc};

use super::{BookId, LoanId};

/// コマンド：書籍を登録する
///
/// requested_atの年が出版年の上限判定に使われる。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBook {
    pub title: String,
    pub author: String,
    pub year: i64,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：書籍を更新する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateBook {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub year: i64,
    pub requested_at: DateTime<Utc>,
}

/// コマンド：書籍を貸し出す
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLoan {
    pub book_id: BookId,
    pub borrower_name: String,
    pub loaned_at: DateTime<Utc>,
}

/// コマンド：貸出を返却する
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnLoan {
    pub loan_id: LoanId,
    pub returned_at: DateTime<Utc>,
}

/// コマンド：ログインする
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Login {
    pub username: String,
    pub password: String,
    pub logged_in_at: DateTime<Utc>,
}
