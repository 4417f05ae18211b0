use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, BorrowerName, LoanId, ReturnLoanError};

// ============================================================================
// 型安全な状態パターン
// ============================================================================

/// Loan集約の共通フィールド
///
/// Open/Closedの両状態で共有され、作成後は変化しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanCore {
    pub loan_id: LoanId,
    pub book_id: BookId,
    pub borrower_name: String,
    pub loaned_at: DateTime<Utc>,
}

/// 貸出中状態
///
/// ビジネスルール：
/// - 1冊につき同時に1件まで
/// - 返却によってのみClosedへ遷移する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenLoan {
    #[serde(flatten)]
    pub core: LoanCore,
}

impl std::ops::Deref for OpenLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 返却済み状態
///
/// ビジネスルール：
/// - returned_atが必須（型で保証）
/// - 終端状態。以降の遷移はない
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClosedLoan {
    #[serde(flatten)]
    pub core: LoanCore,
    pub returned_at: DateTime<Utc>,
}

impl std::ops::Deref for ClosedLoan {
    type Target = LoanCore;

    fn deref(&self) -> &Self::Target {
        &self.core
    }
}

/// 貸出の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanState {
    Open,
    Closed,
}

/// Loan集約
///
/// 状態遷移は Open -> Closed の1回のみ。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Loan {
    Open(OpenLoan),
    Closed(ClosedLoan),
}

impl Loan {
    /// 永続化された行から復元する
    ///
    /// returned_atがNULLならOpen、そうでなければClosed。
    pub fn from_parts(core: LoanCore, returned_at: Option<DateTime<Utc>>) -> Self {
        match returned_at {
            None => Loan::Open(OpenLoan { core }),
            Some(returned_at) => Loan::Closed(ClosedLoan { core, returned_at }),
        }
    }

    pub fn core(&self) -> &LoanCore {
        match self {
            Loan::Open(open) => &open.core,
            Loan::Closed(closed) => &closed.core,
        }
    }

    pub fn state(&self) -> LoanState {
        match self {
            Loan::Open(_) => LoanState::Open,
            Loan::Closed(_) => LoanState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == LoanState::Open
    }

    pub fn returned_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Loan::Open(_) => None,
            Loan::Closed(closed) => Some(closed.returned_at),
        }
    }
}

/// 永続化前の貸出
///
/// IDはストレージが採番する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub book_id: BookId,
    pub borrower_name: BorrowerName,
    pub loaned_at: DateTime<Utc>,
}

/// 純粋関数：書籍を貸し出す
///
/// 「未返却の貸出が既にないこと」の確認はストレージ側の一意制約と
/// アプリケーション層で行う。ここでは新しい貸出の内容を組み立てるだけ。
pub fn lend_book(
    book_id: BookId,
    borrower_name: BorrowerName,
    loaned_at: DateTime<Utc>,
) -> NewLoan {
    NewLoan {
        book_id,
        borrower_name,
        loaned_at,
    }
}

/// 純粋関数：貸出を返却する
///
/// ビジネスルール：
/// - Openのみ返却可能
/// - returned_atはloaned_atより前にならない（時計のずれは貸出時刻に丸める）
pub fn return_loan(
    loan: Loan,
    returned_at: DateTime<Utc>,
) -> Result<ClosedLoan, ReturnLoanError> {
    match loan {
        Loan::Open(open) => {
            let returned_at = returned_at.max(open.loaned_at);
            Ok(ClosedLoan {
                core: open.core,
                returned_at,
            })
        }
        Loan::Closed(_) => Err(ReturnLoanError::AlreadyReturned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn open_loan(loaned_at: DateTime<Utc>) -> Loan {
        Loan::Open(OpenLoan {
            core: LoanCore {
                loan_id: LoanId::from_i64(1),
                book_id: BookId::from_i64(10),
                borrower_name: "Alice".to_string(),
                loaned_at,
            },
        })
    }

    #[test]
    fn test_lend_book_keeps_inputs() {
        let now = Utc::now();
        let borrower = BorrowerName::parse("  Alice ").unwrap();
        let new_loan = lend_book(BookId::from_i64(10), borrower, now);
        assert_eq!(new_loan.book_id, BookId::from_i64(10));
        assert_eq!(new_loan.borrower_name.as_str(), "Alice");
        assert_eq!(new_loan.loaned_at, now);
    }

    #[test]
    fn test_return_loan_closes_open_loan() {
        let loaned_at = Utc::now();
        let returned_at = loaned_at + Duration::days(3);

        let closed = return_loan(open_loan(loaned_at), returned_at).unwrap();
        assert_eq!(closed.returned_at, returned_at);
        assert_eq!(closed.loan_id, LoanId::from_i64(1));
        assert_eq!(closed.borrower_name, "Alice");
    }

    #[test]
    fn test_return_loan_fails_when_already_returned() {
        let loaned_at = Utc::now();
        let closed = return_loan(open_loan(loaned_at), loaned_at + Duration::hours(1)).unwrap();

        let result = return_loan(Loan::Closed(closed), loaned_at + Duration::hours(2));
        assert_eq!(result.unwrap_err(), ReturnLoanError::AlreadyReturned);
    }

    #[test]
    fn test_return_loan_never_precedes_loan_time() {
        let loaned_at = Utc::now();
        let closed = return_loan(open_loan(loaned_at), loaned_at - Duration::seconds(5)).unwrap();
        assert_eq!(closed.returned_at, loaned_at);
    }

    #[test]
    fn test_from_parts_maps_null_return_to_open() {
        let loan = open_loan(Utc::now());
        let core = loan.core().clone();

        let reopened = Loan::from_parts(core.clone(), None);
        assert_eq!(reopened.state(), LoanState::Open);
        assert!(reopened.is_open());
        assert_eq!(reopened.returned_at(), None);

        let returned_at = Utc::now();
        let closed = Loan::from_parts(core, Some(returned_at));
        assert_eq!(closed.state(), LoanState::Closed);
        assert_eq!(closed.returned_at(), Some(returned_at));
    }
}
