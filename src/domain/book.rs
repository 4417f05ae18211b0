use serde::{Deserialize, Serialize};

use super::{Author, BookId, LoanId, OpenLoan, PublicationYear, Title, ValidationError};

/// 書籍の属性（検証済み）
///
/// 作成・更新の両方で使われる。ここを通った値だけが永続化される。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookDetails {
    pub title: Title,
    pub author: Author,
    pub year: PublicationYear,
}

impl BookDetails {
    /// 書名・著者・出版年を検証する
    ///
    /// # エラー
    /// - 書名・著者が空白のみ: `EmptyField`
    /// - 出版年が 1000..=current_year+1 の範囲外: `YearOutOfRange`
    pub fn parse(
        title: &str,
        author: &str,
        year: i64,
        current_year: i32,
    ) -> Result<Self, ValidationError> {
        Ok(Self {
            title: Title::parse(title)?,
            author: Author::parse(author)?,
            year: PublicationYear::parse(year, current_year)?,
        })
    }
}

/// 書籍 - カタログの1エントリ
///
/// 貸出可否は保持しない。常に貸出記録から導出する。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub book_id: BookId,
    pub title: String,
    pub author: String,
    pub year: i32,
}

/// 貸出可否（導出値）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    /// 未返却の貸出がない
    Available,
    /// 未返却の貸出がある
    OnLoan {
        loan_id: LoanId,
        borrower_name: String,
    },
}

impl Availability {
    /// 未返却の貸出（あれば）から貸出可否を導出する
    pub fn from_open_loan(open_loan: Option<&OpenLoan>) -> Self {
        match open_loan {
            Some(loan) => Availability::OnLoan {
                loan_id: loan.loan_id,
                borrower_name: loan.borrower_name.clone(),
            },
            None => Availability::Available,
        }
    }
}

/// 書籍と、その時点の貸出可否
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub book: Book,
    pub availability: Availability,
}

impl CatalogEntry {
    pub fn new(book: Book, availability: Availability) -> Self {
        Self { book, availability }
    }

    pub fn is_available(&self) -> bool {
        matches!(self.availability, Availability::Available)
    }

    /// 貸出中の場合は借り手の名前
    pub fn borrowed_to(&self) -> Option<&str> {
        match &self.availability {
            Availability::Available => None,
            Availability::OnLoan { borrower_name, .. } => Some(borrower_name.as_str()),
        }
    }
}
