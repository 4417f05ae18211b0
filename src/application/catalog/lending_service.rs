use crate::application::ServiceDependencies;
use crate::domain::{self, BookId, BorrowerName, Loan, OpenLoan, ReturnLoanError, commands::*};

use super::errors::{CatalogError, Result};

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 書籍が存在すること
/// - 借り手の名前が空でないこと
/// - 書籍に未返却の貸出がないこと
///
/// # 一貫性保証
///
/// 事前の確認はわかりやすいエラーを早く返すためのもの。
/// 並行する貸出作成に対しては、ストレージの一意制約
/// （1冊につき未返却の貸出は1件）が最終的に不変条件を守る。
/// 制約違反は`BookAlreadyOnLoan`として返る。
pub async fn create_loan(deps: &ServiceDependencies, cmd: CreateLoan) -> Result<OpenLoan> {
    let borrower_name = BorrowerName::parse(&cmd.borrower_name)?;

    if !deps.books.exists(cmd.book_id).await? {
        return Err(CatalogError::BookNotFound);
    }

    if deps.loans.find_open_for_book(cmd.book_id).await?.is_some() {
        tracing::warn!(book_id = %cmd.book_id, "book already on loan");
        return Err(CatalogError::BookAlreadyOnLoan);
    }

    let new_loan = domain::loan::lend_book(cmd.book_id, borrower_name, cmd.loaned_at);
    let loan = deps.loans.insert_open(&new_loan).await.map_err(|e| {
        let err = CatalogError::from(e);
        if matches!(err, CatalogError::BookAlreadyOnLoan) {
            tracing::warn!(book_id = %cmd.book_id, "concurrent loan rejected by storage");
        }
        err
    })?;

    tracing::info!(
        loan_id = %loan.loan_id,
        book_id = %loan.book_id,
        borrower = %loan.borrower_name,
        "book lent"
    );
    Ok(loan)
}

/// 貸出を返却する
///
/// ビジネスルール：
/// - 貸出が存在すること
/// - 返却済みの貸出は再度返却できない（Closedは終端状態）
///
/// ストレージへの書き込みは「未返却の場合のみ」の条件付き更新なので、
/// 同じ貸出への同時返却は片方だけが成功する。
pub async fn return_loan(deps: &ServiceDependencies, cmd: ReturnLoan) -> Result<Loan> {
    let loan = deps
        .loans
        .get_by_id(cmd.loan_id)
        .await?
        .ok_or(CatalogError::LoanNotFound)?;

    let closed = domain::loan::return_loan(loan, cmd.returned_at).map_err(|e| match e {
        ReturnLoanError::AlreadyReturned => CatalogError::LoanAlreadyReturned,
    })?;

    let closed = deps.loans.close(cmd.loan_id, closed.returned_at).await?;
    tracing::info!(loan_id = %closed.loan_id, book_id = %closed.book_id, "loan returned");

    Ok(Loan::Closed(closed))
}

/// 書籍の貸出履歴
///
/// 貸出日時の降順（新しいものが先頭）。
pub async fn loan_history(deps: &ServiceDependencies, book_id: BookId) -> Result<Vec<Loan>> {
    let (exists, loans) = futures::try_join!(
        deps.books.exists(book_id),
        deps.loans.find_by_book_id(book_id)
    )?;

    if !exists {
        return Err(CatalogError::BookNotFound);
    }

    Ok(loans)
}
