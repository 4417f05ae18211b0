use crate::domain::{BookId, ClosedLoan, Loan, LoanCore, LoanId, NewLoan, OpenLoan};
use crate::ports::loan_repository::LoanRepository as LoanRepositoryTrait;
use crate::ports::{Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

/// 書籍ごとに未返却の貸出を1件に限る部分一意インデックス
const ONE_OPEN_LOAN_PER_BOOK: &str = "loans_one_open_per_book";

fn map_row_to_core(row: &PgRow) -> Result<LoanCore> {
    Ok(LoanCore {
        loan_id: LoanId::from_i64(row.try_get("id")?),
        book_id: BookId::from_i64(row.try_get("book_id")?),
        borrower_name: row.try_get("borrower_name")?,
        loaned_at: row.try_get("loaned_at")?,
    })
}

fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let returned_at: Option<DateTime<Utc>> = row.try_get("returned_at")?;
    Ok(Loan::from_parts(map_row_to_core(row)?, returned_at))
}

/// 登録時の制約違反を不変条件のエラーに変換する
fn map_insert_error(err: sqlx::Error, book_id: BookId) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(ONE_OPEN_LOAN_PER_BOOK) {
            return StoreError::OpenLoanExists(book_id);
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::MissingBook(book_id);
        }
    }
    StoreError::from(err)
}

/// 貸出台帳のPostgreSQL実装
///
/// 1冊につき未返却の貸出は1件という不変条件は、読んでから書く手順ではなく
/// 部分一意インデックス`loans_one_open_per_book`で守る。
pub struct LoanRepository {
    pool: PgPool,
}

impl LoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepositoryTrait for LoanRepository {
    async fn insert_open(&self, new_loan: &NewLoan) -> Result<OpenLoan> {
        let mut tx = self.pool.begin().await?;

        // キー共有ロック：完了するまで同じ書籍の並行削除を待たせる
        let book: Option<i64> =
            sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR KEY SHARE")
                .bind(new_loan.book_id.value())
                .fetch_optional(&mut *tx)
                .await?;
        if book.is_none() {
            return Err(StoreError::MissingBook(new_loan.book_id));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO loans (book_id, borrower_name, loaned_at)
            VALUES ($1, $2, $3)
            RETURNING id, book_id, borrower_name, loaned_at
            "#,
        )
        .bind(new_loan.book_id.value())
        .bind(new_loan.borrower_name.as_str())
        .bind(new_loan.loaned_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_insert_error(e, new_loan.book_id))?;

        let core = map_row_to_core(&row)?;
        tx.commit().await?;

        Ok(OpenLoan { core })
    }

    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<OpenLoan>> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, borrower_name, loaned_at
            FROM loans
            WHERE book_id = $1 AND returned_at IS NULL
            "#,
        )
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref()
            .map(|row| map_row_to_core(row).map(|core| OpenLoan { core }))
            .transpose()
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        let row = sqlx::query(
            r#"
            SELECT id, book_id, borrower_name, loaned_at, returned_at
            FROM loans
            WHERE id = $1
            "#,
        )
        .bind(loan_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 未返却の場合に限り貸出を返却済みにする
    ///
    /// 更新された行がなければ、もう一度引いて返却済みか存在しないかを区別する。
    async fn close(&self, loan_id: LoanId, returned_at: DateTime<Utc>) -> Result<ClosedLoan> {
        let row = sqlx::query(
            r#"
            UPDATE loans
            SET returned_at = $2
            WHERE id = $1 AND returned_at IS NULL
            RETURNING id, book_id, borrower_name, loaned_at, returned_at
            "#,
        )
        .bind(loan_id.value())
        .bind(returned_at)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            return Ok(ClosedLoan {
                core: map_row_to_core(&row)?,
                returned_at: row.try_get("returned_at")?,
            });
        }

        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM loans WHERE id = $1)")
            .bind(loan_id.value())
            .fetch_one(&self.pool)
            .await?;

        if exists {
            Err(StoreError::LoanClosed(loan_id))
        } else {
            Err(StoreError::MissingLoan(loan_id))
        }
    }

    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(
            r#"
            SELECT id, book_id, borrower_name, loaned_at, returned_at
            FROM loans
            WHERE book_id = $1
            ORDER BY loaned_at DESC, id DESC
            "#,
        )
        .bind(book_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }
}
