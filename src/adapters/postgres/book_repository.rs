use crate::domain::{
    Availability, Book, BookDetails, BookId, BookSearch, CatalogEntry, LoanId, SortField,
    SortOrder,
};
use crate::ports::Result;
use crate::ports::book_repository::{BookRepository as BookRepositoryTrait, DeleteOutcome};
use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

/// 書籍と未返却の貸出（あれば）を合わせて取得する列
const ENTRY_COLUMNS: &str = r#"
    b.id,
    b.title,
    b.author,
    b.year,
    l.id AS open_loan_id,
    l.borrower_name AS open_borrower_name
"#;

/// 未返却の貸出は書籍ごとに高々1件なので、結合しても1冊1行になる
const OPEN_LOAN_JOIN: &str = "LEFT JOIN loans l ON l.book_id = b.id AND l.returned_at IS NULL";

/// `count`と`search`で共有する検索条件。`$1`はLIKEパターンまたはNULL
const SEARCH_FILTER: &str =
    r#"($1::text IS NULL OR b.title ILIKE $1 ESCAPE '\' OR b.author ILIKE $1 ESCAPE '\')"#;

fn map_row_to_entry(row: &PgRow) -> Result<CatalogEntry> {
    let book = Book {
        book_id: BookId::from_i64(row.try_get("id")?),
        title: row.try_get("title")?,
        author: row.try_get("author")?,
        year: row.try_get("year")?,
    };

    let open_loan_id: Option<i64> = row.try_get("open_loan_id")?;
    let availability = match open_loan_id {
        Some(loan_id) => Availability::OnLoan {
            loan_id: LoanId::from_i64(loan_id),
            borrower_name: row.try_get("open_borrower_name")?,
        },
        None => Availability::Available,
    };

    Ok(CatalogEntry::new(book, availability))
}

/// 検索語を大文字小文字を区別しない部分一致パターンに変換する
fn like_pattern(search: Option<&str>) -> Option<String> {
    search.map(|s| {
        let escaped = s
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{escaped}%")
    })
}

fn sort_column(field: SortField) -> &'static str {
    match field {
        SortField::Title => "b.title",
        SortField::Author => "b.author",
        SortField::Year => "b.year",
        SortField::Id => "b.id",
    }
}

fn sort_direction(order: SortOrder) -> &'static str {
    match order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    }
}

/// 書籍リポジトリのPostgreSQL実装
///
/// 貸出可否は読み込みのたびに未返却の貸出と結合して求める。
pub struct BookRepository {
    pool: PgPool,
}

impl BookRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookRepositoryTrait for BookRepository {
    async fn insert(&self, details: &BookDetails) -> Result<Book> {
        let row = sqlx::query(
            r#"
            INSERT INTO books (title, author, year)
            VALUES ($1, $2, $3)
            RETURNING id, title, author, year
            "#,
        )
        .bind(details.title.as_str())
        .bind(details.author.as_str())
        .bind(details.year.value())
        .fetch_one(&self.pool)
        .await?;

        Ok(Book {
            book_id: BookId::from_i64(row.try_get("id")?),
            title: row.try_get("title")?,
            author: row.try_get("author")?,
            year: row.try_get("year")?,
        })
    }

    /// 更新と貸出可否の再取得を1文で行う
    async fn update(&self, book_id: BookId, details: &BookDetails) -> Result<Option<CatalogEntry>> {
        let sql = format!(
            r#"
            WITH b AS (
                UPDATE books
                SET title = $2, author = $3, year = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING id, title, author, year
            )
            SELECT {ENTRY_COLUMNS}
            FROM b
            {OPEN_LOAN_JOIN}
            "#
        );

        let row = sqlx::query(&sql)
            .bind(book_id.value())
            .bind(details.title.as_str())
            .bind(details.author.as_str())
            .bind(details.year.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_entry).transpose()
    }

    async fn get_entry(&self, book_id: BookId) -> Result<Option<CatalogEntry>> {
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM books b
            {OPEN_LOAN_JOIN}
            WHERE b.id = $1
            "#
        );

        let row = sqlx::query(&sql)
            .bind(book_id.value())
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(map_row_to_entry).transpose()
    }

    async fn exists(&self, book_id: BookId) -> Result<bool> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE id = $1)")
            .bind(book_id.value())
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    /// 未返却の貸出がなければ書籍を削除する
    ///
    /// 先に書籍の行を`FOR UPDATE`でロックする。並行する貸出の登録は同じ行に
    /// キー共有ロックを取る（明示的にも外部キー経由でも）ため、貸出の確認と
    /// 削除の間に割り込めない。貸出履歴は書籍と一緒に消える（`ON DELETE CASCADE`）。
    async fn delete_if_available(&self, book_id: BookId) -> Result<DeleteOutcome> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<i64> =
            sqlx::query_scalar("SELECT id FROM books WHERE id = $1 FOR UPDATE")
                .bind(book_id.value())
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(DeleteOutcome::NotFound);
        }

        let on_loan: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM loans WHERE book_id = $1 AND returned_at IS NULL)",
        )
        .bind(book_id.value())
        .fetch_one(&mut *tx)
        .await?;
        if on_loan {
            // トランザクションを破棄するとロールバックされロックも解放される
            return Ok(DeleteOutcome::OnLoan);
        }

        sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(book_id.value())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self, search: Option<&str>) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM books b WHERE {SEARCH_FILTER}");
        let count: i64 = sqlx::query_scalar(&sql)
            .bind(like_pattern(search))
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }

    /// ソート列と方向は列挙型から決まり、利用者の入力をそのまま埋め込まない
    async fn search(&self, query: &BookSearch) -> Result<Vec<CatalogEntry>> {
        let sql = format!(
            r#"
            SELECT {ENTRY_COLUMNS}
            FROM books b
            {OPEN_LOAN_JOIN}
            WHERE {SEARCH_FILTER}
            ORDER BY {column} {direction}, b.id ASC
            LIMIT $2 OFFSET $3
            "#,
            column = sort_column(query.sort_by),
            direction = sort_direction(query.order),
        );

        let rows = sqlx::query(&sql)
            .bind(like_pattern(query.search.as_deref()))
            .bind(i64::from(query.limit))
            .bind(i64::try_from(query.offset).unwrap_or(i64::MAX))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_entry).collect()
    }
}
