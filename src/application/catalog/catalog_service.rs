use crate::application::ServiceDependencies;
use crate::domain::{
    Availability, BookDetails, BookId, BookListing, BookSearch, CatalogEntry, Page, commands::*,
    resolve_page,
};
use crate::ports::DeleteOutcome;
use chrono::Datelike;

use super::errors::{CatalogError, Result};

/// 書籍を登録する
///
/// ビジネスルール：
/// - 書名・著者は空白除去後に空でないこと
/// - 出版年は 1000 <= year <= 現在の年 + 1
///
/// 登録直後は貸出記録がないため、常に貸出可能として返す。
pub async fn create_book(deps: &ServiceDependencies, cmd: CreateBook) -> Result<CatalogEntry> {
    let details = BookDetails::parse(
        &cmd.title,
        &cmd.author,
        cmd.year,
        cmd.requested_at.year(),
    )?;

    let book = deps.books.insert(&details).await?;
    tracing::info!(book_id = %book.book_id, title = %book.title, "book created");

    Ok(CatalogEntry::new(book, Availability::Available))
}

/// 書籍を更新する
///
/// 検証ルールは登録と同じ。貸出記録には影響せず、
/// 返す貸出可否は既存の貸出記録から再計算したもの。
pub async fn update_book(deps: &ServiceDependencies, cmd: UpdateBook) -> Result<CatalogEntry> {
    let details = BookDetails::parse(
        &cmd.title,
        &cmd.author,
        cmd.year,
        cmd.requested_at.year(),
    )?;

    let entry = deps
        .books
        .update(cmd.book_id, &details)
        .await?
        .ok_or(CatalogError::BookNotFound)?;
    tracing::info!(book_id = %cmd.book_id, "book updated");

    Ok(entry)
}

/// 書籍を削除する
///
/// ビジネスルール：
/// - 未返却の貸出がある書籍は削除できない
/// - 貸出履歴は書籍と一緒に削除される
pub async fn delete_book(deps: &ServiceDependencies, book_id: BookId) -> Result<()> {
    match deps.books.delete_if_available(book_id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(book_id = %book_id, "book deleted");
            Ok(())
        }
        DeleteOutcome::NotFound => Err(CatalogError::BookNotFound),
        DeleteOutcome::OnLoan => {
            tracing::warn!(book_id = %book_id, "refused to delete book on loan");
            Err(CatalogError::BookOnLoan)
        }
    }
}

/// 書籍1件と現在の貸出可否を取得する
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<CatalogEntry> {
    deps.books
        .get_entry(book_id)
        .await?
        .ok_or(CatalogError::BookNotFound)
}

/// 書籍一覧（検索・ソート・ページング）
///
/// 件数を数えてからページ位置を確定し、そのページを取得する。
/// 範囲外のページは最終ページに丸める。
pub async fn list_books(
    deps: &ServiceDependencies,
    listing: BookListing,
) -> Result<Page<CatalogEntry>> {
    let total_items = deps.books.count(listing.search.as_deref()).await?;
    let window = resolve_page(total_items, listing.page, listing.limit);

    let items = if total_items == 0 {
        Vec::new()
    } else {
        let query = BookSearch {
            search: listing.search,
            sort_by: listing.sort_by,
            order: listing.order,
            limit: window.limit,
            offset: window.offset,
        };
        deps.books.search(&query).await?
    };

    Ok(Page {
        items,
        total_items,
        total_pages: window.total_pages,
        current_page: window.current_page,
        limit: window.limit,
    })
}
