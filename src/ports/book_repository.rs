use crate::domain::{Book, BookDetails, BookId, BookSearch, CatalogEntry};
use async_trait::async_trait;

use super::Result;

/// 書籍削除の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
    /// 未返却の貸出があるため削除しなかった
    OnLoan,
}

/// 書籍リポジトリポート
///
/// 読み取り系は貸出可否（未返却の貸出の有無）を結合して返す。
/// 貸出可否は保存せず、常にこの結合から導出する。
#[async_trait]
pub trait BookRepository: Send + Sync {
    /// 書籍を登録し、採番済みの書籍を返す
    async fn insert(&self, details: &BookDetails) -> Result<Book>;

    /// 書籍の属性を更新する
    ///
    /// 存在しない場合は`None`。貸出記録には触れない。
    async fn update(&self, book_id: BookId, details: &BookDetails) -> Result<Option<CatalogEntry>>;

    /// 書籍と現在の貸出可否を取得する
    async fn get_entry(&self, book_id: BookId) -> Result<Option<CatalogEntry>>;

    async fn exists(&self, book_id: BookId) -> Result<bool>;

    /// 未返却の貸出がない場合のみ削除する
    ///
    /// 確認と削除は1つの作業単位で行い、並行する貸出作成と競合しないこと。
    /// 貸出履歴は書籍と一緒に削除される。
    async fn delete_if_available(&self, book_id: BookId) -> Result<DeleteOutcome>;

    /// 検索条件に一致する件数
    async fn count(&self, search: Option<&str>) -> Result<u64>;

    /// 検索・ソート・ページングを適用した一覧
    async fn search(&self, query: &BookSearch) -> Result<Vec<CatalogEntry>>;
}
