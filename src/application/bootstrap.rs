use crate::domain::commands::CreateBook;
use chrono::{DateTime, Utc};

use super::ServiceDependencies;
use super::catalog::{self, CatalogError};

/// 初回起動時に登録する書籍（書名, 著者, 出版年）
pub const SEED_BOOKS: [(&str, &str, i64); 3] = [
    ("Estruturas de Dados", "N. Wirth", 1976),
    ("Clean Code", "R. Martin", 2008),
    ("Python para Iniciantes", "Jesiel Pedroza", 2025),
];

/// カタログが空の場合のみ初期書籍を登録する
///
/// 登録した件数を返す。
pub async fn seed_catalog(
    deps: &ServiceDependencies,
    now: DateTime<Utc>,
) -> Result<usize, CatalogError> {
    if deps.books.count(None).await? > 0 {
        return Ok(0);
    }

    for (title, author, year) in SEED_BOOKS {
        let cmd = CreateBook {
            title: title.to_string(),
            author: author.to_string(),
            year,
            requested_at: now,
        };
        catalog::create_book(deps, cmd).await?;
    }

    tracing::info!(count = SEED_BOOKS.len(), "seed books created");
    Ok(SEED_BOOKS.len())
}
