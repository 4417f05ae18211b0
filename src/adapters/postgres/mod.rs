pub mod book_repository;
pub mod loan_repository;
pub mod session_store;
pub mod user_repository;

// パブリックに型を再エクスポート
pub use book_repository::BookRepository as PostgresBookRepository;
pub use loan_repository::LoanRepository as PostgresLoanRepository;
pub use session_store::SessionStore as PostgresSessionStore;
pub use user_repository::UserRepository as PostgresUserRepository;

use crate::ports::StoreError;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;

/// プールから接続を取得するまでの待ち時間の上限
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(Box::new(err))
    }
}

/// 共有のコネクションプールを作成する
///
/// リポジトリの呼び出しはこのプールから接続（またはトランザクション）を借り、
/// 成功でも失敗でも呼び出しの終了時に返す。
pub async fn connect(database_url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(database_url)
        .await
}

/// `migrations/`に埋め込んだマイグレーションを適用する
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
