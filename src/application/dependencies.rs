use crate::ports::*;
use std::sync::Arc;

/// サービスの依存関係
///
/// データ構造として定義し、振る舞いは持たない。
/// 各ユースケース関数に引数として明示的に渡す。
/// ストレージの接続はアダプター内で作業単位ごとに取得・解放される。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub books: Arc<dyn BookRepository>,
    pub loans: Arc<dyn LoanRepository>,
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionStore>,
}
