use thiserror::Error;

/// 入力値のバリデーションエラー
///
/// HTTP層では400 Bad Requestにマッピングされる。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// 必須項目が指定されていない
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// 空白除去後に空文字列になった
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// 数値として解釈できない
    #[error("{field} must be an integer, got {value}")]
    NotAnInteger { field: &'static str, value: String },

    /// 出版年が範囲外
    #[error("year {year} is out of range ({min}..={max})")]
    YearOutOfRange { year: i64, min: i32, max: i32 },

    /// ソート項目が不正
    #[error("invalid sort field '{0}' (expected title, author, year or id)")]
    InvalidSortField(String),

    /// ソート順が不正
    #[error("invalid sort order '{0}' (expected asc or desc)")]
    InvalidSortOrder(String),

    /// 1ページあたりの件数が範囲外
    #[error("limit must be between 1 and {max}, got {limit}")]
    LimitOutOfRange { limit: i64, max: u32 },
}

/// 返却のエラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReturnLoanError {
    /// 既に返却済み
    AlreadyReturned,
}
