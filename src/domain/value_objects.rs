use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use super::ValidationError;

/// 出版年の下限
pub const MIN_PUBLICATION_YEAR: i32 = 1000;

/// 書籍ID - データベースで採番される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BookId(i64);

impl BookId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for BookId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 貸出ID - データベースで採番される
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LoanId(i64);

impl LoanId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 利用者（ログインアカウント）ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(i64);

impl UserId {
    pub fn from_i64(id: i64) -> Self {
        Self(id)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// セッショントークン
///
/// Cookieに格納される推測不能な値。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionToken(Uuid);

impl SessionToken {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Cookie値から復元する。形式が不正な場合は`None`。
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw).ok().map(Self)
    }

    pub fn value(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn non_empty(raw: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

/// 書名
///
/// 不変条件：前後の空白を除去した上で空でないこと
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Title(String);

impl Title {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        non_empty(raw, "title").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 著者名
///
/// 不変条件：前後の空白を除去した上で空でないこと
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author(String);

impl Author {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        non_empty(raw, "author").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 借り手の名前
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorrowerName(String);

impl BorrowerName {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        non_empty(raw, "borrower_name").map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// 出版年
///
/// 不変条件：1000 <= year <= 現在の年 + 1
/// 上限は呼び出し時点の年に依存するため、現在の年を引数で受け取る。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationYear(i32);

impl PublicationYear {
    pub fn parse(year: i64, current_year: i32) -> Result<Self, ValidationError> {
        let max = current_year + 1;
        if year < i64::from(MIN_PUBLICATION_YEAR) || year > i64::from(max) {
            return Err(ValidationError::YearOutOfRange {
                year,
                min: MIN_PUBLICATION_YEAR,
                max,
            });
        }
        // 範囲チェック済みなのでi32に収まる
        Ok(Self(year as i32))
    }

    pub fn value(&self) -> i32 {
        self.0
    }
}
