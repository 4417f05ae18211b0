use std::str::FromStr;

use super::ValidationError;

/// 1ページあたりのデフォルト件数
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// 1ページあたりの最大件数
pub const MAX_PAGE_SIZE: u32 = 100;

/// 書籍一覧のソート項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    Title,
    Author,
    Year,
    Id,
}

impl FromStr for SortField {
    type Err = ValidationError;

    /// 旧クライアントのポルトガル語名（titulo, autor, ano）も受け付ける
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "title" | "titulo" => Ok(SortField::Title),
            "author" | "autor" => Ok(SortField::Author),
            "year" | "ano" => Ok(SortField::Year),
            "id" => Ok(SortField::Id),
            _ => Err(ValidationError::InvalidSortField(s.to_string())),
        }
    }
}

/// ソート順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(ValidationError::InvalidSortOrder(s.to_string())),
        }
    }
}

/// 書籍一覧の要求（検証済み）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListing {
    /// 書名または著者の部分一致（大文字小文字を区別しない）
    pub search: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
    /// 要求されたページ（1始まり、範囲外は後で丸める）
    pub page: i64,
    pub limit: u32,
}

impl BookListing {
    /// クエリパラメータを検証する
    ///
    /// 省略時: page=1, limit=10, sort_by=title, order=asc
    pub fn parse(
        search: Option<&str>,
        page: Option<i64>,
        limit: Option<i64>,
        sort_by: Option<&str>,
        order: Option<&str>,
    ) -> Result<Self, ValidationError> {
        let sort_by = sort_by.map(SortField::from_str).transpose()?.unwrap_or_default();
        let order = order.map(SortOrder::from_str).transpose()?.unwrap_or_default();

        let limit = match limit {
            None => DEFAULT_PAGE_SIZE,
            Some(limit) if (1..=i64::from(MAX_PAGE_SIZE)).contains(&limit) => limit as u32,
            Some(limit) => {
                return Err(ValidationError::LimitOutOfRange {
                    limit,
                    max: MAX_PAGE_SIZE,
                });
            }
        };

        let search = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Self {
            search,
            sort_by,
            order,
            page: page.unwrap_or(1),
            limit,
        })
    }
}

/// 件数から確定したページ位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    /// 結果が0件の場合は0
    pub current_page: u32,
    /// 結果が0件でも1
    pub total_pages: u32,
    pub limit: u32,
    pub offset: u64,
}

/// 総件数と要求ページからページ位置を決める
///
/// - 1未満のページは1ページ目
/// - 最終ページを超えるページは最終ページ
/// - 0件の場合はcurrent_page=0, total_pages=1
pub fn resolve_page(total_items: u64, requested_page: i64, limit: u32) -> PageWindow {
    let limit = limit.max(1);
    let total_pages = if total_items == 0 {
        1
    } else {
        total_items.div_ceil(u64::from(limit)).min(u64::from(u32::MAX)) as u32
    };

    let current_page = if total_items == 0 {
        0
    } else {
        requested_page.clamp(1, i64::from(total_pages)) as u32
    };

    let offset = u64::from(current_page.saturating_sub(1)) * u64::from(limit);

    PageWindow {
        current_page,
        total_pages,
        limit,
        offset,
    }
}

/// ストレージに渡す検索条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSearch {
    pub search: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
    pub limit: u32,
    pub offset: u64,
}

/// ページ付きの結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_items: u64,
    pub total_pages: u32,
    pub current_page: u32,
    pub limit: u32,
}
