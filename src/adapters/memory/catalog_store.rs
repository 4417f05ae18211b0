use crate::domain::{
    Availability, Book, BookDetails, BookId, BookSearch, CatalogEntry, ClosedLoan, Loan,
    LoanCore, LoanId, NewLoan, OpenLoan, SortField, SortOrder,
};
use crate::ports::{BookRepository, DeleteOutcome, LoanRepository, Result, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct CatalogState {
    last_book_id: i64,
    last_loan_id: i64,
    books: BTreeMap<BookId, Book>,
    loans: BTreeMap<LoanId, Loan>,
}

impl CatalogState {
    fn open_loan_for(&self, book_id: BookId) -> Option<&OpenLoan> {
        self.loans.values().find_map(|loan| match loan {
            Loan::Open(open) if open.book_id == book_id => Some(open),
            _ => None,
        })
    }

    fn entry(&self, book: &Book) -> CatalogEntry {
        CatalogEntry::new(
            book.clone(),
            Availability::from_open_loan(self.open_loan_for(book.book_id)),
        )
    }

    fn matching_books<'a>(&'a self, search: Option<&'a str>) -> impl Iterator<Item = &'a Book> {
        let needle = search.map(str::to_lowercase);
        self.books.values().filter(move |book| match &needle {
            None => true,
            Some(needle) => {
                book.title.to_lowercase().contains(needle.as_str())
                    || book.author.to_lowercase().contains(needle.as_str())
            }
        })
    }
}

fn compare_books(a: &Book, b: &Book, sort_by: SortField, order: SortOrder) -> Ordering {
    let primary = match sort_by {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Author => a.author.cmp(&b.author),
        SortField::Year => a.year.cmp(&b.year),
        SortField::Id => a.book_id.cmp(&b.book_id),
    };
    let primary = match order {
        SortOrder::Asc => primary,
        SortOrder::Desc => primary.reverse(),
    };
    primary.then_with(|| a.book_id.cmp(&b.book_id))
}

/// 書籍と貸出を1つのロックで保持するインメモリストア
///
/// すべての操作が同じミューテックスの中で行われるため、
/// 「未返却の貸出がないことの確認」と「挿入」は不可分になる。
/// テストとローカル実行用。
#[derive(Debug, Default)]
pub struct CatalogStore {
    state: Mutex<CatalogState>,
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BookRepository for CatalogStore {
    async fn insert(&self, details: &BookDetails) -> Result<Book> {
        let mut state = self.state.lock().await;
        state.last_book_id += 1;
        let book = Book {
            book_id: BookId::from_i64(state.last_book_id),
            title: details.title.as_str().to_string(),
            author: details.author.as_str().to_string(),
            year: details.year.value(),
        };
        state.books.insert(book.book_id, book.clone());
        Ok(book)
    }

    async fn update(&self, book_id: BookId, details: &BookDetails) -> Result<Option<CatalogEntry>> {
        let mut state = self.state.lock().await;
        let Some(book) = state.books.get_mut(&book_id) else {
            return Ok(None);
        };
        book.title = details.title.as_str().to_string();
        book.author = details.author.as_str().to_string();
        book.year = details.year.value();
        let book = book.clone();
        Ok(Some(state.entry(&book)))
    }

    async fn get_entry(&self, book_id: BookId) -> Result<Option<CatalogEntry>> {
        let state = self.state.lock().await;
        Ok(state.books.get(&book_id).map(|book| state.entry(book)))
    }

    async fn exists(&self, book_id: BookId) -> Result<bool> {
        Ok(self.state.lock().await.books.contains_key(&book_id))
    }

    async fn delete_if_available(&self, book_id: BookId) -> Result<DeleteOutcome> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&book_id) {
            return Ok(DeleteOutcome::NotFound);
        }
        if state.open_loan_for(book_id).is_some() {
            return Ok(DeleteOutcome::OnLoan);
        }
        state.books.remove(&book_id);
        state.loans.retain(|_, loan| loan.core().book_id != book_id);
        Ok(DeleteOutcome::Deleted)
    }

    async fn count(&self, search: Option<&str>) -> Result<u64> {
        let state = self.state.lock().await;
        Ok(state.matching_books(search).count() as u64)
    }

    async fn search(&self, query: &BookSearch) -> Result<Vec<CatalogEntry>> {
        let state = self.state.lock().await;
        let mut books: Vec<&Book> = state.matching_books(query.search.as_deref()).collect();
        books.sort_by(|a, b| compare_books(a, b, query.sort_by, query.order));

        let offset = usize::try_from(query.offset).unwrap_or(usize::MAX);
        Ok(books
            .into_iter()
            .skip(offset)
            .take(query.limit as usize)
            .map(|book| state.entry(book))
            .collect())
    }
}

#[async_trait]
impl LoanRepository for CatalogStore {
    async fn insert_open(&self, new_loan: &NewLoan) -> Result<OpenLoan> {
        let mut state = self.state.lock().await;
        if !state.books.contains_key(&new_loan.book_id) {
            return Err(StoreError::MissingBook(new_loan.book_id));
        }
        if state.open_loan_for(new_loan.book_id).is_some() {
            return Err(StoreError::OpenLoanExists(new_loan.book_id));
        }

        state.last_loan_id += 1;
        let open = OpenLoan {
            core: LoanCore {
                loan_id: LoanId::from_i64(state.last_loan_id),
                book_id: new_loan.book_id,
                borrower_name: new_loan.borrower_name.as_str().to_string(),
                loaned_at: new_loan.loaned_at,
            },
        };
        state.loans.insert(open.loan_id, Loan::Open(open.clone()));
        Ok(open)
    }

    async fn find_open_for_book(&self, book_id: BookId) -> Result<Option<OpenLoan>> {
        Ok(self.state.lock().await.open_loan_for(book_id).cloned())
    }

    async fn get_by_id(&self, loan_id: LoanId) -> Result<Option<Loan>> {
        Ok(self.state.lock().await.loans.get(&loan_id).cloned())
    }

    async fn close(&self, loan_id: LoanId, returned_at: DateTime<Utc>) -> Result<ClosedLoan> {
        let mut state = self.state.lock().await;
        let loan = state
            .loans
            .get_mut(&loan_id)
            .ok_or(StoreError::MissingLoan(loan_id))?;

        let closed = match loan {
            Loan::Open(open) => ClosedLoan {
                core: open.core.clone(),
                returned_at,
            },
            Loan::Closed(_) => return Err(StoreError::LoanClosed(loan_id)),
        };
        *loan = Loan::Closed(closed.clone());
        Ok(closed)
    }

    async fn find_by_book_id(&self, book_id: BookId) -> Result<Vec<Loan>> {
        let state = self.state.lock().await;
        let mut loans: Vec<Loan> = state
            .loans
            .values()
            .filter(|loan| loan.core().book_id == book_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| {
            b.core()
                .loaned_at
                .cmp(&a.core().loaned_at)
                .then_with(|| b.core().loan_id.cmp(&a.core().loan_id))
        });
        Ok(loans)
    }
}
