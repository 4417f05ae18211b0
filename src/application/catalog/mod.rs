mod catalog_service;
mod errors;
mod lending_service;

pub use catalog_service::{create_book, delete_book, get_book, list_books, update_book};
pub use errors::{CatalogError, ErrorKind, Result};
pub use lending_service::{create_loan, loan_history, return_loan};
