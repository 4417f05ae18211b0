pub mod book;
pub mod commands;
pub mod errors;
pub mod listing;
pub mod loan;
pub mod user;
pub mod value_objects;

pub use book::*;
pub use errors::*;
pub use listing::*;
pub use loan::{ClosedLoan, Loan, LoanCore, LoanState, NewLoan, OpenLoan};
pub use user::*;
pub use value_objects::*;
