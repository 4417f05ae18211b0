pub mod error;
pub mod extract;
pub mod handlers;
pub mod openapi;
pub mod pages;
pub mod router;
pub mod session;
pub mod types;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use session::{Authenticated, SESSION_COOKIE};
pub use types::*;
