mod auth_service;
mod errors;

pub use auth_service::{
    authenticate, ensure_admin_account, hash_password, login, logout, verify_password,
};
pub use errors::{AuthError, Result};
