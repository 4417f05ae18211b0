pub mod account_store;
pub mod catalog_store;

pub use account_store::AccountStore as MemoryAccountStore;
pub use catalog_store::CatalogStore as MemoryCatalogStore;
