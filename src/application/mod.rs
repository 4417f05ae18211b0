pub mod auth;
pub mod bootstrap;
pub mod catalog;
mod dependencies;

pub use dependencies::ServiceDependencies;
