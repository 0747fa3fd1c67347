pub mod auth;
pub mod bridge;
mod store_error;

pub use store_error::StoreError;
