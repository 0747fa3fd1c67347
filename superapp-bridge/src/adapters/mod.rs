pub mod auth;
pub mod bridge;
pub mod storage;
