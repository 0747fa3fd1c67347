pub mod bridge;
pub mod credential;
pub mod session;
