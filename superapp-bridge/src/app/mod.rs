pub mod auth;
pub mod bridge;

#[cfg(test)]
pub(crate) mod testing;
