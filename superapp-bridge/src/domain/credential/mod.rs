pub mod value_object;

pub use value_object::{decode_expiry, CredentialSlot, SessionCredential};

#[cfg(test)]
pub(crate) use value_object::unsigned_jwt;
