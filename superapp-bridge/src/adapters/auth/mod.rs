pub mod http_reqwest;
pub mod identity_http;
pub mod system;
pub mod token_store_file;
pub mod token_store_mem;

pub use http_reqwest::ReqwestTransport;
pub use identity_http::{HttpIdentityProvider, TokenGrant};
pub use system::{ClearShellCredentials, SystemClock};
pub use token_store_file::FileTokenStore;
pub use token_store_mem::InMemoryTokenStore;
