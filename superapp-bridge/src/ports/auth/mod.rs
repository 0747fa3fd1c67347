pub mod http_port;
pub mod identity_port;
pub mod session_port;
pub mod token_store;

pub use http_port::{
    ApiRequest, ApiResponse, HttpMethod, HttpTransport, TransportError, ASSERTION_HEADER,
    AUTHORIZATION_HEADER,
};
pub use identity_port::{IdentityError, IdentityProvider, TokenExchangeRequest};
pub use session_port::{Clock, LogoutHandler};
pub use token_store::TokenStore;
