pub mod context;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod registry;
pub mod security;
pub mod session;

pub use context::HandlerContext;
pub use error::{BridgeError, HandlerError, SessionError};
pub use handlers::{core_registry, register_core_capabilities};
pub use ledger::{PendingContinuation, PendingLedger, PendingReply};
pub use registry::{handler_fn, CapabilityHandler, CapabilityRegistry, FnHandler};
pub use security::SecurityPolicy;
pub use session::{
    resolve_load_uri, BridgeDeps, BridgeOptions, MicroAppSessionController, SessionParams,
};
