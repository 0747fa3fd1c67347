pub mod aggregate;
pub mod events;
pub mod value_object;

pub use aggregate::{MicroAppSession, SessionPhase, SessionSnapshot};
pub use events::{SessionDomainEvent, SessionEventEnvelope};
pub use value_object::{MicroAppIdentity, SessionId};
