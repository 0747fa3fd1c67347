pub mod envelope;
pub mod value_object;

pub use envelope::{FrameError, InboundFrame, OutboundFrame};
pub use value_object::{CoreTopic, RequestId, Topic};
