pub mod device_headless;
pub mod renderer_channel;

pub use device_headless::HeadlessDevice;
pub use renderer_channel::ChannelRenderer;
